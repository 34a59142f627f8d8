//! Search, status filter, pagination, and summary statistics over loaded records.

use mlog_types::{Classification, LogPage, LogQuery, LogStats, Record, DEFAULT_PAGE_SIZE};

const MAX_PAGE_SIZE: u32 = 100;

fn matches(record: &Record, needle: &str) -> bool {
    record.id.to_lowercase().contains(needle)
        || record.category.to_lowercase().contains(needle)
        || record.classification.as_str().contains(needle)
}

/// Filter `records` (already newest first) and cut out the requested page.
/// Out-of-range pages are clamped to the nearest valid page.
pub fn query(records: &[Record], q: &LogQuery) -> LogPage {
    let needle = q
        .search
        .as_deref()
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty());
    let filtered: Vec<&Record> = records
        .iter()
        .filter(|r| q.status.map_or(true, |s| r.classification == s))
        .filter(|r| needle.as_deref().map_or(true, |n| matches(r, n)))
        .collect();

    let page_size = q
        .page_size
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE);
    let total = filtered.len();
    let total_pages = total.div_ceil(page_size as usize) as u32;
    let page = q.page.unwrap_or(1).clamp(1, total_pages.max(1));
    let offset = (page - 1) as usize * page_size as usize;
    let items = filtered
        .into_iter()
        .skip(offset)
        .take(page_size as usize)
        .cloned()
        .collect();

    LogPage {
        items,
        total,
        page,
        page_size,
        total_pages,
    }
}

/// Per-classification counts and mean score.
pub fn stats(records: &[Record]) -> LogStats {
    let mut out = LogStats {
        total: records.len(),
        ..LogStats::default()
    };
    let mut sum: u64 = 0;
    for r in records {
        sum += r.score as u64;
        match r.classification {
            Classification::Normal => out.normal += 1,
            Classification::Warning => out.warning += 1,
            Classification::Critical => out.critical += 1,
        }
    }
    if !records.is_empty() {
        out.average_score = sum as f64 / records.len() as f64;
    }
    out
}
