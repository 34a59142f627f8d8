//! IndexedLogStore: the directory/record read-modify-write client.
//!
//! `append` writes the record first and the directory second. The two writes are not
//! atomic: a failure in between leaves an orphan record that `load_all` never surfaces.
//! Two racing appends can also lose one directory entry (last directory write wins).

use crate::generate_record_id;
use chrono::Utc;
use mlog_codec::PayloadCodec;
use mlog_kv::KvContract;
use mlog_types::*;
use std::collections::HashSet;

/// LogStore over a key-value contract `C`, protecting payloads with codec `P`.
pub struct IndexedLogStore<C, P> {
    pub contract: C,
    pub codec: P,
}

impl<C, P> IndexedLogStore<C, P>
where
    C: KvContract,
    P: PayloadCodec,
{
    pub fn new(contract: C, codec: P) -> Self {
        Self { contract, codec }
    }

    /// Decode a directory value; malformed content is logged and read as empty.
    fn decode_directory(bytes: &[u8]) -> Directory {
        Directory::decode(bytes).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "malformed directory value, treating as empty");
            Directory::default()
        })
    }

    /// Read one listed record. Missing or malformed values yield `None`.
    async fn read_record(&self, id: &str) -> Option<Record> {
        let key = record_key(id);
        let bytes = match self.contract.get_data(&key).await {
            Ok(b) => b,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "record read failed, skipping");
                return None;
            }
        };
        match StoredRecord::decode(&bytes) {
            Ok(Some(stored)) => Some(Record::from_stored(id, stored)),
            Ok(None) => {
                tracing::warn!(key = %key, "listed record has no stored value, skipping");
                None
            }
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "malformed record value, skipping");
                None
            }
        }
    }

    fn enter(phase: &mut AppendPhase, next: AppendPhase, id: &str) {
        tracing::debug!(record_id = %id, from = %phase, to = %next, "append phase");
        *phase = next;
    }

    async fn run_append(
        &self,
        session: &WriterSession,
        candidate: &LogCandidate,
        id: String,
        phase: &mut AppendPhase,
    ) -> Result<Record, LogStoreError> {
        Self::enter(phase, AppendPhase::Encoding, &id);
        let failed = |phase: AppendPhase, reason: String| LogStoreError::SubmissionFailed {
            phase,
            reason,
        };
        let payload = self
            .codec
            .protect(&PayloadEnvelope::from(candidate))
            .map_err(|e| failed(*phase, e.to_string()))?;
        let record = Record {
            id,
            payload,
            timestamp: Utc::now().timestamp().max(0) as u64,
            category: candidate.category.clone(),
            classification: Classification::from_score(candidate.score),
            score: candidate.score,
        };
        let value = record
            .to_stored()
            .encode()
            .map_err(|e| failed(*phase, e.to_string()))?;

        Self::enter(phase, AppendPhase::WritingRecord, &record.id);
        self.contract
            .set_data(session, &record_key(&record.id), &value)
            .await
            .map_err(|e| LogStoreError::from_contract(*phase, e))?;

        Self::enter(phase, AppendPhase::ReadingDirectory, &record.id);
        let current = self
            .contract
            .get_data(DIRECTORY_KEY)
            .await
            .map_err(|e| LogStoreError::from_contract(*phase, e))?;
        let mut directory = Self::decode_directory(&current);
        directory.push(&record.id);
        let encoded = directory
            .encode()
            .map_err(|e| failed(*phase, e.to_string()))?;

        Self::enter(phase, AppendPhase::WritingDirectory, &record.id);
        self.contract
            .set_data(session, DIRECTORY_KEY, &encoded)
            .await
            .map_err(|e| LogStoreError::from_contract(*phase, e))?;

        Self::enter(phase, AppendPhase::Done, &record.id);
        Ok(record)
    }
}

#[async_trait::async_trait]
impl<C, P> LogStore for IndexedLogStore<C, P>
where
    C: KvContract,
    P: PayloadCodec,
{
    async fn load_all(&self) -> LoadReport {
        match self.contract.is_available().await {
            Ok(true) => {}
            Ok(false) => {
                tracing::warn!("contract reports itself unavailable");
                return LoadReport::unavailable();
            }
            Err(e) => {
                tracing::warn!(error = %e, "availability probe failed");
                return LoadReport::unavailable();
            }
        }

        let directory = match self.contract.get_data(DIRECTORY_KEY).await {
            Ok(bytes) => Self::decode_directory(&bytes),
            Err(e) => {
                tracing::warn!(error = %e, "directory read failed");
                return LoadReport::unavailable();
            }
        };

        let mut seen = HashSet::new();
        let mut entries: Vec<(usize, Record)> = Vec::with_capacity(directory.len());
        let mut skipped = 0;
        for (pos, id) in directory.ids().iter().enumerate() {
            if !seen.insert(id.as_str()) {
                continue;
            }
            match self.read_record(id).await {
                Some(record) => entries.push((pos, record)),
                None => skipped += 1,
            }
        }
        // Newest first; equal timestamps keep later directory entries first.
        entries.sort_by(|(pa, a), (pb, b)| b.timestamp.cmp(&a.timestamp).then(pb.cmp(pa)));

        tracing::debug!(
            listed = directory.len(),
            loaded = entries.len(),
            skipped,
            "loaded records"
        );
        LoadReport {
            records: entries.into_iter().map(|(_, r)| r).collect(),
            available: true,
            skipped,
        }
    }

    async fn append(
        &self,
        session: Option<&WriterSession>,
        candidate: &LogCandidate,
    ) -> Result<Record, LogStoreError> {
        let session = session.ok_or(LogStoreError::NotConnected)?;
        candidate.validate()?;

        let id = generate_record_id();
        let mut phase = AppendPhase::Idle;
        match self
            .run_append(session, candidate, id.clone(), &mut phase)
            .await
        {
            Ok(record) => {
                tracing::info!(
                    record_id = %record.id,
                    machine_id = %record.category,
                    status = %record.classification,
                    account = %session.short_account(),
                    "log record committed"
                );
                Ok(record)
            }
            Err(e) => {
                tracing::warn!(
                    record_id = %id,
                    phase = %phase,
                    orphan = e.left_orphan(),
                    error = %e,
                    "append failed"
                );
                Err(e)
            }
        }
    }

    async fn check_availability(&self) -> bool {
        match self.contract.is_available().await {
            Ok(available) => available,
            Err(e) => {
                tracing::warn!(error = %e, "availability probe failed");
                false
            }
        }
    }

    fn reveal(&self, record: &Record) -> Result<PayloadEnvelope, LogStoreError> {
        Ok(self.codec.reveal(&record.payload)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mlog_codec::PlaceholderCodec;
    use mlog_kv::{InMemoryContract, WriteFault};

    fn store() -> IndexedLogStore<InMemoryContract, PlaceholderCodec> {
        IndexedLogStore::new(InMemoryContract::new(), PlaceholderCodec::new())
    }

    fn session() -> WriterSession {
        WriterSession::connect("0x1111111111111111111111111111111111111111").unwrap()
    }

    fn candidate(category: &str, payload: &str, score: u8) -> LogCandidate {
        LogCandidate {
            category: category.to_string(),
            raw_payload: payload.to_string(),
            score,
        }
    }

    fn stored(machine: &str, timestamp: u64, score: u8) -> Vec<u8> {
        StoredRecord {
            data: "FHE:e30=".to_string(),
            timestamp,
            machine_id: machine.to_string(),
            status: Classification::from_score(score),
            anomaly_score: score,
        }
        .encode()
        .unwrap()
    }

    #[tokio::test]
    async fn empty_directory_loads_nothing() {
        let s = store();
        let report = s.load_all().await;
        assert!(report.available);
        assert!(report.records.is_empty());
        assert_eq!(report.skipped, 0);
    }

    #[tokio::test]
    async fn malformed_record_is_skipped_and_rest_sorted_newest_first() {
        let s = store();
        s.contract.put_raw("log_keys", r#"["a","bad","b","c","gone"]"#).await;
        s.contract.put_raw("log_a", stored("m1", 100, 10)).await;
        s.contract.put_raw("log_b", stored("m2", 300, 50)).await;
        s.contract.put_raw("log_c", stored("m3", 200, 90)).await;
        s.contract.put_raw("log_bad", "{not json").await;

        let report = s.load_all().await;
        let ids: Vec<&str> = report.records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c", "a"]);
        assert_eq!(report.skipped, 2);
        assert_eq!(report.records[1].classification, Classification::Critical);
    }

    #[tokio::test]
    async fn malformed_directory_reads_as_empty() {
        let s = store();
        s.contract.put_raw("log_keys", "{\"oops\":true}").await;
        s.contract.put_raw("log_a", stored("m1", 100, 10)).await;
        let report = s.load_all().await;
        assert!(report.available);
        assert!(report.records.is_empty());
    }

    #[tokio::test]
    async fn equal_timestamps_put_later_entries_first() {
        let s = store();
        s.contract.put_raw("log_keys", r#"["x","y","x"]"#).await;
        s.contract.put_raw("log_x", stored("m", 500, 1)).await;
        s.contract.put_raw("log_y", stored("m", 500, 2)).await;
        let ids: Vec<String> = s.load_all().await.records.into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec!["y".to_string(), "x".to_string()]);
    }

    #[tokio::test]
    async fn unavailable_store_yields_empty_report() {
        let s = store();
        s.contract.put_raw("log_keys", r#"["a"]"#).await;
        s.contract.put_raw("log_a", stored("m1", 100, 10)).await;
        s.contract.set_available(false);
        let report = s.load_all().await;
        assert!(!report.available);
        assert!(report.records.is_empty());
        assert!(!s.check_availability().await);

        s.contract.set_available(true);
        s.contract.set_reachable(false);
        assert!(!s.load_all().await.available);
        assert!(!s.check_availability().await);
    }

    #[tokio::test]
    async fn append_then_load_returns_the_record() {
        let s = store();
        let session = session();
        let committed = s
            .append(Some(&session), &candidate("press-7", "temp=88", 85))
            .await
            .unwrap();
        assert_eq!(committed.classification, Classification::Critical);
        assert_eq!(committed.score, 85);

        let report = s.load_all().await;
        assert_eq!(report.records.len(), 1);
        let first = &report.records[0];
        assert_eq!(first.id, committed.id);
        assert_eq!(first.category, "press-7");
        assert_eq!(first.score, 85);
        assert_eq!(first.classification, Classification::Critical);
        assert_ne!(first.payload, "temp=88");
    }

    #[tokio::test]
    async fn revealed_payload_matches_submission() {
        let s = store();
        let c = candidate("lathe-2", "vibration=0.4", 42);
        let record = s.append(Some(&session()), &c).await.unwrap();
        let envelope = s.reveal(&record).unwrap();
        assert_eq!(envelope, PayloadEnvelope::from(&c));
    }

    #[tokio::test]
    async fn sequential_appends_get_distinct_ids_and_directory_grows() {
        let s = store();
        let session = session();
        let a = s.append(Some(&session), &candidate("m", "a", 10)).await.unwrap();
        let b = s.append(Some(&session), &candidate("m", "b", 50)).await.unwrap();
        assert_ne!(a.id, b.id);

        let dir = Directory::decode(&s.contract.raw("log_keys").await.unwrap()).unwrap();
        assert_eq!(dir.ids(), &[a.id.clone(), b.id.clone()]);
        let ids: Vec<String> = s.load_all().await.records.into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![b.id, a.id]);
    }

    #[tokio::test]
    async fn append_without_session_touches_nothing() {
        let s = store();
        let err = s.append(None, &candidate("m", "x", 10)).await.unwrap_err();
        assert_eq!(err, LogStoreError::NotConnected);
        assert_eq!(s.contract.write_count(), 0);
        assert!(s.contract.keys().await.is_empty());
    }

    #[tokio::test]
    async fn invalid_candidates_are_rejected_before_writing() {
        let s = store();
        let err = s
            .append(Some(&session()), &candidate("m", "x", 101))
            .await
            .unwrap_err();
        assert!(matches!(err, LogStoreError::InvalidInput(_)));
        let err = s
            .append(Some(&session()), &candidate("  ", "x", 5))
            .await
            .unwrap_err();
        assert!(matches!(err, LogStoreError::InvalidInput(_)));
        assert_eq!(s.contract.write_count(), 0);
    }

    #[tokio::test]
    async fn declined_record_write_stores_nothing() {
        let s = store();
        s.contract.fault_on_write(0, WriteFault::Decline);
        let err = s
            .append(Some(&session()), &candidate("m", "x", 10))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            LogStoreError::Declined {
                phase: AppendPhase::WritingRecord
            }
        );
        assert!(!err.left_orphan());
        assert!(s.contract.keys().await.is_empty());
    }

    #[tokio::test]
    async fn failed_directory_write_leaves_unsurfaced_orphan() {
        let s = store();
        let session = session();
        let kept = s.append(Some(&session), &candidate("m", "kept", 10)).await.unwrap();

        s.contract
            .fault_on_write(1, WriteFault::Reject("nonce too low".to_string()));
        let err = s
            .append(Some(&session), &candidate("m", "lost", 20))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            LogStoreError::SubmissionFailed {
                phase: AppendPhase::WritingDirectory,
                ..
            }
        ));
        assert!(err.left_orphan());

        // Orphan record key exists, directory still lists only the first record.
        let keys = s.contract.keys().await;
        let record_keys = keys
            .iter()
            .filter(|k| k.as_str() != DIRECTORY_KEY && k.starts_with(RECORD_KEY_PREFIX))
            .count();
        assert_eq!(record_keys, 2);
        let report = s.load_all().await;
        assert_eq!(report.records.len(), 1);
        assert_eq!(report.records[0].id, kept.id);

        // Retrying is a fresh append with a fresh id.
        let retried = s.append(Some(&session), &candidate("m", "lost", 20)).await.unwrap();
        assert_ne!(retried.id, kept.id);
        assert_eq!(s.load_all().await.records.len(), 2);
    }

    #[tokio::test]
    async fn append_over_malformed_directory_restarts_it() {
        let s = store();
        s.contract.put_raw("log_keys", "garbage").await;
        let r = s.append(Some(&session()), &candidate("m", "x", 75)).await.unwrap();
        let dir = Directory::decode(&s.contract.raw("log_keys").await.unwrap()).unwrap();
        assert_eq!(dir.ids(), &[r.id]);
    }

    #[tokio::test]
    async fn unreachable_store_fails_append_as_submission_failure() {
        let s = store();
        s.contract.set_reachable(false);
        let err = s
            .append(Some(&session()), &candidate("m", "x", 10))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            LogStoreError::SubmissionFailed {
                phase: AppendPhase::WritingRecord,
                ..
            }
        ));
    }
}
