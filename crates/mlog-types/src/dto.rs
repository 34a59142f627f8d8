//! Request and response DTOs for the dashboard API, plus job and notice types.

use crate::{Classification, LogCandidate, PayloadEnvelope, Record, WriterSession};
use serde::{Deserialize, Serialize};

/// Default number of records per dashboard page.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Base response envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BaseResponse<T> {
    #[serde(default = "default_code")]
    pub code: i32,
    pub message: String,
    #[serde(default)]
    pub data: Option<T>,
}

fn default_code() -> i32 {
    200
}

impl<T> BaseResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            code: 200,
            message: "Success".to_string(),
            data: Some(data),
        }
    }

    pub fn error(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }
}

/// Search, filter, and pagination over loaded records.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LogQuery {
    /// Case-insensitive substring matched against id, category, and classification.
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub status: Option<Classification>,
    /// 1-based.
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub page_size: Option<u32>,
}

/// One page of records, newest first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogPage {
    pub items: Vec<Record>,
    /// Matches across all pages.
    pub total: usize,
    pub page: u32,
    pub page_size: u32,
    pub total_pages: u32,
}

/// Summary counts behind the dashboard chart.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LogStats {
    pub total: usize,
    pub normal: usize,
    pub warning: usize,
    pub critical: usize,
    pub average_score: f64,
}

/// Append request body (`POST /logs`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppendRequest {
    #[serde(alias = "machineId")]
    pub machine_id: String,
    #[serde(alias = "rawPayload")]
    pub data: String,
    #[serde(alias = "anomalyScore")]
    pub anomaly_score: u8,
    #[serde(default = "default_async_mode")]
    pub async_mode: String,
}

fn default_async_mode() -> String {
    "sync".to_string()
}

impl AppendRequest {
    pub fn candidate(&self) -> LogCandidate {
        LogCandidate {
            category: self.machine_id.clone(),
            raw_payload: self.data.clone(),
            score: self.anomaly_score,
        }
    }

    pub fn is_async(&self) -> bool {
        self.async_mode == "async"
    }
}

/// Connect request body (`POST /session/connect`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectRequest {
    pub account: String,
}

/// Reveal request body (`POST /logs/reveal`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevealRequest {
    pub id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailabilityData {
    pub available: bool,
}

pub type AppendResponse = BaseResponse<serde_json::Value>;
pub type LogPageResponse = BaseResponse<LogPage>;
pub type LogStatsResponse = BaseResponse<LogStats>;
pub type SessionResponse = BaseResponse<WriterSession>;
pub type RevealResponse = BaseResponse<PayloadEnvelope>;
pub type AvailabilityResponse = BaseResponse<AvailabilityData>;
pub type JobStatusResponse = BaseResponse<Job>;
pub type NoticeListResponse = BaseResponse<Vec<Notice>>;

/// Status of an append job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Running,
    Done,
    Failed,
}

/// Append job record (for async submissions).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub job_id: String,
    pub status: JobStatus,
    /// Id of the committed record once the job is done.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record_id: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result_summary: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeKind {
    Pending,
    Success,
    Error,
}

/// Transient status notification; expires after the board's fixed interval.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notice {
    pub id: String,
    pub kind: NoticeKind,
    pub message: String,
    pub created_at: String,
    pub expires_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_request_accepts_dashboard_field_names() {
        let req: AppendRequest = serde_json::from_str(
            r#"{"machineId":"press-7","rawPayload":"temp=88","anomalyScore":85}"#,
        )
        .unwrap();
        assert_eq!(req.machine_id, "press-7");
        assert!(!req.is_async());
        let c = req.candidate();
        assert_eq!(c.raw_payload, "temp=88");
        assert_eq!(c.score, 85);
    }

    #[test]
    fn log_query_status_is_lowercase() {
        let q: LogQuery = serde_json::from_str(r#"{"status":"warning","page":2}"#).unwrap();
        assert_eq!(q.status, Some(Classification::Warning));
        assert_eq!(q.page, Some(2));
        assert!(q.search.is_none());
    }
}
