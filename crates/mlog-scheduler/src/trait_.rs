//! Scheduler trait: submit append job, get status.

use async_trait::async_trait;
use mlog_types::{Job, LogCandidate, WriterSession};

#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    #[error("scheduler error: {0}")]
    Other(String),
}

/// Scheduler for async append: submit returns job_id, status can be polled.
///
/// `get_status` returns `Ok(None)` for unknown job ids; the API layer maps that to 404.
#[async_trait]
pub trait Scheduler: Send + Sync {
    /// Queue an append; the write runs in the worker under `session`.
    async fn submit_append(
        &self,
        session: WriterSession,
        candidate: LogCandidate,
    ) -> Result<String, SchedulerError>;

    async fn get_status(&self, job_id: &str) -> Result<Option<Job>, SchedulerError>;
}
