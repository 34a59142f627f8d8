//! In-memory scheduler: single queue + one worker, job state in a map.

use crate::{NoticeBoard, Scheduler, SchedulerError};
use async_trait::async_trait;
use chrono::Utc;
use mlog_types::{Job, JobStatus, LogCandidate, LogStore, NoticeKind, WriterSession};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};
use uuid::Uuid;

type JobMessage = (String, WriterSession, LogCandidate);

/// In-memory scheduler: queues appends, one worker calls `LogStore::append` and updates job status.
///
/// Appends run strictly one after another, so jobs submitted through the same scheduler never race
/// on the directory.
pub struct InMemoryScheduler {
    jobs: Arc<RwLock<HashMap<String, Job>>>,
    tx: mpsc::UnboundedSender<JobMessage>,
    notices: Option<Arc<NoticeBoard>>,
}

impl InMemoryScheduler {
    /// Create scheduler and spawn worker on the given store.
    /// If `notices` is provided, pending/success/error notices are posted for each job.
    pub fn new(
        store: Arc<dyn LogStore + Send + Sync>,
        notices: Option<Arc<NoticeBoard>>,
    ) -> Self {
        let jobs: Arc<RwLock<HashMap<String, Job>>> = Arc::new(RwLock::new(HashMap::new()));
        let (tx, mut rx) = mpsc::unbounded_channel::<JobMessage>();

        let jobs_clone = Arc::clone(&jobs);
        let worker_notices = notices.clone();
        tokio::spawn(async move {
            while let Some((job_id, session, candidate)) = rx.recv().await {
                {
                    let mut guard = jobs_clone.write().await;
                    if let Some(job) = guard.get_mut(&job_id) {
                        job.status = JobStatus::Running;
                        job.updated_at = Utc::now().to_rfc3339();
                    }
                }
                let result = store.append(Some(&session), &candidate).await;
                let (status, record_id, summary, notice) = match &result {
                    Ok(record) => (
                        JobStatus::Done,
                        Some(record.id.clone()),
                        serde_json::json!({ "id": record.id, "status": record.classification }),
                        (
                            NoticeKind::Success,
                            format!("log {} committed", record.id),
                        ),
                    ),
                    Err(e) => (
                        JobStatus::Failed,
                        None,
                        serde_json::json!({
                            "error": e.to_string(),
                            "declined": e.is_declined(),
                            "orphan": e.left_orphan(),
                        }),
                        (NoticeKind::Error, e.to_string()),
                    ),
                };
                tracing::info!(job_id = %job_id, status = ?status, "append job finished");
                if let Some(ref board) = worker_notices {
                    board.post(notice.0, notice.1).await;
                }
                let mut guard = jobs_clone.write().await;
                if let Some(job) = guard.get_mut(&job_id) {
                    job.status = status;
                    job.record_id = record_id;
                    job.updated_at = Utc::now().to_rfc3339();
                    job.result_summary = Some(summary);
                }
            }
        });

        Self { jobs, tx, notices }
    }
}

#[async_trait]
impl Scheduler for InMemoryScheduler {
    async fn submit_append(
        &self,
        session: WriterSession,
        candidate: LogCandidate,
    ) -> Result<String, SchedulerError> {
        let job_id = Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();
        let job = Job {
            job_id: job_id.clone(),
            status: JobStatus::Pending,
            record_id: None,
            created_at: now.clone(),
            updated_at: now,
            result_summary: None,
        };
        self.jobs.write().await.insert(job_id.clone(), job);
        if let Some(ref board) = self.notices {
            board
                .post(NoticeKind::Pending, format!("submitting log for {}", candidate.category))
                .await;
        }
        self.tx
            .send((job_id.clone(), session, candidate))
            .map_err(|_| SchedulerError::Other("worker channel closed".to_string()))?;
        Ok(job_id)
    }

    async fn get_status(&self, job_id: &str) -> Result<Option<Job>, SchedulerError> {
        let guard = self.jobs.read().await;
        Ok(guard.get(job_id).cloned())
    }
}
