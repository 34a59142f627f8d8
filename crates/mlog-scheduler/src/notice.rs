//! Transient status notices (pending/success/error) that clear themselves after a fixed interval.

use chrono::Utc;
use mlog_types::{Notice, NoticeKind};
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;
use uuid::Uuid;

/// Interval after which a notice disappears.
pub const DEFAULT_NOTICE_TTL: Duration = Duration::from_millis(3000);

/// In-memory board of active notices.
pub struct NoticeBoard {
    ttl: Duration,
    notices: RwLock<Vec<(Instant, Notice)>>,
}

impl NoticeBoard {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            notices: RwLock::new(Vec::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Post a notice; it stays listed until the ttl elapses.
    pub async fn post(&self, kind: NoticeKind, message: impl Into<String>) -> Notice {
        let now = Utc::now();
        let expires = now + chrono::Duration::from_std(self.ttl).unwrap_or_else(|_| chrono::Duration::zero());
        let notice = Notice {
            id: Uuid::new_v4().to_string(),
            kind,
            message: message.into(),
            created_at: now.to_rfc3339(),
            expires_at: expires.to_rfc3339(),
        };
        let deadline = Instant::now() + self.ttl;
        let mut guard = self.notices.write().await;
        guard.retain(|(d, _)| *d > Instant::now());
        guard.push((deadline, notice.clone()));
        notice
    }

    /// Unexpired notices, oldest first.
    pub async fn active(&self) -> Vec<Notice> {
        let now = Instant::now();
        let mut guard = self.notices.write().await;
        guard.retain(|(d, _)| *d > now);
        guard.iter().map(|(_, n)| n.clone()).collect()
    }
}

impl Default for NoticeBoard {
    fn default() -> Self {
        Self::new(DEFAULT_NOTICE_TTL)
    }
}
