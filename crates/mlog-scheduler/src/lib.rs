//! Append scheduler and transient status notices.

mod memory;
mod notice;
mod trait_;

pub use memory::InMemoryScheduler;
pub use notice::{NoticeBoard, DEFAULT_NOTICE_TTL};
pub use trait_::{Scheduler, SchedulerError};
