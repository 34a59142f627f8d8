//! Indexed record store client: a `log_keys` directory plus one `log_<id>` value per record,
//! kept inside a generic key-value contract.

mod id;
mod indexed;
mod query;

pub use id::generate_record_id;
pub use indexed::IndexedLogStore;
pub use mlog_types::{AppendPhase, LoadReport, LogStore, LogStoreError};
pub use query::{query, stats};
