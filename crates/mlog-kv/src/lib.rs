//! Key-value contract backends: in-memory (scriptable), HTTP gateway, and SQLite.

mod http;
mod memory;

#[cfg(feature = "sqlite")]
mod sqlite;

pub use http::HttpContract;
pub use memory::{InMemoryContract, WriteFault};
pub use mlog_types::{ContractError, KvContract};

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteContract;
