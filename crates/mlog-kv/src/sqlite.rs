//! SQLite-backed key-value contract (local persistence in place of the chain).

use mlog_types::{ContractError, KvContract, WriterSession};
use async_trait::async_trait;
use rusqlite::OptionalExtension;
use std::path::Path;

/// SQLite-backed KvContract. Always available while the connection is open.
pub struct SqliteContract {
    conn: std::sync::Mutex<rusqlite::Connection>,
}

impl SqliteContract {
    /// Open (or create) the store at `path`.
    pub fn new(path: impl AsRef<Path>) -> Result<Self, ContractError> {
        let conn = rusqlite::Connection::open(path)
            .map_err(|e| ContractError::Unreachable(e.to_string()))?;
        Self::init(conn)
    }

    /// In-memory database, mainly for tests.
    pub fn in_memory() -> Result<Self, ContractError> {
        let conn = rusqlite::Connection::open_in_memory()
            .map_err(|e| ContractError::Unreachable(e.to_string()))?;
        Self::init(conn)
    }

    fn init(conn: rusqlite::Connection) -> Result<Self, ContractError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value BLOB NOT NULL,
                writer TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            "#,
        )
        .map_err(|e| ContractError::Other(e.to_string()))?;

        Ok(Self {
            conn: std::sync::Mutex::new(conn),
        })
    }

    fn with_conn<T, F>(&self, f: F) -> Result<T, ContractError>
    where
        F: FnOnce(&rusqlite::Connection) -> Result<T, rusqlite::Error>,
    {
        let conn = self
            .conn
            .lock()
            .map_err(|e| ContractError::Other(format!("failed to acquire lock: {}", e)))?;
        f(&conn).map_err(|e| ContractError::Other(e.to_string()))
    }
}

#[async_trait]
impl KvContract for SqliteContract {
    async fn is_available(&self) -> Result<bool, ContractError> {
        self.with_conn(|conn| conn.query_row("SELECT 1", [], |_| Ok(true)))
    }

    async fn get_data(&self, key: &str) -> Result<Vec<u8>, ContractError> {
        self.with_conn(|conn| {
            let value: Option<Vec<u8>> = conn
                .query_row(
                    "SELECT value FROM kv WHERE key = ?1",
                    rusqlite::params![key],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(value.unwrap_or_default())
        })
    }

    async fn set_data(
        &self,
        session: &WriterSession,
        key: &str,
        value: &[u8],
    ) -> Result<(), ContractError> {
        let now = chrono::Utc::now().to_rfc3339();
        self.with_conn(|conn| {
            conn.execute(
                "INSERT OR REPLACE INTO kv (key, value, writer, updated_at) VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![key, value, session.account, now],
            )?;
            Ok(())
        })
    }
}
