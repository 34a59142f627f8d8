//! Environment configuration and store construction.

use mlog_codec::PlaceholderCodec;
use mlog_kv::{HttpContract, InMemoryContract};
use mlog_store::IndexedLogStore;
use mlog_types::LogStore;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid {key}: {value}")]
    Invalid { key: &'static str, value: String },
    #[error("backend {0} requires building with the `{0}` feature")]
    FeatureDisabled(&'static str),
    #[error("backend init failed: {0}")]
    Backend(String),
}

/// Which key-value contract backs the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Memory,
    Sqlite,
    Http,
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub listen: SocketAddr,
    pub backend: Backend,
    pub sqlite_path: String,
    pub contract_url: Option<String>,
    pub notice_ttl: Duration,
}

impl ApiConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source (`MLOG_*` names).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let listen_raw = lookup("MLOG_LISTEN").unwrap_or_else(|| "0.0.0.0:8002".to_string());
        let listen = listen_raw.parse().map_err(|_| ConfigError::Invalid {
            key: "MLOG_LISTEN",
            value: listen_raw.clone(),
        })?;

        let backend = match lookup("MLOG_BACKEND")
            .unwrap_or_else(|| "memory".to_string())
            .to_ascii_lowercase()
            .as_str()
        {
            "memory" => Backend::Memory,
            "sqlite" => Backend::Sqlite,
            "http" => Backend::Http,
            other => {
                return Err(ConfigError::Invalid {
                    key: "MLOG_BACKEND",
                    value: other.to_string(),
                })
            }
        };

        let notice_ttl = match lookup("MLOG_NOTICE_TTL_MS") {
            Some(raw) => Duration::from_millis(raw.parse().map_err(|_| ConfigError::Invalid {
                key: "MLOG_NOTICE_TTL_MS",
                value: raw.clone(),
            })?),
            None => mlog_scheduler::DEFAULT_NOTICE_TTL,
        };

        Ok(Self {
            listen,
            backend,
            sqlite_path: lookup("MLOG_SQLITE_PATH").unwrap_or_else(|| "mlog.db".to_string()),
            contract_url: lookup("MLOG_CONTRACT_URL"),
            notice_ttl,
        })
    }

    /// Construct the log store for the configured backend.
    pub fn build_store(&self) -> Result<Arc<dyn LogStore + Send + Sync>, ConfigError> {
        let codec = PlaceholderCodec::new();
        match self.backend {
            Backend::Memory => Ok(Arc::new(IndexedLogStore::new(
                InMemoryContract::new(),
                codec,
            ))),
            Backend::Http => {
                let contract = match self.contract_url {
                    Some(ref url) => HttpContract::new(url.clone()),
                    None => HttpContract::from_env(),
                };
                Ok(Arc::new(IndexedLogStore::new(contract, codec)))
            }
            Backend::Sqlite => self.build_sqlite_store(codec),
        }
    }

    #[cfg(feature = "sqlite")]
    fn build_sqlite_store(
        &self,
        codec: PlaceholderCodec,
    ) -> Result<Arc<dyn LogStore + Send + Sync>, ConfigError> {
        let contract = mlog_kv::SqliteContract::new(&self.sqlite_path)
            .map_err(|e| ConfigError::Backend(e.to_string()))?;
        Ok(Arc::new(IndexedLogStore::new(contract, codec)))
    }

    #[cfg(not(feature = "sqlite"))]
    fn build_sqlite_store(
        &self,
        _codec: PlaceholderCodec,
    ) -> Result<Arc<dyn LogStore + Send + Sync>, ConfigError> {
        Err(ConfigError::FeatureDisabled("sqlite"))
    }
}
