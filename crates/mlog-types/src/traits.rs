//! Traits for the key-value contract, the payload codec, and the log store.

use crate::{LogCandidate, PayloadEnvelope, Record, WriterSession};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Generic on-chain key-value contract (`isAvailable`, `getData`, `setData`).
#[async_trait]
pub trait KvContract: Send + Sync {
    /// The contract's own availability probe.
    async fn is_available(&self) -> Result<bool, ContractError>;

    /// Value under `key`; empty when the key is unset.
    async fn get_data(&self, key: &str) -> Result<Vec<u8>, ContractError>;

    /// Write `value` under `key`, authorized by `session`.
    async fn set_data(
        &self,
        session: &WriterSession,
        key: &str,
        value: &[u8],
    ) -> Result<(), ContractError>;
}

/// Reversible transform applied to a record's payload before storage.
pub trait PayloadCodec: Send + Sync {
    fn protect(&self, envelope: &PayloadEnvelope) -> Result<String, CodecError>;

    fn reveal(&self, protected: &str) -> Result<PayloadEnvelope, CodecError>;
}

/// Outcome of reading every directory-listed record.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoadReport {
    /// Newest first.
    pub records: Vec<Record>,
    /// False when the store reported itself unavailable or could not be reached.
    pub available: bool,
    /// Listed ids whose record was missing or malformed.
    pub skipped: usize,
}

impl LoadReport {
    pub fn unavailable() -> Self {
        Self {
            records: Vec::new(),
            available: false,
            skipped: 0,
        }
    }
}

/// Step of a single append; failures carry the step they happened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppendPhase {
    Idle,
    Encoding,
    WritingRecord,
    ReadingDirectory,
    WritingDirectory,
    Done,
}

impl AppendPhase {
    pub fn as_str(self) -> &'static str {
        match self {
            AppendPhase::Idle => "idle",
            AppendPhase::Encoding => "encoding",
            AppendPhase::WritingRecord => "writing_record",
            AppendPhase::ReadingDirectory => "reading_directory",
            AppendPhase::WritingDirectory => "writing_directory",
            AppendPhase::Done => "done",
        }
    }
}

impl std::fmt::Display for AppendPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Indexed record store: read-all, append-one, availability.
#[async_trait]
pub trait LogStore: Send + Sync {
    async fn load_all(&self) -> LoadReport;

    async fn append(
        &self,
        session: Option<&WriterSession>,
        candidate: &LogCandidate,
    ) -> Result<Record, LogStoreError>;

    async fn check_availability(&self) -> bool;

    /// Decode a record's protected payload.
    fn reveal(&self, record: &Record) -> Result<PayloadEnvelope, LogStoreError>;
}

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum ContractError {
    #[error("contract unreachable: {0}")]
    Unreachable(String),
    #[error("authorization declined by user")]
    Declined,
    #[error("write rejected: {0}")]
    Rejected(String),
    #[error("contract error: {0}")]
    Other(String),
}

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum CodecError {
    #[error("malformed protected payload: {0}")]
    Malformed(String),
    #[error("codec error: {0}")]
    Other(String),
}

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum LogStoreError {
    #[error("not connected: connect a wallet before writing")]
    NotConnected,
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("user declined authorization while {phase}")]
    Declined { phase: AppendPhase },
    #[error("submission failed while {phase}: {reason}")]
    SubmissionFailed { phase: AppendPhase, reason: String },
    #[error("codec: {0}")]
    Codec(#[from] CodecError),
}

impl LogStoreError {
    /// Classify a contract failure raised during `phase`.
    pub fn from_contract(phase: AppendPhase, err: ContractError) -> Self {
        match err {
            ContractError::Declined => LogStoreError::Declined { phase },
            other => LogStoreError::SubmissionFailed {
                phase,
                reason: other.to_string(),
            },
        }
    }

    pub fn phase(&self) -> Option<AppendPhase> {
        match self {
            LogStoreError::Declined { phase } | LogStoreError::SubmissionFailed { phase, .. } => {
                Some(*phase)
            }
            _ => None,
        }
    }

    pub fn is_declined(&self) -> bool {
        matches!(self, LogStoreError::Declined { .. })
    }

    /// True when the failed append had already written its record, leaving it
    /// stored but absent from the directory.
    pub fn left_orphan(&self) -> bool {
        matches!(
            self.phase(),
            Some(AppendPhase::ReadingDirectory) | Some(AppendPhase::WritingDirectory)
        )
    }
}
