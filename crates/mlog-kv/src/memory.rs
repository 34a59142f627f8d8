//! In-memory key-value contract with scriptable availability and write faults.

use mlog_types::{ContractError, KvContract, WriterSession};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Failure injected into a scheduled `set_data` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteFault {
    /// The user refuses to sign.
    Decline,
    /// The transaction is rejected with the given reason.
    Reject(String),
}

/// In-memory KvContract: a process-local map standing in for the chain contract.
pub struct InMemoryContract {
    /// key -> value
    store: Arc<RwLock<HashMap<String, Vec<u8>>>>,
    available: AtomicBool,
    reachable: AtomicBool,
    /// Number of `set_data` calls seen so far (including faulted ones).
    writes: AtomicU64,
    /// absolute write number -> fault
    faults: std::sync::Mutex<HashMap<u64, WriteFault>>,
}

impl InMemoryContract {
    pub fn new() -> Self {
        Self {
            store: Arc::new(RwLock::new(HashMap::new())),
            available: AtomicBool::new(true),
            reachable: AtomicBool::new(true),
            writes: AtomicU64::new(0),
            faults: std::sync::Mutex::new(HashMap::new()),
        }
    }

    /// What `is_available` reports.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// When false, every call fails with `ContractError::Unreachable`.
    pub fn set_reachable(&self, reachable: bool) {
        self.reachable.store(reachable, Ordering::SeqCst);
    }

    /// Fail the `n`-th upcoming `set_data` call (0 = the next one).
    pub fn fault_on_write(&self, n: u64, fault: WriteFault) {
        let at = self.writes.load(Ordering::SeqCst) + n;
        if let Ok(mut faults) = self.faults.lock() {
            faults.insert(at, fault);
        }
    }

    /// Store bytes directly, bypassing authorization and faults.
    pub async fn put_raw(&self, key: &str, value: impl Into<Vec<u8>>) {
        self.store.write().await.insert(key.to_string(), value.into());
    }

    pub async fn raw(&self, key: &str) -> Option<Vec<u8>> {
        self.store.read().await.get(key).cloned()
    }

    pub async fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.store.read().await.keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn write_count(&self) -> u64 {
        self.writes.load(Ordering::SeqCst)
    }

    fn check_reachable(&self) -> Result<(), ContractError> {
        if self.reachable.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(ContractError::Unreachable("in-memory contract offline".to_string()))
        }
    }

    fn take_fault(&self, at: u64) -> Option<WriteFault> {
        self.faults.lock().ok().and_then(|mut f| f.remove(&at))
    }
}

impl Default for InMemoryContract {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl KvContract for InMemoryContract {
    async fn is_available(&self) -> Result<bool, ContractError> {
        self.check_reachable()?;
        Ok(self.available.load(Ordering::SeqCst))
    }

    async fn get_data(&self, key: &str) -> Result<Vec<u8>, ContractError> {
        self.check_reachable()?;
        let guard = self.store.read().await;
        Ok(guard.get(key).cloned().unwrap_or_default())
    }

    async fn set_data(
        &self,
        session: &WriterSession,
        key: &str,
        value: &[u8],
    ) -> Result<(), ContractError> {
        self.check_reachable()?;
        let at = self.writes.fetch_add(1, Ordering::SeqCst);
        match self.take_fault(at) {
            Some(WriteFault::Decline) => return Err(ContractError::Declined),
            Some(WriteFault::Reject(reason)) => return Err(ContractError::Rejected(reason)),
            None => {}
        }
        tracing::trace!(key = %key, account = %session.account, bytes = value.len(), "set_data");
        let mut guard = self.store.write().await;
        guard.insert(key.to_string(), value.to_vec());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> WriterSession {
        WriterSession::connect("0x00000000000000000000000000000000000000aa").unwrap()
    }

    #[tokio::test]
    async fn unset_keys_read_as_empty() {
        let c = InMemoryContract::new();
        assert!(c.get_data("log_keys").await.unwrap().is_empty());
        assert!(c.is_available().await.unwrap());
    }

    #[tokio::test]
    async fn scripted_faults_hit_the_scheduled_write_only() {
        let c = InMemoryContract::new();
        let s = session();
        c.fault_on_write(1, WriteFault::Decline);
        c.set_data(&s, "a", b"1").await.unwrap();
        assert_eq!(c.set_data(&s, "b", b"2").await, Err(ContractError::Declined));
        c.set_data(&s, "c", b"3").await.unwrap();
        assert_eq!(c.keys().await, vec!["a".to_string(), "c".to_string()]);
        assert_eq!(c.write_count(), 3);
    }

    #[tokio::test]
    async fn unreachable_contract_fails_every_call() {
        let c = InMemoryContract::new();
        c.set_reachable(false);
        assert!(matches!(
            c.is_available().await,
            Err(ContractError::Unreachable(_))
        ));
        assert!(c.get_data("x").await.is_err());
        assert!(c.set_data(&session(), "x", b"1").await.is_err());
    }
}
