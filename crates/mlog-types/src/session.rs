//! Write authorization obtained by connecting a wallet account.

use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("invalid account address: {0}")]
    InvalidAccount(String),
}

/// A connected writer. Holding one is the precondition for every write-class operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriterSession {
    /// Lowercased `0x`-prefixed 20-byte address.
    pub account: String,
    /// RFC3339 time of connection.
    pub connected_at: String,
}

impl WriterSession {
    /// Validate `account` and open a session for it.
    pub fn connect(account: &str) -> Result<Self, SessionError> {
        let account = normalize_account(account)?;
        Ok(Self {
            account,
            connected_at: chrono::Utc::now().to_rfc3339(),
        })
    }

    /// Abbreviated address for log lines and notices (`0x1234…abcd`).
    pub fn short_account(&self) -> String {
        let a = &self.account;
        match (a.get(..6), a.get(a.len().saturating_sub(4)..)) {
            (Some(head), Some(tail)) if a.len() > 10 => format!("{}…{}", head, tail),
            _ => a.clone(),
        }
    }
}

fn normalize_account(account: &str) -> Result<String, SessionError> {
    let trimmed = account.trim();
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .ok_or_else(|| SessionError::InvalidAccount(trimmed.to_string()))?;
    let bytes =
        hex::decode(digits).map_err(|_| SessionError::InvalidAccount(trimmed.to_string()))?;
    if bytes.len() != 20 {
        return Err(SessionError::InvalidAccount(trimmed.to_string()));
    }
    Ok(format!("0x{}", hex::encode(bytes)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connect_normalizes_address() {
        let s = WriterSession::connect("0xABCDEF0123456789abcdef0123456789ABCDEF01").unwrap();
        assert_eq!(s.account, "0xabcdef0123456789abcdef0123456789abcdef01");
        assert_eq!(s.short_account(), "0xabcd…ef01");
    }

    #[test]
    fn short_account_tolerates_unvalidated_sessions() {
        let short = WriterSession {
            account: "0x12".to_string(),
            connected_at: String::new(),
        };
        assert_eq!(short.short_account(), "0x12");
        let multibyte = WriterSession {
            account: "0x1éééé".to_string(),
            connected_at: String::new(),
        };
        assert_eq!(multibyte.short_account(), "0x1éééé");
    }

    #[test]
    fn connect_rejects_bad_addresses() {
        assert!(WriterSession::connect("abcdef0123456789abcdef0123456789abcdef01").is_err());
        assert!(WriterSession::connect("0x1234").is_err());
        assert!(WriterSession::connect("0xzz").is_err());
        assert!(WriterSession::connect("").is_err());
    }
}
