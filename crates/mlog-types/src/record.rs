//! Records, classification, and the values stored under reserved contract keys.

use crate::LogStoreError;
use serde::{Deserialize, Serialize};

/// Reserved key holding the directory of all known record ids.
pub const DIRECTORY_KEY: &str = "log_keys";

/// Prefix of the per-record key (`log_<id>`).
pub const RECORD_KEY_PREFIX: &str = "log_";

/// Highest accepted anomaly score.
pub const MAX_SCORE: u8 = 100;

/// Derived key under which the record with `id` is stored.
pub fn record_key(id: &str) -> String {
    format!("{}{}", RECORD_KEY_PREFIX, id)
}

/// Classification label derived from an anomaly score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Classification {
    #[default]
    Normal,
    Warning,
    Critical,
}

impl Classification {
    /// `> 70` is critical, `(30, 70]` is warning, everything else normal.
    pub fn from_score(score: u8) -> Self {
        if score > 70 {
            Classification::Critical
        } else if score > 30 {
            Classification::Warning
        } else {
            Classification::Normal
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Classification::Normal => "normal",
            Classification::Warning => "warning",
            Classification::Critical => "critical",
        }
    }

    /// Parse a label case-insensitively; unknown labels yield `None`.
    pub fn parse(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "normal" => Some(Classification::Normal),
            "warning" => Some(Classification::Warning),
            "critical" => Some(Classification::Critical),
            _ => None,
        }
    }
}

impl std::fmt::Display for Classification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Input of an append: what the operator submits from the log form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogCandidate {
    /// Machine id the log belongs to.
    pub category: String,
    pub raw_payload: String,
    pub score: u8,
}

impl LogCandidate {
    /// Reject an empty machine id or an out-of-range score.
    pub fn validate(&self) -> Result<(), LogStoreError> {
        if self.category.trim().is_empty() {
            return Err(LogStoreError::InvalidInput(
                "machine id must not be empty".to_string(),
            ));
        }
        if self.score > MAX_SCORE {
            return Err(LogStoreError::InvalidInput(format!(
                "anomaly score must be within 0..={}, got {}",
                MAX_SCORE, self.score
            )));
        }
        Ok(())
    }
}

/// One committed machine-log entry as surfaced to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub id: String,
    /// Protected payload, as stored.
    pub payload: String,
    /// Unix seconds.
    pub timestamp: u64,
    pub category: String,
    pub classification: Classification,
    pub score: u8,
}

impl Record {
    pub fn from_stored(id: impl Into<String>, stored: StoredRecord) -> Self {
        Self {
            id: id.into(),
            payload: stored.data,
            timestamp: stored.timestamp,
            category: stored.machine_id,
            classification: stored.status,
            score: stored.anomaly_score,
        }
    }

    pub fn to_stored(&self) -> StoredRecord {
        StoredRecord {
            data: self.payload.clone(),
            timestamp: self.timestamp,
            machine_id: self.category.clone(),
            status: self.classification,
            anomaly_score: self.score,
        }
    }
}

/// Value stored under `log_<id>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredRecord {
    pub data: String,
    pub timestamp: u64,
    #[serde(rename = "machineId")]
    pub machine_id: String,
    pub status: Classification,
    #[serde(rename = "anomalyScore")]
    pub anomaly_score: u8,
}

impl StoredRecord {
    /// Decode a stored value. Empty bytes mean the key is unset and decode to `None`;
    /// an out-of-range score is treated as malformed.
    pub fn decode(bytes: &[u8]) -> Result<Option<Self>, serde_json::Error> {
        if bytes.is_empty() {
            return Ok(None);
        }
        let stored: StoredRecord = serde_json::from_slice(bytes)?;
        if stored.anomaly_score > MAX_SCORE {
            return Err(serde::de::Error::custom(format!(
                "anomalyScore out of range: {}",
                stored.anomaly_score
            )));
        }
        Ok(Some(stored))
    }

    pub fn encode(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}

/// Ordered list of record ids stored under [`DIRECTORY_KEY`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Directory(pub Vec<String>);

impl Directory {
    /// Decode the directory value; empty bytes are an empty directory.
    pub fn decode(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        if bytes.is_empty() {
            return Ok(Self::default());
        }
        serde_json::from_slice(bytes)
    }

    pub fn encode(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    pub fn ids(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Append `id` unless it is already listed.
    pub fn push(&mut self, id: &str) {
        if !self.0.iter().any(|existing| existing == id) {
            self.0.push(id.to_string());
        }
    }
}

/// Structure the codec protects: category, raw payload, and score of the submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayloadEnvelope {
    #[serde(rename = "machineId")]
    pub category: String,
    #[serde(rename = "data")]
    pub payload: String,
    #[serde(rename = "anomalyScore")]
    pub score: u8,
}

impl From<&LogCandidate> for PayloadEnvelope {
    fn from(c: &LogCandidate) -> Self {
        Self {
            category: c.category.clone(),
            payload: c.raw_payload.clone(),
            score: c.score,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification_boundaries() {
        assert_eq!(Classification::from_score(0), Classification::Normal);
        assert_eq!(Classification::from_score(30), Classification::Normal);
        assert_eq!(Classification::from_score(31), Classification::Warning);
        assert_eq!(Classification::from_score(70), Classification::Warning);
        assert_eq!(Classification::from_score(71), Classification::Critical);
        assert_eq!(Classification::from_score(100), Classification::Critical);
    }

    #[test]
    fn classification_matches_thresholds_for_every_score() {
        for s in 0..=MAX_SCORE {
            let expected = if s > 70 {
                Classification::Critical
            } else if s > 30 {
                Classification::Warning
            } else {
                Classification::Normal
            };
            assert_eq!(Classification::from_score(s), expected, "score {}", s);
        }
    }

    #[test]
    fn candidate_validation_bounds() {
        let mut c = LogCandidate {
            category: "press-7".to_string(),
            raw_payload: "temp=88".to_string(),
            score: MAX_SCORE,
        };
        assert!(c.validate().is_ok());
        c.score = 150;
        assert!(matches!(c.validate(), Err(LogStoreError::InvalidInput(_))));
        c.score = 0;
        c.category = " ".to_string();
        assert!(matches!(c.validate(), Err(LogStoreError::InvalidInput(_))));
    }

    #[test]
    fn stored_record_uses_dashboard_field_names() {
        let stored = StoredRecord {
            data: "FHE:abc".to_string(),
            timestamp: 1_700_000_000,
            machine_id: "press-7".to_string(),
            status: Classification::Critical,
            anomaly_score: 85,
        };
        let v: serde_json::Value = serde_json::from_slice(&stored.encode().unwrap()).unwrap();
        assert_eq!(v["machineId"], "press-7");
        assert_eq!(v["status"], "critical");
        assert_eq!(v["anomalyScore"], 85);
        assert_eq!(v["timestamp"], 1_700_000_000u64);
        assert_eq!(v["data"], "FHE:abc");
    }

    #[test]
    fn stored_record_decode_handles_unset_and_garbage() {
        assert!(StoredRecord::decode(b"").unwrap().is_none());
        assert!(StoredRecord::decode(b"not json").is_err());
        let out_of_range =
            br#"{"data":"x","timestamp":1,"machineId":"m","status":"normal","anomalyScore":101}"#;
        assert!(StoredRecord::decode(out_of_range).is_err());
    }

    #[test]
    fn directory_is_a_plain_json_array() {
        let mut dir = Directory::decode(b"").unwrap();
        assert!(dir.is_empty());
        dir.push("a");
        dir.push("b");
        dir.push("a");
        assert_eq!(dir.encode().unwrap(), br#"["a","b"]"#.to_vec());
        assert!(Directory::decode(br#"{"a":1}"#).is_err());
    }

    #[test]
    fn record_key_is_prefixed() {
        assert_eq!(record_key("1700abc"), "log_1700abc");
    }
}
