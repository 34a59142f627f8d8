//! Placeholder for a confidentiality-preserving transform: a tagged base64 envelope.
//!
//! The stored value is never the caller's plaintext verbatim, but anyone can reverse it.
//! A real encryption codec slots in behind the same `PayloadCodec` trait.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use mlog_types::{CodecError, PayloadCodec, PayloadEnvelope};

const TAG: &str = "FHE:";

/// Tagged base64-of-JSON codec.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlaceholderCodec;

impl PlaceholderCodec {
    pub fn new() -> Self {
        Self
    }
}

impl PayloadCodec for PlaceholderCodec {
    fn protect(&self, envelope: &PayloadEnvelope) -> Result<String, CodecError> {
        let json = serde_json::to_vec(envelope).map_err(|e| CodecError::Other(e.to_string()))?;
        Ok(format!("{}{}", TAG, BASE64.encode(json)))
    }

    fn reveal(&self, protected: &str) -> Result<PayloadEnvelope, CodecError> {
        let body = protected
            .strip_prefix(TAG)
            .ok_or_else(|| CodecError::Malformed("missing FHE tag".to_string()))?;
        let bytes = BASE64
            .decode(body)
            .map_err(|e| CodecError::Malformed(e.to_string()))?;
        serde_json::from_slice(&bytes).map_err(|e| CodecError::Malformed(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn envelope() -> PayloadEnvelope {
        PayloadEnvelope {
            category: "press-7".to_string(),
            payload: "temp=88".to_string(),
            score: 85,
        }
    }

    #[test]
    fn reveal_inverts_protect() {
        let codec = PlaceholderCodec::new();
        let protected = codec.protect(&envelope()).unwrap();
        assert!(protected.starts_with("FHE:"));
        assert!(!protected.contains("temp=88"));
        assert_eq!(codec.reveal(&protected).unwrap(), envelope());
    }

    #[test]
    fn reveal_rejects_foreign_values() {
        let codec = PlaceholderCodec::new();
        assert!(matches!(
            codec.reveal("temp=88"),
            Err(CodecError::Malformed(_))
        ));
        assert!(matches!(
            codec.reveal("FHE:***"),
            Err(CodecError::Malformed(_))
        ));
        let not_an_envelope = format!("FHE:{}", BASE64.encode(b"[1,2]"));
        assert!(codec.reveal(&not_an_envelope).is_err());
    }
}
