//! HTTP client for a JSON gateway fronting the on-chain key-value contract.

use mlog_types::{ContractError, KvContract, WriterSession};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct AvailableResponse {
    available: bool,
}

#[derive(Debug, Deserialize)]
struct DataResponse {
    /// `0x`-prefixed hex; empty or `0x` when the key is unset.
    #[serde(default)]
    value: Option<String>,
}

/// KvContract that calls a gateway exposing `GET /available`, `GET /data/{key}`
/// and `POST /data/{key}`.
pub struct HttpContract {
    client: reqwest::Client,
    base_url: String,
}

impl HttpContract {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn from_env() -> Self {
        let url = std::env::var("MLOG_CONTRACT_URL")
            .unwrap_or_else(|_| "http://127.0.0.1:8545/kv".to_string());
        Self::new(url)
    }

    /// `{base}/data/{key}` with `key` percent-encoded as a single path segment.
    fn data_url(&self, key: &str) -> Result<reqwest::Url, ContractError> {
        let mut url = reqwest::Url::parse(&self.base_url)
            .map_err(|e| ContractError::Other(format!("bad gateway url: {}", e)))?;
        {
            let mut segments = url.path_segments_mut().map_err(|_| {
                ContractError::Other(format!("gateway url cannot be a base: {}", self.base_url))
            })?;
            segments.pop_if_empty().extend(["data", key]);
        }
        Ok(url)
    }
}

fn decode_hex_value(value: Option<String>) -> Result<Vec<u8>, ContractError> {
    let raw = value.unwrap_or_default();
    let digits = raw.strip_prefix("0x").unwrap_or(&raw);
    if digits.is_empty() {
        return Ok(Vec::new());
    }
    hex::decode(digits).map_err(|e| ContractError::Other(format!("bad hex from gateway: {}", e)))
}

#[async_trait::async_trait]
impl KvContract for HttpContract {
    async fn is_available(&self) -> Result<bool, ContractError> {
        let res = self
            .client
            .get(format!("{}/available", self.base_url))
            .send()
            .await
            .map_err(|e| ContractError::Unreachable(e.to_string()))?;
        if !res.status().is_success() {
            return Ok(false);
        }
        let parsed: AvailableResponse = res
            .json()
            .await
            .map_err(|e| ContractError::Other(e.to_string()))?;
        Ok(parsed.available)
    }

    async fn get_data(&self, key: &str) -> Result<Vec<u8>, ContractError> {
        let res = self
            .client
            .get(self.data_url(key)?)
            .send()
            .await
            .map_err(|e| ContractError::Unreachable(e.to_string()))?;
        let status = res.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(Vec::new());
        }
        let body = res
            .text()
            .await
            .map_err(|e| ContractError::Unreachable(e.to_string()))?;
        if !status.is_success() {
            return Err(ContractError::Other(format!(
                "gateway error {}: {}",
                status, body
            )));
        }
        let parsed: DataResponse =
            serde_json::from_str(&body).map_err(|e| ContractError::Other(e.to_string()))?;
        decode_hex_value(parsed.value)
    }

    async fn set_data(
        &self,
        session: &WriterSession,
        key: &str,
        value: &[u8],
    ) -> Result<(), ContractError> {
        let body = serde_json::json!({
            "value": format!("0x{}", hex::encode(value)),
            "from": session.account,
        });
        let res = self
            .client
            .post(self.data_url(key)?)
            .json(&body)
            .send()
            .await
            .map_err(|e| ContractError::Unreachable(e.to_string()))?;
        let status = res.status();
        if status.is_success() {
            return Ok(());
        }
        if status == reqwest::StatusCode::FORBIDDEN {
            return Err(ContractError::Declined);
        }
        let body = res.text().await.unwrap_or_default();
        Err(ContractError::Rejected(format!("{}: {}", status, body)))
    }
}
