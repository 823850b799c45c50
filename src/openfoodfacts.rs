//! OpenFoodFacts product API client.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::config::AppConfig;

const USER_AGENT: &str = "nutriscan/0.1.0 (https://github.com/nutriscan/nutriscan)";

#[derive(Debug, Error)]
pub enum FetchError {
    /// Connect failure, timeout, or a non-2xx status other than 404.
    #[error("{0}")]
    Transport(String),

    /// 2xx response whose body is not JSON.
    #[error("{0}")]
    Decode(String),
}

/// What one product fetch produced, before any nutrition interpretation.
#[derive(Debug)]
pub enum FetchOutcome {
    /// Upstream answered with a JSON document. Its schema is owned by
    /// OpenFoodFacts and is treated as untrusted and partial.
    Payload(Value),
    /// Upstream says there is no such product.
    NotFound,
}

/// Product-database capability, keyed by barcode. Exactly one outbound call
/// per invocation; no retries.
#[async_trait]
pub trait ProductDatabase: Send + Sync {
    async fn fetch_product(&self, code: &str) -> Result<FetchOutcome, FetchError>;
}

pub struct OpenFoodFactsClient {
    http: reqwest::Client,
    base_url: String,
}

impl OpenFoodFactsClient {
    pub fn new(config: &AppConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(config.upstream_timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.off_base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl ProductDatabase for OpenFoodFactsClient {
    async fn fetch_product(&self, code: &str) -> Result<FetchOutcome, FetchError> {
        let url = format!("{}/api/v3/product/{}.json", self.base_url, code);
        tracing::debug!(code = %code, url = %url, "querying OpenFoodFacts");

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        let status = response.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(FetchOutcome::NotFound);
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(code = %code, %status, "upstream returned error status");
            return Err(FetchError::Transport(format!(
                "upstream status {}: {}",
                status, body
            )));
        }

        let payload: Value = response
            .json()
            .await
            .map_err(|e| FetchError::Decode(e.to_string()))?;

        Ok(FetchOutcome::Payload(payload))
    }
}
