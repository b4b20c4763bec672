//! HTTP client for content sources.

use std::time::Duration;

use async_trait::async_trait;
use dailyread_types::ContentSource;
use serde_json::Value;

use crate::SourceError;

/// Default per-attempt timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Default connection timeout.
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(3);

/// Fetches the raw JSON body of one source.
#[async_trait]
pub trait SourceFetcher: Send + Sync {
    async fn fetch(&self, source: &ContentSource) -> Result<Value, SourceError>;
}

/// `GET {source.url}` with a bounded timeout; expects a JSON body.
pub struct HttpSourceClient {
    /// HTTP client (reusable connection pool).
    http_client: reqwest::Client,
}

impl HttpSourceClient {
    pub fn new() -> Result<Self, SourceError> {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self, SourceError> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT.min(timeout))
            .user_agent(concat!("dailyread/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| SourceError::Client(e.to_string()))?;
        Ok(Self { http_client })
    }
}

#[async_trait]
impl SourceFetcher for HttpSourceClient {
    async fn fetch(&self, source: &ContentSource) -> Result<Value, SourceError> {
        let response = self.http_client.get(&source.url).send().await.map_err(|e| {
            if e.is_timeout() {
                SourceError::Unreachable(format!("request timed out: {e}"))
            } else if e.is_connect() {
                SourceError::Unreachable(format!("connection failed: {e}"))
            } else {
                SourceError::Unreachable(e.to_string())
            }
        })?;

        if !response.status().is_success() {
            return Err(SourceError::Status(response.status().as_u16()));
        }

        response
            .json()
            .await
            .map_err(|e| SourceError::InvalidBody(format!("failed to parse source response: {e}")))
    }
}
