//! JSON-over-HTTP client backed by `reqwest`.
//!
//! Features:
//! - Array query values flattened into repeated `key=value` pairs
//! - Optional cache-busting timestamp (minute or hour granularity)
//! - Per-request timeout, falling back to the client default
//! - Non-2xx statuses and timeouts mapped onto [`TransportError`]

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use chainscan_core::error::TransportError;
use chainscan_core::transport::{CacheBuster, JsonRequest, JsonTransport};

/// Configuration for [`HttpJsonClient`].
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Timeout applied when a request does not carry its own.
    pub request_timeout: Duration,
    pub user_agent: String,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
            user_agent: concat!("chainscan/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Plain JSON HTTP client. Put it behind a
/// [`RequestGate`](chainscan_core::RequestGate) to share a request budget.
pub struct HttpJsonClient {
    http: reqwest::Client,
    request_timeout: Duration,
}

impl HttpJsonClient {
    pub fn new(config: HttpClientConfig) -> Result<Self, TransportError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .user_agent(config.user_agent)
            .build()
            .map_err(|e| TransportError::Other(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            request_timeout: config.request_timeout,
        })
    }

    /// Create with default configuration.
    pub fn with_defaults() -> Result<Self, TransportError> {
        Self::new(HttpClientConfig::default())
    }

    async fn execute(
        &self,
        builder: reqwest::RequestBuilder,
        req: &JsonRequest,
    ) -> Result<Value, TransportError> {
        let timeout = req.timeout.unwrap_or(self.request_timeout);
        let mut builder = builder.query(&query_pairs(req, chrono::Utc::now().timestamp()));
        for (name, value) in &req.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let resp = builder
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| map_reqwest_error(e, timeout))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            tracing::debug!(url = %req.url, status = status.as_u16(), "non-success response");
            return Err(TransportError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = resp
            .bytes()
            .await
            .map_err(|e| map_reqwest_error(e, timeout))?;
        serde_json::from_slice(&bytes).map_err(TransportError::Deserialization)
    }
}

#[async_trait]
impl JsonTransport for HttpJsonClient {
    async fn get(&self, req: JsonRequest) -> Result<Value, TransportError> {
        tracing::trace!(url = %req.url, "GET");
        self.execute(self.http.get(&req.url), &req).await
    }

    async fn post(&self, req: JsonRequest, body: Value) -> Result<Value, TransportError> {
        tracing::trace!(url = %req.url, "POST");
        self.execute(self.http.post(&req.url).json(&body), &req).await
    }
}

/// Flattened query pairs for `req`, with the cache-buster token (if any)
/// computed from `now_unix`.
pub fn query_pairs(req: &JsonRequest, now_unix: i64) -> Vec<(String, String)> {
    let mut pairs = req.query_pairs();
    if let Some(buster) = req.cache_buster {
        pairs.push((CacheBuster::PARAM.to_string(), buster.token(now_unix).to_string()));
    }
    pairs
}

fn map_reqwest_error(e: reqwest::Error, timeout: Duration) -> TransportError {
    if e.is_timeout() {
        TransportError::Timeout {
            ms: timeout.as_millis() as u64,
        }
    } else {
        TransportError::Http(e.to_string())
    }
}
