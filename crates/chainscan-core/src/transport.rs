//! The `JsonTransport` trait — the generic JSON GET/POST primitive every
//! explorer call eventually goes through.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::TransportError;

/// A query-string value. `Many` expands to repeated `key=value` pairs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QueryValue {
    One(String),
    Many(Vec<String>),
}

impl From<String> for QueryValue {
    fn from(s: String) -> Self {
        Self::One(s)
    }
}

impl From<&str> for QueryValue {
    fn from(s: &str) -> Self {
        Self::One(s.to_owned())
    }
}

impl From<Vec<String>> for QueryValue {
    fn from(v: Vec<String>) -> Self {
        Self::Many(v)
    }
}

/// Granularity of the cache-busting timestamp appended to a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheBuster {
    Minute,
    Hour,
}

impl CacheBuster {
    /// Query parameter that carries the token.
    pub const PARAM: &'static str = "_cb";

    /// Truncate a unix timestamp (seconds) to this granularity.
    pub fn token(self, unix_secs: i64) -> i64 {
        let step = match self {
            Self::Minute => 60,
            Self::Hour => 3_600,
        };
        unix_secs - unix_secs.rem_euclid(step)
    }
}

/// A JSON request over HTTP.
#[derive(Debug, Clone, Default)]
pub struct JsonRequest {
    pub url: String,
    pub params: Vec<(String, QueryValue)>,
    pub headers: Vec<(String, String)>,
    pub cache_buster: Option<CacheBuster>,
    /// Per-call timeout; `None` uses the transport default.
    pub timeout: Option<Duration>,
}

impl JsonRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    /// Append a query parameter.
    pub fn param(mut self, key: impl Into<String>, value: impl Into<QueryValue>) -> Self {
        self.params.push((key.into(), value.into()));
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn cache_buster(mut self, buster: Option<CacheBuster>) -> Self {
        self.cache_buster = buster;
        self
    }

    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Flatten params into ordered `(key, value)` pairs, expanding array
    /// values into one pair per element.
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::with_capacity(self.params.len());
        for (key, value) in &self.params {
            match value {
                QueryValue::One(v) => pairs.push((key.clone(), v.clone())),
                QueryValue::Many(vs) => {
                    pairs.extend(vs.iter().map(|v| (key.clone(), v.clone())));
                }
            }
        }
        pairs
    }

    /// Value of the first parameter named `key`, if any.
    pub fn param_value(&self, key: &str) -> Option<&str> {
        self.params.iter().find_map(|(k, v)| match v {
            QueryValue::One(s) if k == key => Some(s.as_str()),
            _ => None,
        })
    }
}

/// The JSON-over-HTTP primitive.
///
/// # Thread Safety
/// Implementations must be `Send + Sync` so one instance can be shared by
/// every query behind an `Arc`.
#[async_trait]
pub trait JsonTransport: Send + Sync + 'static {
    /// Issue a GET and decode the body as JSON.
    async fn get(&self, req: JsonRequest) -> Result<Value, TransportError>;

    /// Issue a POST with a JSON body and decode the response as JSON.
    async fn post(&self, req: JsonRequest, body: Value) -> Result<Value, TransportError>;
}
