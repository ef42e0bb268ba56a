//! Explorer endpoint configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use chainscan_core::transport::CacheBuster;

/// Where and how to reach one block-explorer API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExplorerConfig {
    /// API endpoint, e.g. `"https://api.etherscan.io/v2/api"`.
    pub base_url: String,
    #[serde(default)]
    pub api_key: Option<String>,
    /// Sent as `chainid` for multichain endpoints; `None` for single-chain ones.
    #[serde(default)]
    pub chain_id: Option<u64>,
    #[serde(default)]
    pub cache_buster: Option<CacheBuster>,
    /// Per-request timeout; `None` uses the transport default.
    #[serde(default)]
    pub request_timeout: Option<Duration>,
}

impl ExplorerConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: None,
            chain_id: None,
            cache_buster: None,
            request_timeout: None,
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }
}
