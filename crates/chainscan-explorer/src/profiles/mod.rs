//! Pre-configured explorer profiles.
//!
//! Each profile knows an explorer's endpoint and its published request
//! budget. Build a [`BlockExplorer`] from one with [`ExplorerProfile::connect`]
//! (own gate) or [`ExplorerProfile::connect_shared`] (gate shared with other
//! explorers).
//!
//! # Quick start
//! ```rust,no_run
//! use chainscan_explorer::profiles::etherscan;
//!
//! let explorer = etherscan::profile("YOUR_API_KEY", 1).http_explorer()?;
//! # Ok::<(), chainscan_core::TransportError>(())
//! ```

pub mod blockscout;
pub mod etherscan;

use std::sync::Arc;

use chainscan_core::error::TransportError;
use chainscan_core::gate::{GateConfig, RequestGate};
use chainscan_core::transport::JsonTransport;
use chainscan_http::{HttpClientConfig, HttpJsonClient};

use crate::config::ExplorerConfig;
use crate::explorer::BlockExplorer;

/// Endpoint configuration plus the admission policy it should run under.
#[derive(Debug, Clone)]
pub struct ExplorerProfile {
    pub name: &'static str,
    pub config: ExplorerConfig,
    pub gate: GateConfig,
}

impl ExplorerProfile {
    /// Build an explorer with its own gate over `transport`.
    pub fn connect(self, transport: Arc<dyn JsonTransport>) -> Result<BlockExplorer, TransportError> {
        let gate = Arc::new(RequestGate::new(transport, self.gate)?);
        Ok(BlockExplorer::new(gate, self.config))
    }

    /// Build an explorer on an existing gate; the profile's own budget is
    /// ignored in favour of the shared one.
    pub fn connect_shared(self, gate: Arc<RequestGate>) -> BlockExplorer {
        BlockExplorer::new(gate, self.config)
    }

    /// Build an explorer over a fresh `reqwest` client.
    pub fn http_explorer(self) -> Result<BlockExplorer, TransportError> {
        let mut http = HttpClientConfig::default();
        if let Some(timeout) = self.config.request_timeout {
            http.request_timeout = timeout;
        }
        let client = HttpJsonClient::new(http)?;
        self.connect(Arc::new(client))
    }
}
