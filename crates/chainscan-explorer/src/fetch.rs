//! Per-query page fetcher: one gated `getLogs` call per page.

use std::sync::Arc;

use async_trait::async_trait;

use chainscan_core::error::ExplorerError;
use chainscan_core::gate::RequestGate;
use chainscan_core::pagination::PageFetcher;
use chainscan_core::transport::{JsonRequest, JsonTransport};
use chainscan_core::types::Log;

use crate::config::ExplorerConfig;
use crate::query::PageQuery;
use crate::response::decode_logs;

/// Fetches pages of one logical `getLogs` query.
pub struct LogPageFetcher {
    gate: Arc<RequestGate>,
    config: Arc<ExplorerConfig>,
    query: PageQuery,
}

impl LogPageFetcher {
    pub fn new(gate: Arc<RequestGate>, config: Arc<ExplorerConfig>, query: PageQuery) -> Self {
        Self {
            gate,
            config,
            query,
        }
    }

    /// The HTTP request for `page`.
    pub fn request(&self, page: u32) -> JsonRequest {
        let mut req = JsonRequest::new(self.config.base_url.clone())
            .cache_buster(self.config.cache_buster)
            .timeout(self.config.request_timeout);
        if let Some(chain_id) = self.config.chain_id {
            req = req.param("chainid", chain_id.to_string());
        }
        req = req.param("module", "logs").param("action", "getLogs");
        if let Some(key) = &self.config.api_key {
            req = req.param("apikey", key.as_str());
        }
        for (key, value) in self.query.at_page(page).params() {
            req = req.param(key, value);
        }
        req
    }
}

#[async_trait]
impl PageFetcher for LogPageFetcher {
    type Item = Log;

    async fn fetch_page(&self, page: u32) -> Result<Vec<Log>, ExplorerError> {
        tracing::debug!(
            address = %self.query.address,
            topics = self.query.topics.len(),
            page,
            "requesting logs page"
        );
        let body = self.gate.get(self.request(page)).await?;
        decode_logs(body)
    }
}
