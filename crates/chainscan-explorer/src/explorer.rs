//! `BlockExplorer` — the public entry point for log queries.

use std::sync::Arc;

use thiserror::Error;

use chainscan_core::error::ExplorerError;
use chainscan_core::gate::RequestGate;
use chainscan_core::pagination::{paginate, Page, PageFetcher, RetryableError};
use chainscan_core::types::Log;

use crate::config::ExplorerConfig;
use crate::fetch::LogPageFetcher;
use crate::query::PageQuery;

/// Why `get_logs` returned no page.
#[derive(Debug, Error)]
pub enum QueryError {
    /// The address or topics were rejected before any request was made.
    #[error(transparent)]
    Invalid(#[from] ExplorerError),

    /// The first page failed; call `retry()` to request it again.
    #[error(transparent)]
    Retryable(#[from] RetryableError<Log>),
}

impl QueryError {
    /// Take the resumable error, if this failure has one.
    pub fn into_retryable(self) -> Option<RetryableError<Log>> {
        match self {
            Self::Retryable(e) => Some(e),
            Self::Invalid(_) => None,
        }
    }
}

/// Client for one Etherscan-style explorer endpoint.
///
/// Every request goes through the shared [`RequestGate`]; several explorers
/// (or several queries on one explorer) can share one gate to stay inside a
/// single request budget.
#[derive(Clone)]
pub struct BlockExplorer {
    gate: Arc<RequestGate>,
    config: Arc<ExplorerConfig>,
}

impl BlockExplorer {
    pub fn new(gate: Arc<RequestGate>, config: ExplorerConfig) -> Self {
        Self {
            gate,
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &ExplorerConfig {
        &self.config
    }

    /// Logs emitted by `address`, filtered by zero to four topics, as a
    /// resumable cursor starting at page one.
    pub async fn get_logs<S: AsRef<str>>(
        &self,
        address: &str,
        topics: &[S],
    ) -> Result<Page<Log>, QueryError> {
        let query = PageQuery::new(address, topics)?;
        self.run(query).await
    }

    /// Like [`get_logs`](Self::get_logs), restricted to an inclusive block range.
    pub async fn get_logs_between<S: AsRef<str>>(
        &self,
        address: &str,
        topics: &[S],
        from_block: Option<u64>,
        to_block: Option<u64>,
    ) -> Result<Page<Log>, QueryError> {
        let query = PageQuery::new(address, topics)?.with_block_range(from_block, to_block);
        self.run(query).await
    }

    /// Start an already-built query.
    pub async fn run(&self, query: PageQuery) -> Result<Page<Log>, QueryError> {
        tracing::debug!(
            address = %query.address,
            topics = query.topics.len(),
            from_block = ?query.from_block,
            to_block = ?query.to_block,
            "starting log query"
        );
        let fetcher: Arc<dyn PageFetcher<Item = Log>> = Arc::new(LogPageFetcher::new(
            Arc::clone(&self.gate),
            Arc::clone(&self.config),
            query,
        ));
        Ok(paginate(fetcher).await?)
    }
}

impl std::fmt::Debug for BlockExplorer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlockExplorer")
            .field("base_url", &self.config.base_url)
            .field("chain_id", &self.config.chain_id)
            .finish()
    }
}
