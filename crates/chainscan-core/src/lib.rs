//! chainscan-core — foundation types for ChainScan.
//!
//! # Overview
//!
//! ChainScan pulls contract event logs out of Etherscan-style block-explorer
//! APIs. The core crate defines:
//!
//! - [`topic`] — log topic validation ([`coerce_topics`], [`LogTopicSet`])
//! - [`Log`] — the normalized event record
//! - [`JsonTransport`] — the JSON GET/POST primitive every call goes through
//! - [`RequestGate`] — the shared, rate-limited admission queue
//! - [`pagination`] — the capped, resumable page cursor ([`Page`],
//!   [`RetryableError`])
//! - [`policy`] module — token bucket and caller-side backoff
//! - [`TransportError`] / [`ExplorerError`] — structured error types

pub mod error;
pub mod gate;
pub mod pagination;
pub mod policy;
pub mod topic;
pub mod transport;
pub mod types;

pub use error::{ExplorerError, TransportError};
pub use gate::{GateConfig, RequestGate};
pub use pagination::{
    paginate, Continuation, Page, PageFetcher, RetryableError, FIRST_PAGE, LAST_PAGE, MAX_PAGES,
    MAX_RESULTS, PAGE_SIZE,
};
pub use topic::{coerce_topics, is_log_topic, is_log_topic_set, LogTopic, LogTopicSet};
pub use transport::{CacheBuster, JsonRequest, JsonTransport, QueryValue};
pub use types::Log;
