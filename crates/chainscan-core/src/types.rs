//! Domain types shared by every layer.

use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};

use crate::topic::LogTopicSet;

/// A normalized on-chain event record decoded from a provider page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Log {
    /// Emitting contract.
    pub address: Address,
    /// Indexed topics, topic0 first.
    pub topics: LogTopicSet,
    /// Opaque `0x`-prefixed data payload.
    pub data: String,
    /// Block height. Wide integer so large heights never lose precision.
    pub block_number: U256,
    pub block_hash: String,
    /// Unix timestamp of the block (seconds).
    pub timestamp: u64,
    pub log_index: u64,
    pub transaction_hash: String,
    pub transaction_index: u64,
}

impl Log {
    /// `(block_number, log_index)`, the on-chain ordering key.
    pub fn position(&self) -> (U256, u64) {
        (self.block_number, self.log_index)
    }
}
