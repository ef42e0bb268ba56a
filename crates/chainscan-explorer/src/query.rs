//! Provider-facing `getLogs` request shape.
//!
//! Topics go into `topic0`..`topic3` by position. The provider combines them
//! pairwise: only adjacent slots carry an operator (`topic0_1_opr`,
//! `topic1_2_opr`, `topic2_3_opr`), and this client always sends `and`.
//! There is no way to express a global OR across non-adjacent topics.

use std::str::FromStr;

use alloy_primitives::Address;

use chainscan_core::error::ExplorerError;
use chainscan_core::pagination::{FIRST_PAGE, PAGE_SIZE};
use chainscan_core::topic::{coerce_topics, LogTopic};

/// Operator sent between adjacent topic slots.
pub const TOPIC_OPERATOR: &str = "and";

/// One page request for one logical query. Advancing produces a new value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageQuery {
    pub address: Address,
    /// Zero to four topics; empty means an address-only query.
    pub topics: Vec<LogTopic>,
    pub from_block: Option<u64>,
    pub to_block: Option<u64>,
    pub page: u32,
    /// Page size (`offset` parameter).
    pub offset: usize,
}

impl PageQuery {
    /// Validate the address and topics and build the first-page query.
    ///
    /// An empty `topics` slice is allowed; one to four topics are validated
    /// strictly, and anything else fails with `InvalidTopics`.
    pub fn new<S: AsRef<str>>(address: &str, topics: &[S]) -> Result<Self, ExplorerError> {
        let address = Address::from_str(address.trim()).map_err(|_| ExplorerError::InvalidAddress {
            address: address.to_string(),
        })?;
        let topics = if topics.is_empty() {
            Vec::new()
        } else {
            coerce_topics(topics)?.into_vec()
        };
        Ok(Self {
            address,
            topics,
            from_block: None,
            to_block: None,
            page: FIRST_PAGE,
            offset: PAGE_SIZE,
        })
    }

    /// Restrict the query to an inclusive block range.
    pub fn with_block_range(mut self, from_block: Option<u64>, to_block: Option<u64>) -> Self {
        self.from_block = from_block;
        self.to_block = to_block;
        self
    }

    /// The same query addressed at `page`.
    pub fn at_page(&self, page: u32) -> Self {
        Self {
            page,
            ..self.clone()
        }
    }

    /// Query parameters for this page (without `module`/`action`/`apikey`).
    pub fn params(&self) -> Vec<(String, String)> {
        let mut params = vec![
            ("page".to_string(), self.page.to_string()),
            ("offset".to_string(), self.offset.to_string()),
            ("address".to_string(), self.address.to_checksum(None)),
        ];
        if let Some(from) = self.from_block {
            params.push(("fromBlock".to_string(), from.to_string()));
        }
        if let Some(to) = self.to_block {
            params.push(("toBlock".to_string(), to.to_string()));
        }
        for (i, topic) in self.topics.iter().enumerate() {
            params.push((format!("topic{i}"), topic.to_string()));
            if i > 0 {
                params.push((format!("topic{}_{i}_opr", i - 1), TOPIC_OPERATOR.to_string()));
            }
        }
        params
    }
}
