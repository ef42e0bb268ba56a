//! Explorer response envelope and raw log decoding.
//!
//! Every explorer answer is `{ status, message, result }` with HTTP 200, even
//! for failures: `status: "0"` marks a logical failure and `result` may then
//! be a string, an object or anything else.

use std::str::FromStr;

use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use chainscan_core::error::ExplorerError;
use chainscan_core::topic::coerce_topics;
use chainscan_core::types::Log;

/// Message the provider sends with `status: "0"` for an empty result set.
const NO_RECORDS: &str = "No records found";

/// The `{ status, message, result }` envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse {
    pub status: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub result: Value,
}

impl ApiResponse {
    pub fn is_ok(&self) -> bool {
        self.status == "1"
    }

    /// Provider-reported failure message: `"<message>: <result>"` when
    /// `result` is a non-empty string, `<message>` otherwise.
    pub fn failure_message(&self) -> String {
        match &self.result {
            Value::String(detail) if !detail.is_empty() => format!("{}: {detail}", self.message),
            _ => self.message.clone(),
        }
    }

    /// `status: "0"` with an empty array and the "no records" message is how
    /// the provider answers a page past the end of the data.
    fn is_empty_result(&self) -> bool {
        self.message.starts_with(NO_RECORDS)
            && matches!(&self.result, Value::Array(rows) if rows.is_empty())
    }

    /// Check the status and hand back `result`.
    ///
    /// Every `status: "0"` is an [`ExplorerError::Provider`] failure with one
    /// exception: `"No records found"` with an empty `result` array is how
    /// explorers answer a query with no matches, so it comes back as an
    /// empty list and ends pagination instead of producing a retryable error.
    pub fn into_result(self) -> Result<Value, ExplorerError> {
        if self.is_ok() {
            return Ok(self.result);
        }
        if self.status == "0" {
            if self.is_empty_result() {
                return Ok(Value::Array(Vec::new()));
            }
            return Err(ExplorerError::Provider {
                message: self.failure_message(),
            });
        }
        Err(ExplorerError::Decode(format!(
            "unexpected status '{}' ({})",
            self.status, self.message
        )))
    }
}

/// A log as the explorer returns it: every numeric field is a hex string.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawLog {
    pub address: String,
    /// Blockscout pads unused slots with `null`.
    pub topics: Vec<Option<String>>,
    pub data: String,
    pub block_number: String,
    #[serde(default)]
    pub block_hash: String,
    #[serde(rename = "timeStamp")]
    pub time_stamp: String,
    #[serde(default)]
    pub gas_price: Option<String>,
    #[serde(default)]
    pub gas_used: Option<String>,
    pub log_index: String,
    pub transaction_hash: String,
    pub transaction_index: String,
}

impl RawLog {
    /// Normalize into a domain [`Log`].
    pub fn into_log(self) -> Result<Log, ExplorerError> {
        let address = Address::from_str(&self.address)
            .map_err(|_| ExplorerError::Decode(format!("bad address '{}'", self.address)))?;
        let topics = coerce_topics(&present_topics(&self.topics)?)
            .map_err(|e| ExplorerError::Decode(format!("bad topics: {e}")))?;
        Ok(Log {
            address,
            topics,
            data: self.data,
            block_number: parse_u256(&self.block_number)
                .ok_or_else(|| bad_field("blockNumber", &self.block_number))?,
            block_hash: self.block_hash,
            timestamp: parse_u64(&self.time_stamp)
                .ok_or_else(|| bad_field("timeStamp", &self.time_stamp))?,
            log_index: parse_u64(&self.log_index)
                .ok_or_else(|| bad_field("logIndex", &self.log_index))?,
            transaction_hash: self.transaction_hash,
            transaction_index: parse_u64(&self.transaction_index)
                .ok_or_else(|| bad_field("transactionIndex", &self.transaction_index))?,
        })
    }
}

/// Decode one explorer response body into logs.
///
/// A malformed row fails the whole page; rows are never skipped.
pub fn decode_logs(body: Value) -> Result<Vec<Log>, ExplorerError> {
    let envelope: ApiResponse = serde_json::from_value(body)
        .map_err(|e| ExplorerError::Decode(format!("unexpected response shape: {e}")))?;
    let result = envelope.into_result()?;
    let raw: Vec<RawLog> = serde_json::from_value(result)
        .map_err(|e| ExplorerError::Decode(format!("unexpected log shape: {e}")))?;
    raw.into_iter()
        .enumerate()
        .map(|(i, r)| {
            r.into_log().map_err(|e| match e {
                ExplorerError::Decode(msg) => ExplorerError::Decode(format!("log #{i}: {msg}")),
                other => other,
            })
        })
        .collect()
}

/// Topic slots with trailing `null` padding removed. A `null` slot followed
/// by a real topic cannot be represented and fails the row.
fn present_topics(slots: &[Option<String>]) -> Result<Vec<&str>, ExplorerError> {
    let used = slots.iter().rposition(Option::is_some).map_or(0, |last| last + 1);
    slots[..used]
        .iter()
        .enumerate()
        .map(|(i, slot)| {
            slot.as_deref()
                .ok_or_else(|| ExplorerError::Decode(format!("topic{i} is null but a later topic is set")))
        })
        .collect()
}

fn bad_field(name: &str, value: &str) -> ExplorerError {
    ExplorerError::Decode(format!("bad {name} '{value}'"))
}

/// Parse a `0x` hex quantity (bare `0x` is zero) or a decimal string.
pub fn parse_u64(s: &str) -> Option<u64> {
    match s.strip_prefix("0x") {
        Some("") => Some(0),
        Some(hex) => u64::from_str_radix(hex, 16).ok(),
        None => s.parse().ok(),
    }
}

/// Like [`parse_u64`], into a 256-bit integer.
pub fn parse_u256(s: &str) -> Option<U256> {
    match s.strip_prefix("0x") {
        Some("") => Some(U256::ZERO),
        Some(hex) => U256::from_str_radix(hex, 16).ok(),
        None => U256::from_str_radix(s, 10).ok(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const TRANSFER: &str = "0xddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef";

    fn raw_log(block_number: &str) -> Value {
        json!({
            "address": "0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48",
            "topics": [
                TRANSFER,
                "0x0000000000000000000000004838b106fce9647bdf1e7877bf73ce8b0bad5f97"
            ],
            "data": "0x00000000000000000000000000000000000000000000000000000000000f4240",
            "blockNumber": block_number,
            "blockHash": "0x8d2bd8d1f6c9e6a7a8e6a1c3a2b0b1b3a4c2e5f1e2d3c4b5a6978877665544ff",
            "timeStamp": "0x65a8c9b3",
            "gasPrice": "0x3b9aca00",
            "gasUsed": "0xb411",
            "logIndex": "0x",
            "transactionHash": "0x1f2e3d4c5b6a79881f2e3d4c5b6a79881f2e3d4c5b6a79881f2e3d4c5b6a7988",
            "transactionIndex": "0x1c"
        })
    }

    #[test]
    fn failure_message_with_string_result() {
        let body = json!({ "status": "0", "message": "NOTOK", "result": "Query Timeout" });
        let err = decode_logs(body).unwrap_err();
        assert!(matches!(&err, ExplorerError::Provider { .. }));
        assert_eq!(err.to_string(), "NOTOK: Query Timeout");
    }

    #[test]
    fn failure_message_with_non_string_result() {
        let body = json!({ "status": "0", "message": "NOTOK", "result": {} });
        assert_eq!(decode_logs(body).unwrap_err().to_string(), "NOTOK");

        let body = json!({ "status": "0", "message": "NOTOK", "result": "" });
        assert_eq!(decode_logs(body).unwrap_err().to_string(), "NOTOK");

        let body = json!({ "status": "0", "message": "NOTOK" });
        assert_eq!(decode_logs(body).unwrap_err().to_string(), "NOTOK");
    }

    #[test]
    fn no_records_is_an_empty_page() {
        let body = json!({ "status": "0", "message": "No records found", "result": [] });
        assert!(decode_logs(body).unwrap().is_empty());
    }

    #[test]
    fn decodes_log_fields() {
        let body = json!({ "status": "1", "message": "OK", "result": [raw_log("0x12a05f200")] });
        let logs = decode_logs(body).unwrap();
        assert_eq!(logs.len(), 1);
        let log = &logs[0];
        assert_eq!(log.block_number, U256::from(5_000_000_000u64));
        assert_eq!(log.timestamp, 0x65a8c9b3);
        assert_eq!(log.log_index, 0);
        assert_eq!(log.transaction_index, 28);
        assert_eq!(log.topics.len(), 2);
        assert_eq!(log.topics.topic0().as_str(), TRANSFER);
    }

    #[test]
    fn block_numbers_beyond_f64_precision() {
        // 2^53 + 1 cannot be represented by an f64.
        let n: u64 = (1 << 53) + 1;
        let body = json!({ "status": "1", "message": "OK", "result": [raw_log(&format!("{n:#x}"))] });
        let logs = decode_logs(body).unwrap();
        assert_eq!(logs[0].block_number, U256::from(n));
        assert_eq!(logs[0].block_number.to_string(), n.to_string());

        let huge = "0xffffffffffffffffffffffffffffffff";
        let body = json!({ "status": "1", "message": "OK", "result": [raw_log(huge)] });
        let logs = decode_logs(body).unwrap();
        assert_eq!(logs[0].block_number, U256::from(u128::MAX));
    }

    #[test]
    fn malformed_topic_fails_the_page() {
        let mut bad = raw_log("0x1");
        bad["topics"] = json!(["0xdeadbeef"]);
        let body = json!({ "status": "1", "message": "OK", "result": [raw_log("0x1"), bad] });
        let err = decode_logs(body).unwrap_err();
        assert!(matches!(&err, ExplorerError::Decode(msg) if msg.starts_with("log #1")), "{err}");

        let mut empty = raw_log("0x1");
        empty["topics"] = json!([]);
        let body = json!({ "status": "1", "message": "OK", "result": [empty] });
        assert!(matches!(decode_logs(body), Err(ExplorerError::Decode(_))));
    }

    #[test]
    fn null_padded_topic_slots() {
        let mut row = raw_log("0x1");
        row["topics"] = json!([TRANSFER, null, null, null]);
        let body = json!({ "status": "1", "message": "OK", "result": [row] });
        let logs = decode_logs(body).unwrap();
        assert_eq!(logs[0].topics.len(), 1);
        assert_eq!(logs[0].topics.topic0().as_str(), TRANSFER);

        let mut gap = raw_log("0x1");
        gap["topics"] = json!([TRANSFER, null, TRANSFER, null]);
        let body = json!({ "status": "1", "message": "OK", "result": [gap] });
        let err = decode_logs(body).unwrap_err();
        assert!(
            matches!(&err, ExplorerError::Decode(msg) if msg.contains("topic1 is null")),
            "{err}"
        );

        let mut all_null = raw_log("0x1");
        all_null["topics"] = json!([null, null, null, null]);
        let body = json!({ "status": "1", "message": "OK", "result": [all_null] });
        assert!(matches!(decode_logs(body), Err(ExplorerError::Decode(_))));
    }

    #[test]
    fn unexpected_shapes_are_decode_errors() {
        assert!(matches!(decode_logs(json!("oops")), Err(ExplorerError::Decode(_))));
        let body = json!({ "status": "1", "message": "OK", "result": "not a list" });
        assert!(matches!(decode_logs(body), Err(ExplorerError::Decode(_))));
    }

    #[test]
    fn quantity_parsing() {
        assert_eq!(parse_u64("0x"), Some(0));
        assert_eq!(parse_u64("0xff"), Some(255));
        assert_eq!(parse_u64("1234"), Some(1234));
        assert_eq!(parse_u64("0xzz"), None);
        assert_eq!(parse_u256("0x"), Some(U256::ZERO));
        assert_eq!(parse_u256("18446744073709551616"), Some(U256::from(u64::MAX) + U256::from(1)));
    }
}
