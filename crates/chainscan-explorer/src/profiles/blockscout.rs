//! Blockscout profile.
//!
//! Blockscout instances expose an Etherscan-compatible `/api` route
//! (`module=logs&action=getLogs`) with the same envelope and page caps.
//! An API key is optional and only raises the rate limit.

use chainscan_core::gate::GateConfig;

use super::ExplorerProfile;
use crate::config::ExplorerConfig;

/// Keyless budget (calls per second).
pub const KEYLESS_CALLS_PER_SEC: f64 = 5.0;

/// Hosted instance URL for `chain_id`, if known.
pub fn api_url(chain_id: u64) -> Option<&'static str> {
    let url = match chain_id {
        1 => "https://eth.blockscout.com/api",
        11155111 => "https://eth-sepolia.blockscout.com/api",
        10 => "https://optimism.blockscout.com/api",
        8453 => "https://base.blockscout.com/api",
        42161 => "https://arbitrum.blockscout.com/api",
        100 => "https://gnosis.blockscout.com/api",
        137 => "https://polygon.blockscout.com/api",
        _ => return None,
    };
    Some(url)
}

/// Profile for a hosted instance.
pub fn profile(chain_id: u64, api_key: Option<&str>) -> Option<ExplorerProfile> {
    api_url(chain_id).map(|url| custom(url, api_key))
}

/// Profile for a self-hosted instance at `base_url`.
pub fn custom(base_url: &str, api_key: Option<&str>) -> ExplorerProfile {
    let mut config = ExplorerConfig::new(base_url);
    config.api_key = api_key.map(str::to_owned);
    ExplorerProfile {
        name: "blockscout",
        config,
        gate: GateConfig::per_second(KEYLESS_CALLS_PER_SEC),
    }
}
