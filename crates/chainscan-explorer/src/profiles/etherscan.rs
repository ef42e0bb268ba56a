//! Etherscan profile.
//!
//! Rate limits: 5 calls/s on the free tier, 10–30 calls/s on paid plans.
//! <https://docs.etherscan.io/resources/rate-limits>
//!
//! The V2 endpoint serves every supported chain from one host, selected by
//! the `chainid` parameter. The legacy per-chain hosts are kept for keys that
//! predate V2.

use chainscan_core::gate::GateConfig;

use super::ExplorerProfile;
use crate::config::ExplorerConfig;

/// Free tier rate (calls per second).
pub const FREE_TIER_CALLS_PER_SEC: f64 = 5.0;

/// Multichain V2 endpoint.
pub const V2_URL: &str = "https://api.etherscan.io/v2/api";

/// Profile for the V2 endpoint on `chain_id`, free-tier budget.
pub fn profile(api_key: &str, chain_id: u64) -> ExplorerProfile {
    profile_with_rate(api_key, chain_id, FREE_TIER_CALLS_PER_SEC)
}

/// Profile for the V2 endpoint with a custom calls-per-second budget.
pub fn profile_with_rate(api_key: &str, chain_id: u64, calls_per_sec: f64) -> ExplorerProfile {
    let mut config = ExplorerConfig::new(V2_URL).with_api_key(api_key);
    config.chain_id = Some(chain_id);
    ExplorerProfile {
        name: "etherscan",
        config,
        gate: GateConfig::per_second(calls_per_sec),
    }
}

/// Profile for a legacy single-chain host, if one exists for `chain_id`.
pub fn legacy_profile(api_key: &str, chain_id: u64) -> Option<ExplorerProfile> {
    let url = legacy_url(chain_id)?;
    Some(ExplorerProfile {
        name: "etherscan-legacy",
        config: ExplorerConfig::new(url).with_api_key(api_key),
        gate: GateConfig::per_second(FREE_TIER_CALLS_PER_SEC),
    })
}

/// Legacy per-chain API host.
pub fn legacy_url(chain_id: u64) -> Option<&'static str> {
    let url = match chain_id {
        1 => "https://api.etherscan.io/api",
        11155111 => "https://api-sepolia.etherscan.io/api",
        17000 => "https://api-holesky.etherscan.io/api",
        137 => "https://api.polygonscan.com/api",
        42161 => "https://api.arbiscan.io/api",
        10 => "https://api-optimistic.etherscan.io/api",
        8453 => "https://api.basescan.org/api",
        56 => "https://api.bscscan.com/api",
        _ => return None,
    };
    Some(url)
}

/// Chains served by the V2 endpoint that this crate knows by name.
pub const CHAINS: &[(u64, &str)] = &[
    (1, "Ethereum"),
    (11155111, "Sepolia"),
    (17000, "Holesky"),
    (137, "Polygon"),
    (42161, "Arbitrum One"),
    (10, "OP Mainnet"),
    (8453, "Base"),
    (56, "BNB Smart Chain"),
    (43114, "Avalanche C-Chain"),
    (59144, "Linea"),
    (534352, "Scroll"),
];
