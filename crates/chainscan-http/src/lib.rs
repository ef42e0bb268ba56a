//! chainscan-http — `reqwest` implementation of the ChainScan JSON transport.

pub mod client;

pub use client::{HttpClientConfig, HttpJsonClient};
