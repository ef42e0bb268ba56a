//! chainscan-explorer — event logs from Etherscan-style block explorers.
//!
//! [`BlockExplorer::get_logs`] validates the address and topics, then hands
//! back the first page of results as a cursor. Each page is one rate-gated
//! `getLogs` call; the cursor stops at the provider's 10 000-row cap, and a
//! failed page can be retried in place without refetching earlier pages.
//!
//! # Quick start
//! ```rust,no_run
//! use chainscan_explorer::profiles::etherscan;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let explorer = etherscan::profile("YOUR_API_KEY", 1).http_explorer()?;
//! let transfer = "0xddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef";
//!
//! let mut page = explorer
//!     .get_logs("0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48", &[transfer])
//!     .await?;
//! loop {
//!     println!("page {}: {} logs", page.page, page.items.len());
//!     match page.next.take() {
//!         Some(next) => page = next.resume().await?,
//!         None => break,
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod explorer;
pub mod fetch;
pub mod profiles;
pub mod query;
pub mod response;

pub use config::ExplorerConfig;
pub use explorer::{BlockExplorer, QueryError};
pub use fetch::LogPageFetcher;
pub use profiles::ExplorerProfile;
pub use query::PageQuery;
pub use response::{decode_logs, ApiResponse, RawLog};
