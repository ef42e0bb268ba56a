//! Request policies.
//!
//! ```text
//! every call → [RateLimiter] (inside the RequestGate) → [JsonTransport]
//! failed page → caller → [RetryPolicy] → RetryableError::retry()
//! ```

pub mod rate_limiter;
pub mod retry;

pub use rate_limiter::{RateLimiter, RateLimiterConfig, TokenBucket};
pub use retry::{RetryConfig, RetryPolicy};
