//! Token bucket request budget.
//!
//! Tokens accrue at `refill_rate` per second up to `capacity`; every outbound
//! explorer call spends one. Explorer APIs publish their limits as "N calls
//! per second", so the default bucket holds one second's worth of calls.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use crate::error::TransportError;

/// Token bucket configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateLimiterConfig {
    /// Maximum burst size (tokens).
    pub capacity: f64,
    /// Tokens added per second.
    pub refill_rate: f64,
}

impl RateLimiterConfig {
    /// `n` calls per second with a burst of `n`, never less than one call.
    pub fn per_second(n: f64) -> Self {
        Self {
            capacity: n.max(1.0),
            refill_rate: n,
        }
    }

    /// Rejects budgets that could never admit a request.
    pub fn validate(&self) -> Result<(), TransportError> {
        if !self.refill_rate.is_finite() || self.refill_rate <= 0.0 {
            return Err(TransportError::Config(format!(
                "refill rate must be a positive number of calls per second, got {}",
                self.refill_rate
            )));
        }
        if self.capacity.is_nan() || self.capacity == f64::INFINITY {
            return Err(TransportError::Config(format!(
                "bucket capacity must be finite, got {}",
                self.capacity
            )));
        }
        Ok(())
    }
}

impl Default for RateLimiterConfig {
    fn default() -> Self {
        // Etherscan free tier: 5 calls/s
        Self::per_second(5.0)
    }
}

struct BucketState {
    tokens: f64,
    last_refill: Instant,
}

/// Thread-safe token bucket.
pub struct TokenBucket {
    config: RateLimiterConfig,
    state: Mutex<BucketState>,
}

impl TokenBucket {
    pub fn new(config: RateLimiterConfig) -> Self {
        Self {
            state: Mutex::new(BucketState {
                tokens: config.capacity,
                last_refill: Instant::now(),
            }),
            config,
        }
    }

    /// Take `cost` tokens if available.
    pub fn try_acquire(&self, cost: f64) -> bool {
        let mut state = self.lock();
        self.refill(&mut state);

        if state.tokens >= cost {
            state.tokens -= cost;
            true
        } else {
            false
        }
    }

    /// Estimated wait before `cost` tokens are available.
    pub fn wait_time(&self, cost: f64) -> Duration {
        let mut state = self.lock();
        self.refill(&mut state);
        let deficit = cost - state.tokens;
        if deficit <= 0.0 {
            Duration::ZERO
        } else if self.config.refill_rate <= 0.0 {
            Duration::MAX
        } else {
            Duration::try_from_secs_f64(deficit / self.config.refill_rate).unwrap_or(Duration::MAX)
        }
    }

    /// Currently available tokens.
    pub fn available(&self) -> f64 {
        let mut state = self.lock();
        self.refill(&mut state);
        state.tokens
    }

    fn lock(&self) -> MutexGuard<'_, BucketState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn refill(&self, state: &mut BucketState) {
        let now = Instant::now();
        let elapsed = now.duration_since(state.last_refill).as_secs_f64();
        state.tokens = (state.tokens + elapsed * self.config.refill_rate).min(self.config.capacity);
        state.last_refill = now;
    }
}

/// Per-request rate limiter over a [`TokenBucket`].
pub struct RateLimiter {
    bucket: TokenBucket,
    /// Tokens spent per request.
    pub cost: f64,
}

impl RateLimiter {
    /// Build a limiter charging one token per request. The bucket always
    /// holds at least one request's worth of tokens.
    pub fn new(config: RateLimiterConfig) -> Result<Self, TransportError> {
        config.validate()?;
        let cost = 1.0;
        let config = RateLimiterConfig {
            capacity: config.capacity.max(cost),
            ..config
        };
        Ok(Self {
            bucket: TokenBucket::new(config),
            cost,
        })
    }

    /// Try to spend one request's worth of tokens.
    pub fn try_acquire(&self) -> bool {
        self.bucket.try_acquire(self.cost)
    }

    /// Wait time before one request's worth of tokens is available.
    pub fn wait_time(&self) -> Duration {
        self.bucket.wait_time(self.cost)
    }

    /// Sleep until a token can be spent, then spend it.
    pub async fn until_ready(&self) {
        while !self.try_acquire() {
            let wait = self.wait_time().max(Duration::from_millis(1));
            tracing::debug!(wait_ms = wait.as_millis() as u64, "request budget exhausted, waiting");
            tokio::time::sleep(wait).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acquire_within_capacity() {
        let rl = RateLimiter::new(RateLimiterConfig {
            capacity: 5.0,
            refill_rate: 1.0,
        })
        .unwrap();
        for _ in 0..5 {
            assert!(rl.try_acquire(), "should succeed within capacity");
        }
    }

    #[test]
    fn reject_when_empty() {
        let rl = RateLimiter::new(RateLimiterConfig {
            capacity: 2.0,
            refill_rate: 0.0001,
        })
        .unwrap();
        assert!(rl.try_acquire());
        assert!(rl.try_acquire());
        assert!(!rl.try_acquire(), "should be rate limited");
    }

    #[test]
    fn wait_time_when_empty() {
        let rl = RateLimiter::new(RateLimiterConfig::per_second(10.0)).unwrap();
        while rl.try_acquire() {}
        let wait = rl.wait_time();
        // ~100ms: one token at 10 tokens/s
        assert!(wait.as_millis() <= 120, "unexpected wait time: {wait:?}");
        assert!(wait > Duration::ZERO);
    }

    #[test]
    fn zero_refill_never_becomes_ready() {
        let bucket = TokenBucket::new(RateLimiterConfig {
            capacity: 1.0,
            refill_rate: 0.0,
        });
        assert!(bucket.try_acquire(1.0));
        assert_eq!(bucket.wait_time(1.0), Duration::MAX);
    }

    #[tokio::test(start_paused = true)]
    async fn until_ready_waits_for_refill() {
        let rl = RateLimiter::new(RateLimiterConfig {
            capacity: 1.0,
            refill_rate: 50.0,
        })
        .unwrap();
        rl.until_ready().await;
        let start = Instant::now();
        rl.until_ready().await;
        assert!(start.elapsed() >= Duration::from_millis(10));
    }

    #[test]
    fn unusable_refill_rates_are_rejected() {
        for rate in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let err = RateLimiter::new(RateLimiterConfig::per_second(rate)).err();
            assert!(
                matches!(err, Some(TransportError::Config(_))),
                "rate {rate} should be rejected"
            );
        }
    }

    #[test]
    fn tiny_refill_reports_a_bounded_wait() {
        let bucket = TokenBucket::new(RateLimiterConfig {
            capacity: 1.0,
            refill_rate: 1e-300,
        });
        assert!(bucket.try_acquire(1.0));
        assert_eq!(bucket.wait_time(1.0), Duration::MAX);
    }

    #[tokio::test(start_paused = true)]
    async fn sub_one_rate_still_admits() {
        let rl = RateLimiter::new(RateLimiterConfig::per_second(0.5)).unwrap();
        let start = Instant::now();
        rl.until_ready().await;
        assert_eq!(start.elapsed(), Duration::ZERO);

        rl.until_ready().await;
        let waited = start.elapsed();
        assert!(waited >= Duration::from_secs(2), "waited {waited:?}");
        assert!(waited < Duration::from_secs(3), "waited {waited:?}");
    }
}
