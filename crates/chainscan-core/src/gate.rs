//! Rate-limited request gate — one shared admission queue in front of the
//! JSON transport.
//!
//! Every call from every query waits its turn in a FIFO queue, spends one
//! token from the request budget, then takes an in-flight slot for the
//! duration of the HTTP call. The gate only ever delays a request; it never
//! drops or fails one on its own.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::{Mutex, OwnedSemaphorePermit, Semaphore};

use crate::error::TransportError;
use crate::policy::{RateLimiter, RateLimiterConfig};
use crate::transport::{JsonRequest, JsonTransport};

/// Admission policy for a [`RequestGate`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateConfig {
    /// Request budget; `None` disables rate limiting.
    #[serde(default)]
    pub rate: Option<RateLimiterConfig>,
    /// Maximum concurrent requests; `None` means unbounded.
    #[serde(default)]
    pub max_in_flight: Option<usize>,
}

impl GateConfig {
    /// A gate that admits everything immediately.
    pub fn unlimited() -> Self {
        Self {
            rate: None,
            max_in_flight: None,
        }
    }

    /// `n` requests per second, unbounded concurrency.
    pub fn per_second(n: f64) -> Self {
        Self {
            rate: Some(RateLimiterConfig::per_second(n)),
            max_in_flight: None,
        }
    }

    pub fn with_max_in_flight(mut self, n: usize) -> Self {
        self.max_in_flight = Some(n);
        self
    }

    /// Replace the request budget with `n` per second, keeping concurrency.
    pub fn with_rate(mut self, n: f64) -> Self {
        self.rate = Some(RateLimiterConfig::per_second(n));
        self
    }
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            rate: Some(RateLimiterConfig::default()),
            max_in_flight: None,
        }
    }
}

/// Shared admission queue wrapping a [`JsonTransport`].
///
/// Construct once and hand out `Arc<RequestGate>` clones to every explorer
/// that must share the same outbound budget.
pub struct RequestGate {
    inner: Arc<dyn JsonTransport>,
    limiter: Option<RateLimiter>,
    slots: Option<Arc<Semaphore>>,
    queue: Mutex<()>,
    admitted: AtomicU64,
}

impl RequestGate {
    /// Fails with [`TransportError::Config`] when the rate budget could
    /// never admit a request.
    pub fn new(inner: Arc<dyn JsonTransport>, config: GateConfig) -> Result<Self, TransportError> {
        let limiter = config.rate.map(RateLimiter::new).transpose()?;
        Ok(Self::build(inner, limiter, config.max_in_flight))
    }

    /// Gate that never delays; handy for tests and single-shot tools.
    pub fn unlimited(inner: Arc<dyn JsonTransport>) -> Self {
        Self::build(inner, None, None)
    }

    fn build(
        inner: Arc<dyn JsonTransport>,
        limiter: Option<RateLimiter>,
        max_in_flight: Option<usize>,
    ) -> Self {
        Self {
            inner,
            limiter,
            slots: max_in_flight.map(|n| Arc::new(Semaphore::new(n.max(1)))),
            queue: Mutex::new(()),
            admitted: AtomicU64::new(0),
        }
    }

    /// Total number of requests admitted so far.
    pub fn admitted(&self) -> u64 {
        self.admitted.load(Ordering::Relaxed)
    }

    /// GET through the gate and deserialize the body.
    pub async fn get_json<T: DeserializeOwned>(&self, req: JsonRequest) -> Result<T, TransportError> {
        let value = self.get(req).await?;
        serde_json::from_value(value).map_err(TransportError::Deserialization)
    }

    /// POST through the gate and deserialize the body.
    pub async fn post_json<T: DeserializeOwned>(
        &self,
        req: JsonRequest,
        body: Value,
    ) -> Result<T, TransportError> {
        let value = self.post(req, body).await?;
        serde_json::from_value(value).map_err(TransportError::Deserialization)
    }

    /// Wait for this caller's turn. The returned permit (if any) must be held
    /// until the HTTP call completes.
    async fn admit(&self) -> Result<Option<OwnedSemaphorePermit>, TransportError> {
        let _turn = self.queue.lock().await;
        if let Some(limiter) = &self.limiter {
            limiter.until_ready().await;
        }
        let permit = match &self.slots {
            Some(slots) => Some(
                Arc::clone(slots)
                    .acquire_owned()
                    .await
                    .map_err(|_| TransportError::Other("request gate closed".into()))?,
            ),
            None => None,
        };
        let n = self.admitted.fetch_add(1, Ordering::Relaxed) + 1;
        tracing::trace!(admitted = n, "request admitted");
        Ok(permit)
    }
}

#[async_trait]
impl JsonTransport for RequestGate {
    async fn get(&self, req: JsonRequest) -> Result<Value, TransportError> {
        let _permit = self.admit().await?;
        self.inner.get(req).await
    }

    async fn post(&self, req: JsonRequest, body: Value) -> Result<Value, TransportError> {
        let _permit = self.admit().await?;
        self.inner.post(req, body).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;
    use tokio::time::Instant;

    #[derive(Default)]
    struct MockTransport {
        current: AtomicUsize,
        peak: AtomicUsize,
        calls: AtomicUsize,
        latency: Duration,
    }

    impl MockTransport {
        fn with_latency(latency: Duration) -> Self {
            Self {
                latency,
                ..Default::default()
            }
        }
    }

    #[async_trait]
    impl JsonTransport for MockTransport {
        async fn get(&self, req: JsonRequest) -> Result<Value, TransportError> {
            let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.latency).await;
            self.current.fetch_sub(1, Ordering::SeqCst);
            Ok(Value::String(req.url))
        }

        async fn post(&self, req: JsonRequest, body: Value) -> Result<Value, TransportError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(serde_json::json!({ "url": req.url, "body": body }))
        }
    }

    #[test]
    fn rate_override_keeps_concurrency() {
        let config = GateConfig::unlimited().with_max_in_flight(3).with_rate(10.0);
        assert_eq!(config.rate, Some(RateLimiterConfig::per_second(10.0)));
        assert_eq!(config.max_in_flight, Some(3));
    }

    #[tokio::test]
    async fn unlimited_gate_passes_through() {
        let mock = Arc::new(MockTransport::default());
        let gate = RequestGate::unlimited(mock.clone());
        let url: String = gate.get_json(JsonRequest::new("https://a.test")).await.unwrap();
        assert_eq!(url, "https://a.test");

        let echoed: Value = gate
            .post_json(JsonRequest::new("https://b.test"), serde_json::json!({ "x": 1 }))
            .await
            .unwrap();
        assert_eq!(echoed["body"]["x"], 1);
        assert_eq!(gate.admitted(), 2);
        assert_eq!(mock.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn concurrency_is_bounded() {
        let mock = Arc::new(MockTransport::with_latency(Duration::from_millis(50)));
        let gate = Arc::new(RequestGate::new(
            mock.clone(),
            GateConfig::unlimited().with_max_in_flight(2),
        )
        .unwrap());

        let calls = (0..6).map(|i| {
            let gate = Arc::clone(&gate);
            async move { gate.get(JsonRequest::new(format!("https://q{i}.test"))).await }
        });
        let results = futures::future::join_all(calls).await;

        assert!(results.iter().all(Result::is_ok));
        assert_eq!(mock.calls.load(Ordering::SeqCst), 6);
        assert_eq!(mock.peak.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn rate_budget_delays_but_never_fails() {
        let mock = Arc::new(MockTransport::default());
        let gate = Arc::new(RequestGate::new(
            mock.clone(),
            GateConfig {
                rate: Some(RateLimiterConfig {
                    capacity: 2.0,
                    refill_rate: 2.0,
                }),
                max_in_flight: None,
            },
        )
        .unwrap());

        let start = Instant::now();
        // Two unrelated "queries" sharing one gate.
        let a = {
            let gate = Arc::clone(&gate);
            tokio::spawn(async move {
                for p in 1..=3 {
                    gate.get(JsonRequest::new("https://a.test").param("page", p.to_string()))
                        .await
                        .unwrap();
                }
            })
        };
        let b = {
            let gate = Arc::clone(&gate);
            tokio::spawn(async move {
                for p in 1..=3 {
                    gate.get(JsonRequest::new("https://b.test").param("page", p.to_string()))
                        .await
                        .unwrap();
                }
            })
        };
        a.await.unwrap();
        b.await.unwrap();

        // 6 calls, burst of 2, then 2/s: the last 4 need ~2s of refill.
        assert_eq!(gate.admitted(), 6);
        assert!(start.elapsed() >= Duration::from_millis(1_900));
    }

    #[tokio::test(start_paused = true)]
    async fn sub_one_rate_delays_instead_of_stalling() {
        let mock = Arc::new(MockTransport::default());
        let gate = RequestGate::new(mock.clone(), GateConfig::unlimited().with_rate(0.5)).unwrap();

        let start = Instant::now();
        for _ in 0..3 {
            tokio::time::timeout(
                Duration::from_secs(60),
                gate.get(JsonRequest::new("https://slow.test")),
            )
            .await
            .expect("gate admitted nothing within a minute")
            .unwrap();
        }

        // One immediate call, then one every two seconds.
        assert_eq!(gate.admitted(), 3);
        assert!(start.elapsed() >= Duration::from_secs(4));
        assert!(start.elapsed() < Duration::from_secs(6));
    }

    #[test]
    fn zero_rate_is_rejected_up_front() {
        let mock = Arc::new(MockTransport::default());
        let err = RequestGate::new(mock, GateConfig::per_second(0.0)).err();
        assert!(matches!(err, Some(TransportError::Config(_))));
    }
}
