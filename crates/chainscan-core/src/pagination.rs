//! Resumable pagination over an offset-paged explorer API.
//!
//! Explorer `getLogs` endpoints serve at most [`MAX_RESULTS`] rows per
//! logical query, in pages of [`PAGE_SIZE`]. A page with fewer than
//! `PAGE_SIZE` rows is the only exhaustion signal (no total count is
//! returned), and nothing past [`LAST_PAGE`] is addressable.
//!
//! The engine turns that into a cursor:
//!
//! ```text
//! paginate(fetcher) ──► Page { items, next: Some(cont) } ──► cont.resume() ──► …
//!                   └─► RetryableError { retry: cont(same page) } ──► err.retry()
//! ```
//!
//! Pages of one query are strictly sequential: page `N + 1` is only requested
//! after page `N` succeeded. Failures are never retried here; the caller
//! decides when (and whether) to call [`RetryableError::retry`].

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::error::ExplorerError;

/// Rows per page (`offset` query parameter).
pub const PAGE_SIZE: usize = 1_000;
/// Absolute cap on addressable rows per logical query.
pub const MAX_RESULTS: usize = 10_000;
/// Number of addressable pages.
pub const MAX_PAGES: u32 = (MAX_RESULTS / PAGE_SIZE) as u32;
pub const FIRST_PAGE: u32 = 1;
pub const LAST_PAGE: u32 = FIRST_PAGE + MAX_PAGES - 1;

/// Performs one page request for one logical query.
#[async_trait]
pub trait PageFetcher: Send + Sync + 'static {
    type Item: Send + 'static;

    /// Fetch page `page` (1-based). An empty vector is a valid answer.
    async fn fetch_page(&self, page: u32) -> Result<Vec<Self::Item>, ExplorerError>;
}

type SharedFetcher<I> = Arc<dyn PageFetcher<Item = I>>;

// ─── Continuation ────────────────────────────────────────────────────────────

/// A pending page request: the query's fetcher plus the page to ask for.
///
/// Resuming consumes the continuation and performs exactly one request.
pub struct Continuation<I> {
    fetcher: SharedFetcher<I>,
    page: u32,
}

impl<I: Send + 'static> Continuation<I> {
    /// Page number this continuation will request.
    pub fn page(&self) -> u32 {
        self.page
    }

    /// Request the page.
    pub async fn resume(self) -> Result<Page<I>, RetryableError<I>> {
        fetch_page(self.fetcher, self.page).await
    }
}

impl<I> fmt::Debug for Continuation<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Continuation").field("page", &self.page).finish()
    }
}

// ─── Page ────────────────────────────────────────────────────────────────────

/// One successfully fetched page.
///
/// `next` is `None` exactly when no further page can exist for the query.
/// A page holds no reference to earlier pages; accumulate them yourself if
/// you need history.
#[derive(Debug)]
pub struct Page<I> {
    pub items: Vec<I>,
    /// Page number these items came from.
    pub page: u32,
    pub next: Option<Continuation<I>>,
}

impl<I> Page<I> {
    /// Returns `true` if this is the final page of the query.
    pub fn is_last(&self) -> bool {
        self.next.is_none()
    }

    pub fn into_parts(self) -> (Vec<I>, Option<Continuation<I>>) {
        (self.items, self.next)
    }
}

// ─── RetryableError ──────────────────────────────────────────────────────────

/// A failed page attempt that can be resumed at the same page.
#[derive(Error)]
#[error("page {page} failed: {source}")]
pub struct RetryableError<I> {
    #[source]
    source: ExplorerError,
    page: u32,
    retry: Continuation<I>,
}

impl<I: Send + 'static> RetryableError<I> {
    /// The page that failed (and that `retry` will request again).
    pub fn page(&self) -> u32 {
        self.page
    }

    /// The underlying failure.
    pub fn cause(&self) -> &ExplorerError {
        &self.source
    }

    /// Give up on resumption and keep only the cause.
    pub fn into_cause(self) -> ExplorerError {
        self.source
    }

    /// Request the failed page again.
    pub async fn retry(self) -> Result<Page<I>, RetryableError<I>> {
        self.retry.resume().await
    }
}

impl<I> fmt::Debug for RetryableError<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryableError")
            .field("page", &self.page)
            .field("source", &self.source)
            .finish()
    }
}

// ─── Engine ──────────────────────────────────────────────────────────────────

/// Start a logical query at [`FIRST_PAGE`].
pub async fn paginate<I: Send + 'static>(
    fetcher: Arc<dyn PageFetcher<Item = I>>,
) -> Result<Page<I>, RetryableError<I>> {
    fetch_page(fetcher, FIRST_PAGE).await
}

/// Whether another page may exist after `page` returned `count` rows.
pub fn has_more(page: u32, count: usize) -> bool {
    count == PAGE_SIZE && page < LAST_PAGE
}

async fn fetch_page<I: Send + 'static>(
    fetcher: SharedFetcher<I>,
    page: u32,
) -> Result<Page<I>, RetryableError<I>> {
    let outcome = fetcher.fetch_page(page).await.and_then(|items| {
        if items.len() > PAGE_SIZE {
            Err(ExplorerError::Decode(format!(
                "page {page} returned {} rows, more than the page size of {PAGE_SIZE}",
                items.len()
            )))
        } else {
            Ok(items)
        }
    });

    match outcome {
        Ok(items) => {
            let next = has_more(page, items.len()).then(|| Continuation {
                fetcher,
                page: page + 1,
            });
            tracing::debug!(page, rows = items.len(), more = next.is_some(), "page fetched");
            Ok(Page { items, page, next })
        }
        Err(source) => {
            tracing::warn!(page, error = %source, "page fetch failed");
            Err(RetryableError {
                source,
                page,
                retry: Continuation { fetcher, page },
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Scripted fetcher: rows per page, plus a number of failures to inject
    /// per page before it starts succeeding.
    struct StubFetcher {
        rows: HashMap<u32, usize>,
        failures: Mutex<HashMap<u32, u32>>,
        requested: Mutex<Vec<u32>>,
    }

    impl StubFetcher {
        fn new(rows: &[(u32, usize)]) -> Self {
            Self {
                rows: rows.iter().copied().collect(),
                failures: Mutex::new(HashMap::new()),
                requested: Mutex::new(Vec::new()),
            }
        }

        fn failing(self, page: u32, times: u32) -> Self {
            self.failures.lock().unwrap().insert(page, times);
            self
        }

        fn requested(&self) -> Vec<u32> {
            self.requested.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl PageFetcher for StubFetcher {
        type Item = u32;

        async fn fetch_page(&self, page: u32) -> Result<Vec<u32>, ExplorerError> {
            self.requested.lock().unwrap().push(page);
            if let Some(left) = self.failures.lock().unwrap().get_mut(&page) {
                if *left > 0 {
                    *left -= 1;
                    return Err(ExplorerError::Provider {
                        message: "NOTOK: Query Timeout".into(),
                    });
                }
            }
            let n = self.rows.get(&page).copied().unwrap_or(0);
            Ok(vec![page; n])
        }
    }

    fn shared(stub: &Arc<StubFetcher>) -> Arc<dyn PageFetcher<Item = u32>> {
        stub.clone()
    }

    async fn drain(stub: &Arc<StubFetcher>) -> (usize, Page<u32>) {
        let mut total = 0;
        let mut page = paginate(shared(stub)).await.unwrap();
        total += page.items.len();
        while let Some(next) = page.next.take() {
            page = next.resume().await.unwrap();
            total += page.items.len();
        }
        (total, page)
    }

    #[test]
    fn constants() {
        assert_eq!(MAX_PAGES, 10);
        assert_eq!(LAST_PAGE, 10);
        assert!(has_more(9, PAGE_SIZE));
        assert!(!has_more(LAST_PAGE, PAGE_SIZE));
        assert!(!has_more(1, PAGE_SIZE - 1));
    }

    #[tokio::test]
    async fn cap_stops_after_last_page_even_when_full() {
        let rows: Vec<(u32, usize)> = (1..=11).map(|p| (p, PAGE_SIZE)).collect();
        let stub = Arc::new(StubFetcher::new(&rows));
        let (total, last) = drain(&stub).await;

        assert_eq!(stub.requested(), (1..=10).collect::<Vec<_>>());
        assert_eq!(total, MAX_RESULTS);
        assert_eq!(last.page, LAST_PAGE);
        assert!(last.is_last());
    }

    #[tokio::test]
    async fn short_page_signals_exhaustion() {
        let stub = Arc::new(StubFetcher::new(&[(1, PAGE_SIZE), (2, 400), (3, PAGE_SIZE)]));
        let (total, last) = drain(&stub).await;

        assert_eq!(stub.requested(), vec![1, 2]);
        assert_eq!(total, 1_400);
        assert!(last.next.is_none());
    }

    #[tokio::test]
    async fn empty_first_page_issues_one_request() {
        let stub = Arc::new(StubFetcher::new(&[]));
        let page = paginate(shared(&stub)).await.unwrap();

        assert!(page.items.is_empty());
        assert!(page.is_last());
        assert_eq!(stub.requested(), vec![1]);
    }

    #[tokio::test]
    async fn retry_resumes_at_failed_page() {
        let stub = Arc::new(
            StubFetcher::new(&[(1, PAGE_SIZE), (2, PAGE_SIZE), (3, 10)]).failing(2, 1),
        );
        let first = paginate(shared(&stub)).await.unwrap();
        assert_eq!(first.items.len(), PAGE_SIZE);

        let err = first.next.unwrap().resume().await.unwrap_err();
        assert_eq!(err.page(), 2);
        assert!(matches!(err.cause(), ExplorerError::Provider { .. }));
        assert_eq!(err.to_string(), "page 2 failed: NOTOK: Query Timeout");

        let second = err.retry().await.unwrap();
        assert_eq!(second.page, 2);
        assert_eq!(second.next.as_ref().map(Continuation::page), Some(3));

        let third = second.next.unwrap().resume().await.unwrap();
        assert!(third.is_last());
        assert_eq!(stub.requested(), vec![1, 2, 2, 3]);
    }

    #[tokio::test]
    async fn repeated_failures_stay_on_same_page() {
        let stub = Arc::new(StubFetcher::new(&[(1, 5)]).failing(1, 3));
        let mut err = paginate(shared(&stub)).await.unwrap_err();
        for _ in 0..2 {
            err = err.retry().await.unwrap_err();
            assert_eq!(err.page(), 1);
        }
        let page = err.retry().await.unwrap();
        assert_eq!(page.items.len(), 5);
        assert_eq!(stub.requested(), vec![1, 1, 1, 1]);
    }

    #[tokio::test]
    async fn oversized_page_is_a_decode_failure() {
        let stub = Arc::new(StubFetcher::new(&[(1, PAGE_SIZE + 1)]));
        let err = paginate(shared(&stub)).await.unwrap_err();
        assert_eq!(err.page(), 1);
        assert!(matches!(err.into_cause(), ExplorerError::Decode(_)));
    }
}
