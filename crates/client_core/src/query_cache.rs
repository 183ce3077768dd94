//! Keyed query cache with in-flight de-duplication and invalidation.
//!
//! The cache is process-wide shared state, so callers receive it as an
//! injected `Arc<dyn QueryCache<T>>` instead of reaching for a global.

use std::{
    collections::HashMap,
    fmt,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::Duration,
};

use async_trait::async_trait;
use futures::{
    future::{BoxFuture, Shared},
    FutureExt,
};
use shared::{domain::UserId, error::RemoteError};
use tokio::sync::Mutex;
use tracing::{debug, warn};

const DEFAULT_QUERY_RETRIES: u32 = 3;
const DEFAULT_RETRY_BASE_DELAY: Duration = Duration::from_millis(1000);
const DEFAULT_RETRY_MAX_DELAY: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey {
    scope: &'static str,
    id: String,
}

impl QueryKey {
    pub fn new(scope: &'static str, id: impl Into<String>) -> Self {
        Self {
            scope,
            id: id.into(),
        }
    }

    pub fn user(id: &UserId) -> Self {
        Self::new("user", id.as_str())
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.scope, self.id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryStatus<T> {
    Pending,
    Error(RemoteError),
    Success(T),
}

impl<T> QueryStatus<T> {
    pub fn is_pending(&self) -> bool {
        matches!(self, QueryStatus::Pending)
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            QueryStatus::Success(data) => Some(data),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&RemoteError> {
        match self {
            QueryStatus::Error(error) => Some(error),
            _ => None,
        }
    }
}

/// Exponential backoff applied to failed query fetches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl RetryPolicy {
    pub const fn none() -> Self {
        Self {
            max_retries: 0,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_QUERY_RETRIES,
            base_delay: DEFAULT_RETRY_BASE_DELAY,
            max_delay: DEFAULT_RETRY_MAX_DELAY,
        }
    }
}

/// Produces one network attempt per call; the cache calls it again on retry.
pub type Fetcher<T> = Arc<dyn Fn() -> BoxFuture<'static, Result<T, RemoteError>> + Send + Sync>;

#[async_trait]
pub trait QueryCache<T>: Send + Sync
where
    T: Clone + Send + Sync + 'static,
{
    /// Current state without triggering any fetch. Stale data is still
    /// reported as success.
    async fn status(&self, key: &QueryKey) -> QueryStatus<T>;

    /// Returns fresh cached data, joins an in-flight fetch for the same key,
    /// or starts a new one with `fetcher`.
    async fn fetch(&self, key: QueryKey, fetcher: Fetcher<T>) -> QueryStatus<T>;

    /// Marks the entry stale so the next `fetch` goes to the network.
    async fn invalidate(&self, key: &QueryKey);

    async fn set(&self, key: QueryKey, value: T);
}

type SharedFetch<T> = Shared<BoxFuture<'static, Result<T, RemoteError>>>;

struct CacheEntry<T> {
    data: Option<T>,
    error: Option<RemoteError>,
    stale: bool,
    in_flight: Option<(u64, SharedFetch<T>)>,
}

impl<T> Default for CacheEntry<T> {
    fn default() -> Self {
        Self {
            data: None,
            error: None,
            stale: false,
            in_flight: None,
        }
    }
}

pub struct InMemoryQueryCache<T> {
    entries: Mutex<HashMap<QueryKey, CacheEntry<T>>>,
    retry: RetryPolicy,
    next_fetch_id: AtomicU64,
}

impl<T> InMemoryQueryCache<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new(retry: RetryPolicy) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            retry,
            next_fetch_id: AtomicU64::new(1),
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    pub async fn is_stale(&self, key: &QueryKey) -> bool {
        self.entries
            .lock()
            .await
            .get(key)
            .is_some_and(|entry| entry.stale)
    }
}

impl<T> Default for InMemoryQueryCache<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new(RetryPolicy::default())
    }
}

async fn fetch_with_retry<T>(
    key: QueryKey,
    fetcher: Fetcher<T>,
    policy: RetryPolicy,
) -> Result<T, RemoteError> {
    let mut attempt = 0;
    loop {
        match fetcher().await {
            Ok(data) => return Ok(data),
            Err(error) if attempt < policy.max_retries => {
                let delay = policy.delay_for(attempt);
                warn!(%key, %error, attempt, ?delay, "query fetch failed; retrying");
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(error) => return Err(error),
        }
    }
}

#[async_trait]
impl<T> QueryCache<T> for InMemoryQueryCache<T>
where
    T: Clone + Send + Sync + 'static,
{
    async fn status(&self, key: &QueryKey) -> QueryStatus<T> {
        let entries = self.entries.lock().await;
        let Some(entry) = entries.get(key) else {
            return QueryStatus::Pending;
        };
        if let Some(error) = &entry.error {
            if entry.in_flight.is_none() {
                return QueryStatus::Error(error.clone());
            }
        }
        match &entry.data {
            Some(data) => QueryStatus::Success(data.clone()),
            None => QueryStatus::Pending,
        }
    }

    async fn fetch(&self, key: QueryKey, fetcher: Fetcher<T>) -> QueryStatus<T> {
        let (fetch_id, in_flight) = {
            let mut entries = self.entries.lock().await;
            let entry = entries.entry(key.clone()).or_default();
            if let (Some(data), false) = (&entry.data, entry.stale) {
                return QueryStatus::Success(data.clone());
            }
            match entry.in_flight.clone() {
                Some((fetch_id, in_flight)) => {
                    debug!(%key, "joining in-flight query");
                    (fetch_id, in_flight)
                }
                None => {
                    let fetch_id = self.next_fetch_id.fetch_add(1, Ordering::Relaxed);
                    let in_flight = fetch_with_retry(key.clone(), fetcher, self.retry)
                        .boxed()
                        .shared();
                    entry.in_flight = Some((fetch_id, in_flight.clone()));
                    debug!(%key, fetch_id, "starting query fetch");
                    (fetch_id, in_flight)
                }
            }
        };

        let result = in_flight.await;

        let mut entries = self.entries.lock().await;
        let entry = entries.entry(key).or_default();
        // An invalidation during the fetch detaches it; its result is not cached.
        if matches!(&entry.in_flight, Some((current, _)) if *current == fetch_id) {
            entry.in_flight = None;
            match &result {
                Ok(data) => {
                    entry.data = Some(data.clone());
                    entry.error = None;
                    entry.stale = false;
                }
                Err(error) => entry.error = Some(error.clone()),
            }
        }

        match result {
            Ok(data) => QueryStatus::Success(data),
            Err(error) => QueryStatus::Error(error),
        }
    }

    async fn invalidate(&self, key: &QueryKey) {
        let mut entries = self.entries.lock().await;
        if let Some(entry) = entries.get_mut(key) {
            entry.stale = true;
            entry.in_flight = None;
            debug!(%key, "invalidated query");
        }
    }

    async fn set(&self, key: QueryKey, value: T) {
        let mut entries = self.entries.lock().await;
        let entry = entries.entry(key).or_default();
        entry.data = Some(value);
        entry.error = None;
        entry.stale = false;
    }
}

#[cfg(test)]
#[path = "tests/query_cache_tests.rs"]
mod tests;
