//! Keyed caching query client.
//!
//! [`CachedQueryClient`] wraps a [`QuerySource`] (an HTTP-backed query
//! executor) with an in-memory `moka` cache. Results are keyed by
//! `(namespace, query, canonical variables)` and kept according to a
//! [`CachePolicy`].
//!
//! # Guarantees
//!
//! - Concurrent callers asking for the same key while it is being fetched
//!   share one backing fetch and one cache write.
//! - Only successful fetches are stored. A failed fetch is reported to every
//!   caller waiting on it, and the next call fetches again.
//! - Stale entries are served while a single background task refreshes them.
//!   [`CachedQueryClient::flush`] waits for those tasks.
//! - [`CachedQueryClient::invalidate_all`] also covers fetches already in
//!   flight: a value fetched before the invalidation is handed to the caller
//!   that asked for it but never served from the cache afterwards.

mod key;
mod policy;

pub use key::CacheKey;
pub use policy::{CachePolicy, Freshness, ParsePolicyError};

use std::collections::HashSet;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use moka::Expiry;
use moka::future::Cache;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tokio::task::JoinSet;
use tracing::{debug, instrument, warn};

/// Failure of a backing fetch.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The upstream answered with a non-success status.
    #[error("HTTP {status}: {reason}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Reason phrase or a truncated response body.
        reason: String,
    },

    /// The request never produced a response.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The upstream answered 2xx with GraphQL errors.
    #[error("GraphQL errors: {0}")]
    GraphQL(String),

    /// The response body was not the expected JSON.
    #[error("invalid response body: {0}")]
    Decode(#[from] serde_json::Error),

    /// The request could not be built from the query and its variables.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl FetchError {
    /// Upstream HTTP status, if the upstream answered at all.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Errors returned by [`CachedQueryClient::query`].
#[derive(Debug, Error)]
pub enum CacheError {
    /// The query identifier was empty.
    #[error("query identifier cannot be empty")]
    InvalidQuery,

    /// Variables could not be serialized to JSON.
    #[error("failed to serialize query variables: {0}")]
    Variables(#[source] serde_json::Error),

    /// The backing fetch failed; nothing was cached.
    #[error("fetch failed: {0}")]
    FetchFailed(#[source] Arc<FetchError>),

    /// The cached or fetched value did not match the requested type.
    #[error("failed to decode query result: {0}")]
    Decode(#[source] serde_json::Error),
}

impl CacheError {
    /// Upstream HTTP status of a failed fetch, if any.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::FetchFailed(err) => err.status(),
            _ => None,
        }
    }
}

/// Backing source that executes a named query.
///
/// Implementations are cheap handles (usually an `Arc` around an HTTP
/// client) so the cache can clone them into background revalidation tasks.
pub trait QuerySource: Clone + Send + Sync + 'static {
    /// Execute `query` with `variables` and return the JSON result.
    fn fetch(
        &self,
        query: &str,
        variables: &Value,
    ) -> impl Future<Output = Result<Value, FetchError>> + Send;
}

/// A successful fetch result.
#[derive(Debug)]
pub struct CacheEntry {
    /// Fetched JSON value.
    pub value: Value,
    /// When the value was stored.
    pub stored_at: Instant,
    /// Policy the value was stored under.
    pub policy: CachePolicy,
    /// Invalidation generation the fetch started in.
    pub generation: u64,
}

impl CacheEntry {
    fn new(value: Value, policy: CachePolicy, generation: u64) -> Self {
        Self {
            value,
            stored_at: Instant::now(),
            policy,
            generation,
        }
    }

    /// Freshness of this entry at `now`.
    #[must_use]
    pub fn freshness(&self, now: Instant) -> Freshness {
        self.policy
            .freshness(now.saturating_duration_since(self.stored_at))
    }
}

/// Per-entry expiry: each entry lives for its own policy's lifetime.
struct PolicyExpiry;

impl Expiry<CacheKey, Arc<CacheEntry>> for PolicyExpiry {
    fn expire_after_create(
        &self,
        _key: &CacheKey,
        value: &Arc<CacheEntry>,
        _created_at: Instant,
    ) -> Option<Duration> {
        value.policy.lifetime()
    }

    fn expire_after_update(
        &self,
        _key: &CacheKey,
        value: &Arc<CacheEntry>,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        value.policy.lifetime()
    }
}

// =============================================================================
// CachedQueryClient
// =============================================================================

/// Caching wrapper around a [`QuerySource`].
///
/// Cheaply cloneable; clones share the same cache. Construct one per backing
/// service at startup and hand it to the clients that need it.
pub struct CachedQueryClient<S> {
    inner: Arc<CachedQueryClientInner<S>>,
}

impl<S> Clone for CachedQueryClient<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct CachedQueryClientInner<S> {
    namespace: String,
    source: S,
    cache: Cache<CacheKey, Arc<CacheEntry>>,
    /// Bumped by every `invalidate_all`.
    generation: AtomicU64,
    revalidating: Mutex<HashSet<CacheKey>>,
    background: Mutex<JoinSet<()>>,
}

impl<S: QuerySource> CachedQueryClient<S> {
    /// Create a client for `namespace` holding at most `max_capacity` entries.
    #[must_use]
    pub fn new(namespace: impl Into<String>, source: S, max_capacity: u64) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_capacity)
            .expire_after(PolicyExpiry)
            .build();

        Self {
            inner: Arc::new(CachedQueryClientInner {
                namespace: namespace.into(),
                source,
                cache,
                generation: AtomicU64::new(0),
                revalidating: Mutex::new(HashSet::new()),
                background: Mutex::new(JoinSet::new()),
            }),
        }
    }

    /// Namespace every key of this client is scoped to.
    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.inner.namespace
    }

    /// The backing source.
    #[must_use]
    pub fn source(&self) -> &S {
        &self.inner.source
    }

    /// Run `query` with `variables`, serving from cache when `policy` allows.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::InvalidQuery`] for an empty query,
    /// [`CacheError::FetchFailed`] when the backing fetch fails, and
    /// [`CacheError::Decode`] when the result does not deserialize into `T`.
    #[instrument(skip_all, fields(namespace = %self.inner.namespace, policy = %policy))]
    pub async fn query<T, V>(
        &self,
        query: &str,
        variables: &V,
        policy: CachePolicy,
    ) -> Result<T, CacheError>
    where
        T: DeserializeOwned,
        V: Serialize + ?Sized,
    {
        if query.trim().is_empty() {
            return Err(CacheError::InvalidQuery);
        }

        let variables = serde_json::to_value(variables).map_err(CacheError::Variables)?;
        let value = self.query_value(query, variables, policy).await?;

        serde_json::from_value(value).map_err(CacheError::Decode)
    }

    async fn query_value(
        &self,
        query: &str,
        variables: Value,
        policy: CachePolicy,
    ) -> Result<Value, CacheError> {
        if !policy.is_cacheable() {
            return self
                .inner
                .source
                .fetch(query, &variables)
                .await
                .map_err(|e| CacheError::FetchFailed(Arc::new(e)));
        }

        let key = CacheKey::new(&self.inner.namespace, query, &variables);
        let generation = self.generation();

        if let Some(entry) = self.inner.cache.get(&key).await {
            match entry.freshness(Instant::now()) {
                _ if entry.generation != generation => {
                    debug!("Dropping entry fetched before invalidation");
                    self.inner.cache.invalidate(&key).await;
                }
                Freshness::Fresh => {
                    debug!("Cache hit");
                    return Ok(entry.value.clone());
                }
                Freshness::Stale => {
                    debug!("Stale cache hit, revalidating in background");
                    self.revalidate(key, query, variables, entry.policy, generation);
                    return Ok(entry.value.clone());
                }
                Freshness::Expired => {
                    self.inner.cache.invalidate(&key).await;
                }
            }
        }

        self.fetch_into_cache(key, query, &variables, policy, generation).await
    }

    /// Fetch `key` once for all concurrent callers and store the result.
    async fn fetch_into_cache(
        &self,
        key: CacheKey,
        query: &str,
        variables: &Value,
        policy: CachePolicy,
        generation: u64,
    ) -> Result<Value, CacheError> {
        let source = &self.inner.source;
        let entry = self
            .inner
            .cache
            .try_get_with(key, async {
                debug!("Cache miss, fetching");
                source
                    .fetch(query, variables)
                    .await
                    .map(|value| Arc::new(CacheEntry::new(value, policy, generation)))
            })
            .await
            .map_err(CacheError::FetchFailed)?;

        Ok(entry.value.clone())
    }

    fn generation(&self) -> u64 {
        self.inner.generation.load(Ordering::Acquire)
    }

    /// Schedule one background refresh of `key`.
    fn revalidate(
        &self,
        key: CacheKey,
        query: &str,
        variables: Value,
        policy: CachePolicy,
        generation: u64,
    ) {
        if !lock(&self.inner.revalidating).insert(key.clone()) {
            return;
        }

        let inner = Arc::clone(&self.inner);
        let query = query.to_owned();
        let task = async move {
            match inner.source.fetch(&query, &variables).await {
                Ok(_) if inner.generation.load(Ordering::Acquire) != generation => {
                    debug!(
                        namespace = %inner.namespace,
                        "Cache invalidated during revalidation, discarding result"
                    );
                }
                Ok(value) => {
                    inner
                        .cache
                        .insert(key.clone(), Arc::new(CacheEntry::new(value, policy, generation)))
                        .await;
                    debug!(namespace = %inner.namespace, "Revalidated cache entry");
                }
                Err(error) => {
                    warn!(
                        namespace = %inner.namespace,
                        error = %error,
                        "Background revalidation failed, keeping stale entry"
                    );
                }
            }
            lock(&inner.revalidating).remove(&key);
        };

        let mut tasks = lock(&self.inner.background);
        while tasks.try_join_next().is_some() {}
        tasks.spawn(task);
    }

    /// Drop every cached entry in this namespace.
    ///
    /// Fetches still in flight finish for their callers, but their results
    /// are not served to later calls.
    pub fn invalidate_all(&self) {
        self.inner.generation.fetch_add(1, Ordering::AcqRel);
        self.inner.cache.invalidate_all();
    }

    /// Wait for all outstanding background revalidations.
    pub async fn flush(&self) {
        let mut tasks = std::mem::take(&mut *lock(&self.inner.background));
        while tasks.join_next().await.is_some() {}
    }

    /// Number of live entries, after applying pending evictions.
    pub async fn entry_count(&self) -> u64 {
        self.inner.cache.run_pending_tasks().await;
        self.inner.cache.entry_count()
    }
}

impl<S> std::fmt::Debug for CachedQueryClient<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CachedQueryClient")
            .field("namespace", &self.inner.namespace)
            .finish_non_exhaustive()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
