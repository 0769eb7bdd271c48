//! Time-bounded memoisation for upstream lookups.
//!
//! Geocoding, directory lookups, website probes, and whole pipeline results
//! are all re-requested every time a caller tweaks a parameter, so each is
//! fronted by a [`TtlCache`] keyed by the exact request parameters.

use std::fmt;
use std::future::Future;
use std::hash::Hash;
use std::time::Duration;

use moka::future::Cache;

/// Bounded, expiring key/value cache backed by `moka`.
///
/// Population is not coalesced: two concurrent misses for the same key both
/// run their lookup and the last insert wins. Values are never partially
/// written, so a lost race only costs one redundant upstream call.
#[derive(Clone)]
pub struct TtlCache<K, V> {
    inner: Cache<K, V>,
}

impl<K, V> TtlCache<K, V>
where
    K: Hash + Eq + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    #[must_use]
    pub fn new(max_capacity: u64, ttl: Duration) -> Self {
        Self {
            inner: Cache::builder()
                .max_capacity(max_capacity)
                .time_to_live(ttl)
                .build(),
        }
    }

    pub async fn get(&self, key: &K) -> Option<V> {
        self.inner.get(key).await
    }

    pub async fn insert(&self, key: K, value: V) {
        self.inner.insert(key, value).await;
    }

    /// Return the cached value for `key`, computing and storing it on a miss.
    pub async fn get_or_compute<F, Fut>(&self, key: K, compute: F) -> V
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = V>,
    {
        if let Some(hit) = self.inner.get(&key).await {
            return hit;
        }
        let value = compute().await;
        self.inner.insert(key, value.clone()).await;
        value
    }

    /// Like [`Self::get_or_compute`], but only successful results are stored.
    ///
    /// # Errors
    ///
    /// Returns whatever error `compute` produced; nothing is cached in that case.
    pub async fn try_get_or_compute<E, F, Fut>(&self, key: K, compute: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if let Some(hit) = self.inner.get(&key).await {
            return Ok(hit);
        }
        let value = compute().await?;
        self.inner.insert(key, value.clone()).await;
        Ok(value)
    }

    /// Approximate entry count; call [`Self::run_pending_tasks`] first for an
    /// exact figure.
    #[must_use]
    pub fn entry_count(&self) -> u64 {
        self.inner.entry_count()
    }

    pub async fn run_pending_tasks(&self) {
        self.inner.run_pending_tasks().await;
    }

    pub fn invalidate_all(&self) {
        self.inner.invalidate_all();
    }
}

impl<K, V> fmt::Debug for TtlCache<K, V>
where
    K: Hash + Eq + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TtlCache")
            .field("max_capacity", &self.inner.policy().max_capacity())
            .field("time_to_live", &self.inner.policy().time_to_live())
            .finish_non_exhaustive()
    }
}
