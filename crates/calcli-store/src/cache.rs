//! Event cache keyed by calendar and file, with request coalescing.
//!
//! Entries are tagged with the modification time of the file they were
//! parsed from. A lookup is valid as long as the cached time is not older
//! than the file's current one. Concurrent loads of the same stale key are
//! coalesced so the loader runs once and every caller shares its result.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use calcli_core::Event;
use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, OnceCell, RwLock};
use tracing::{debug, trace};

use crate::error::StoreResult;

/// Identifies one cached event: the calendar it lives in and its file id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub collection: String,
    pub id: String,
}

impl CacheKey {
    pub fn new(collection: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            id: id.into(),
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.collection, self.id)
    }
}

/// A cached event and the source modification time it was read at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    pub event: Event,
    pub mod_time: DateTime<Utc>,
}

impl CacheEntry {
    /// Returns true if this entry is at least as new as `source_mod_time`.
    pub fn is_fresh(&self, source_mod_time: DateTime<Utc>) -> bool {
        self.mod_time >= source_mod_time
    }
}

type InFlight = Arc<OnceCell<StoreResult<Event>>>;

/// Concurrent event cache.
///
/// The enabled flag is fixed for the lifetime of the cache. When disabled,
/// every operation is a no-op and [`EventCache::load_or_fetch`] calls the
/// loader directly.
#[derive(Debug)]
pub struct EventCache {
    enabled: bool,
    /// Soft limit from configuration, 0 means unlimited. Never evicts.
    max_size: usize,
    entries: RwLock<HashMap<CacheKey, CacheEntry>>,
    /// Only updated while `entries` is write-locked.
    size: AtomicUsize,
    in_flight: Mutex<HashMap<CacheKey, InFlight>>,
}

impl Default for EventCache {
    fn default() -> Self {
        Self::new(true)
    }
}

impl EventCache {
    /// Creates a cache without a size limit.
    pub fn new(enabled: bool) -> Self {
        Self::with_max_size(0, enabled)
    }

    /// Creates a cache with a soft size limit.
    pub fn with_max_size(max_size: usize, enabled: bool) -> Self {
        Self {
            enabled,
            max_size,
            entries: RwLock::new(HashMap::new()),
            size: AtomicUsize::new(0),
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    /// Creates a passthrough cache.
    pub fn disabled() -> Self {
        Self::new(false)
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// Number of cached entries.
    pub fn size(&self) -> usize {
        self.size.load(Ordering::Acquire)
    }

    /// Looks up an entry without checking freshness.
    pub async fn get(&self, collection: &str, id: &str) -> Option<CacheEntry> {
        if !self.enabled {
            return None;
        }
        let key = CacheKey::new(collection, id);
        self.entries.read().await.get(&key).cloned()
    }

    /// Inserts or replaces an entry.
    pub async fn set(&self, collection: &str, id: &str, event: Event, mod_time: DateTime<Utc>) {
        if !self.enabled {
            return;
        }
        self.insert(CacheKey::new(collection, id), event, mod_time).await;
    }

    /// Removes an entry if present.
    pub async fn delete(&self, collection: &str, id: &str) {
        if !self.enabled {
            return;
        }
        let key = CacheKey::new(collection, id);
        let mut entries = self.entries.write().await;
        if entries.remove(&key).is_some() {
            self.size.fetch_sub(1, Ordering::AcqRel);
            debug!(key = %key, "Removed cache entry");
        }
    }

    /// Removes every entry.
    pub async fn clear(&self) {
        let mut entries = self.entries.write().await;
        let count = entries.len();
        entries.clear();
        self.size.store(0, Ordering::Release);
        debug!(count = count, "Cleared all cache entries");
    }

    /// Returns true if an entry exists and is not older than `source_mod_time`.
    pub async fn is_valid(&self, collection: &str, id: &str, source_mod_time: DateTime<Utc>) -> bool {
        self.get(collection, id)
            .await
            .is_some_and(|entry| entry.is_fresh(source_mod_time))
    }

    /// Returns the cached event if it is still valid, otherwise runs `loader`
    /// and caches its result tagged with `source_mod_time`.
    ///
    /// Concurrent calls for the same key share one loader invocation and all
    /// observe its result, error included. Failures are not cached.
    pub async fn load_or_fetch<F, Fut>(
        &self,
        collection: &str,
        id: &str,
        source_mod_time: DateTime<Utc>,
        loader: F,
    ) -> StoreResult<Event>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = StoreResult<Event>>,
    {
        if !self.enabled {
            return loader().await;
        }

        let key = CacheKey::new(collection, id);
        if let Some(event) = self.fresh_event(&key, source_mod_time).await {
            trace!(key = %key, "Cache hit");
            return Ok(event);
        }

        let cell = {
            let mut in_flight = self.in_flight.lock().await;
            Arc::clone(in_flight.entry(key.clone()).or_default())
        };

        let result = cell
            .get_or_init(|| self.run_loader(&key, source_mod_time, loader))
            .await
            .clone();

        let mut in_flight = self.in_flight.lock().await;
        if in_flight
            .get(&key)
            .is_some_and(|current| Arc::ptr_eq(current, &cell))
        {
            in_flight.remove(&key);
        }

        result
    }

    async fn run_loader<F, Fut>(
        &self,
        key: &CacheKey,
        source_mod_time: DateTime<Utc>,
        loader: F,
    ) -> StoreResult<Event>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = StoreResult<Event>>,
    {
        // A previous load may have finished between the miss and registration.
        if let Some(event) = self.fresh_event(key, source_mod_time).await {
            return Ok(event);
        }
        debug!(key = %key, "Cache miss, loading");
        let result = loader().await;
        if let Ok(ref event) = result {
            self.insert(key.clone(), event.clone(), source_mod_time).await;
        }
        result
    }

    async fn fresh_event(&self, key: &CacheKey, source_mod_time: DateTime<Utc>) -> Option<Event> {
        let entries = self.entries.read().await;
        entries
            .get(key)
            .filter(|entry| entry.is_fresh(source_mod_time))
            .map(|entry| entry.event.clone())
    }

    async fn insert(&self, key: CacheKey, event: Event, mod_time: DateTime<Utc>) {
        let mut entries = self.entries.write().await;
        let is_new = entries
            .insert(key.clone(), CacheEntry { event, mod_time })
            .is_none();
        if is_new {
            let size = self.size.fetch_add(1, Ordering::AcqRel) + 1;
            if self.max_size > 0 && size > self.max_size {
                debug!(size = size, max_size = self.max_size, "Cache above configured size");
            }
        }
        trace!(key = %key, is_new = is_new, "Stored cache entry");
    }
}
