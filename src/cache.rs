//! In-memory result cache shared by all providers.
//!
//! Entries are keyed by provider and query and go stale after a fixed TTL.
//! Stale entries are never evicted, only overwritten by the next search for
//! the same key, so the map grows for the lifetime of the process.
//!
//! The map lock is held only while reading or writing an entry. Slow scraping
//! work is serialized per key instead, so two concurrent searches for the same
//! uncached key build it once.

use crate::models::Listing;
use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::{Mutex as KeyLock, OwnedMutexGuard};
use tracing::{debug, info};

pub const DEFAULT_TTL_SECS: i64 = 3600;

/// Identifies one cached result set
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub provider: String,
    pub query: String,
}

impl CacheKey {
    pub fn new(provider: &str, query: &str) -> Self {
        Self {
            provider: provider.to_string(),
            query: query.to_string(),
        }
    }
}

/// Cached listings along with the time they were stored
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub listings: Vec<Listing>,
    pub stored_at: DateTime<Utc>,
}

impl CacheEntry {
    /// Returns the age of the entry at `now`
    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        now - self.stored_at
    }
}

pub struct ResultCache {
    ttl: Duration,
    entries: Mutex<HashMap<CacheKey, CacheEntry>>,
    in_flight: Mutex<HashMap<CacheKey, Arc<KeyLock<()>>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Default for ResultCache {
    fn default() -> Self {
        Self::new(Duration::seconds(DEFAULT_TTL_SECS))
    }
}

impl ResultCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Fresh listings for `key`, if any
    pub fn get(&self, key: &CacheKey) -> Option<Vec<Listing>> {
        self.get_at(key, Utc::now())
    }

    /// Fresh listings for `key` as seen at `now`
    pub fn get_at(&self, key: &CacheKey, now: DateTime<Utc>) -> Option<Vec<Listing>> {
        let entries = lock(&self.entries);
        let entry = entries.get(key)?;
        if entry.age(now) < self.ttl {
            Some(entry.listings.clone())
        } else {
            debug!("Cache entry for {:?} is stale", key);
            None
        }
    }

    pub fn insert(&self, key: CacheKey, listings: Vec<Listing>) {
        self.insert_at(key, listings, Utc::now());
    }

    /// Store `listings` under `key`, overwriting any previous entry
    pub fn insert_at(&self, key: CacheKey, listings: Vec<Listing>, stored_at: DateTime<Utc>) {
        lock(&self.entries).insert(
            key,
            CacheEntry {
                listings,
                stored_at,
            },
        );
    }

    /// Number of stored entries, stale ones included
    pub fn len(&self) -> usize {
        lock(&self.entries).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Wait until no other search is building `key`, then claim it
    pub async fn lock_key(&self, key: &CacheKey) -> InFlightGuard<'_> {
        let slot = lock(&self.in_flight)
            .entry(key.clone())
            .or_insert_with(|| Arc::new(KeyLock::new(())))
            .clone();

        InFlightGuard {
            cache: self,
            key: key.clone(),
            _guard: slot.lock_owned().await,
        }
    }

    /// Read-through lookup.
    ///
    /// Returns the cached listings when fresh; otherwise runs `build` while
    /// holding the key, and stores its output if it succeeded. Errors are
    /// returned without touching the cache.
    pub async fn get_or_build<F, Fut>(&self, key: &CacheKey, build: F) -> Result<Vec<Listing>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<Listing>>>,
    {
        if let Some(listings) = self.get(key) {
            info!("Results found in cache for: {}", key.query);
            return Ok(listings);
        }

        let _flight = self.lock_key(key).await;
        if let Some(listings) = self.get(key) {
            info!("Results for {} built by a concurrent search", key.query);
            return Ok(listings);
        }

        let listings = build().await?;
        self.insert(key.clone(), listings.clone());
        Ok(listings)
    }

    #[cfg(test)]
    fn in_flight_len(&self) -> usize {
        lock(&self.in_flight).len()
    }
}

/// Held while one search builds a key; dropping it releases waiters
pub struct InFlightGuard<'a> {
    cache: &'a ResultCache,
    key: CacheKey,
    _guard: OwnedMutexGuard<()>,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        let mut in_flight = lock(&self.cache.in_flight);
        // One reference in the map, one in our guard: nobody else is waiting
        if in_flight
            .get(&self.key)
            .is_some_and(|slot| Arc::strong_count(slot) <= 2)
        {
            in_flight.remove(&self.key);
        }
    }
}
