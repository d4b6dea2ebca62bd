//! In-memory time-expiring cache keyed by `(key, page)`.
//!
//! Entries are never swept. A stale entry stops being returned and is
//! overwritten by the next successful fetch.

use chrono::{DateTime, Utc};
use log::debug;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::core::clock::Clock;

pub type CacheKey = (String, u32);

#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry<V> {
    pub value: V,
    pub cached_at: DateTime<Utc>,
}

pub struct TtlCache<V> {
    ttl: std::time::Duration,
    clock: Arc<dyn Clock>,
    entries: Mutex<HashMap<CacheKey, CacheEntry<V>>>,
}

impl<V: Clone> TtlCache<V> {
    pub fn new(ttl: std::time::Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            ttl,
            clock,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// The entry for `key`/`page` if it was stored less than one TTL ago.
    pub fn get(&self, key: &str, page: u32) -> Option<CacheEntry<V>> {
        let now = self.clock.now();
        let entries = self.lock();
        match entries.get(&(key.to_string(), page)) {
            Some(entry) if self.is_fresh(entry, now) => {
                debug!("cache hit: {} page {}", key, page);
                Some(entry.clone())
            }
            Some(_) => {
                debug!("cache stale: {} page {}", key, page);
                None
            }
            None => {
                debug!("cache miss: {} page {}", key, page);
                None
            }
        }
    }

    /// Store (or overwrite) `key`/`page`, stamped with the current time.
    pub fn put(&self, key: &str, page: u32, value: V) {
        let entry = CacheEntry { value, cached_at: self.clock.now() };
        self.lock().insert((key.to_string(), page), entry);
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Number of stored entries, stale ones included.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn is_fresh(&self, entry: &CacheEntry<V>, now: DateTime<Utc>) -> bool {
        // A negative age means the clock went backwards; keep the entry.
        match (now - entry.cached_at).to_std() {
            Ok(age) => age < self.ttl,
            Err(_) => true,
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<CacheKey, CacheEntry<V>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
