//! Short-lived response cache for read-path query results.
//!
//! Entries are keyed by `<operation prefix><term>` and expire a fixed TTL
//! after insertion. There is no size bound and no eviction policy: stale
//! entries are dropped lazily on lookup or wholesale on invalidation.

use crate::clock::{Clock, SystemClock};
use dashmap::DashMap;
use std::fmt::Debug;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tracing::debug;

pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

#[derive(Clone, Debug)]
pub struct CacheEntry<V> {
    pub key: String,
    pub value: V,
    pub stored_at: Instant,
}

impl<V> CacheEntry<V> {
    pub fn is_valid(&self, now: Instant, ttl: Duration) -> bool {
        now.saturating_duration_since(self.stored_at) < ttl
    }
}

/// Which entries an invalidation drops.
#[derive(Clone, Copy, Debug)]
pub enum Invalidate<'a> {
    Key(&'a str),
    Prefixes(&'a [&'a str]),
    All,
}

pub struct ResponseCache<V> {
    entries: DashMap<String, CacheEntry<V>>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
    // Bumped by every invalidation; lets a slow read detect that a write
    // landed while it was in flight.
    generation: AtomicU64,
}

impl<V> ResponseCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    pub fn new(ttl: Duration) -> Self {
        Self::with_clock(ttl, Arc::new(SystemClock))
    }

    pub fn with_clock(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
            clock,
            generation: AtomicU64::new(0),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Return the value stored under `key` if it is still within its TTL.
    pub fn get(&self, key: &str) -> Option<V> {
        let now = self.clock.now();
        let expired = match self.entries.get(key) {
            Some(entry) if entry.is_valid(now, self.ttl) => return Some(entry.value.clone()),
            Some(_) => true,
            None => false,
        };

        if expired {
            // Another task may have refreshed the key since the read above.
            let ttl = self.ttl;
            self.entries
                .remove_if(key, |_, entry| !entry.is_valid(now, ttl));
            debug!("cache entry expired: {}", key);
        }
        None
    }

    /// Store `value` under `key` stamped with the current clock reading.
    pub fn set(&self, key: impl Into<String>, value: V) -> V {
        let key = key.into();
        let entry = CacheEntry {
            key: key.clone(),
            value: value.clone(),
            stored_at: self.clock.now(),
        };
        self.entries.insert(key, entry);
        value
    }

    /// Current invalidation generation. Pair with `set_if_current`.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Store `value` unless an invalidation happened since `generation` was
    /// read. The value is returned either way.
    pub fn set_if_current(&self, key: impl Into<String>, value: V, generation: u64) -> V {
        let key = key.into();
        if self.generation() != generation {
            debug!("not caching {}: invalidated while in flight", key);
            return value;
        }
        let value = self.set(key.clone(), value);
        // An invalidation may have slipped in between the check and the insert
        if self.generation() != generation {
            self.entries.remove(&key);
        }
        value
    }

    /// Raw entry lookup, expired or not.
    pub fn entry(&self, key: &str) -> Option<CacheEntry<V>> {
        self.entries.get(key).map(|e| e.value().clone())
    }

    /// Drop matching entries and return how many were removed.
    pub fn invalidate(&self, scope: Invalidate<'_>) -> usize {
        self.generation.fetch_add(1, Ordering::SeqCst);
        let before = self.entries.len();
        match scope {
            Invalidate::Key(key) => {
                self.entries.remove(key);
            }
            Invalidate::Prefixes(prefixes) => {
                self.entries
                    .retain(|key, _| !prefixes.iter().any(|p| key.starts_with(p)));
            }
            Invalidate::All => self.entries.clear(),
        }
        let removed = before.saturating_sub(self.entries.len());
        debug!("invalidated {} cache entries ({:?})", removed, scope);
        removed
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<V> Debug for ResponseCache<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseCache")
            .field("entries", &self.entries.len())
            .field("ttl", &self.ttl)
            .finish()
    }
}
