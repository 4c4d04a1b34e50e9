//! Cache Entry Module
//!
//! A single TTL-aware cached value guarded by a reader/writer lock. Both the
//! action memoizer and the template reloader are built on it.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::debug;

use crate::cache::stats::{CacheStats, StatsRecorder};
use crate::tasks::spawn_expiry_task;

// == Slot ==
/// A populated value together with its expiry metadata.
#[derive(Debug)]
struct Slot<T> {
    value: T,
    /// None = no expiration
    expires_at: Option<Instant>,
    /// Identifies which population the expiry task belongs to
    generation: u64,
}

impl<T> Slot<T> {
    // An entry is expired once the current time reaches its expiry instant.
    fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(expires) => Instant::now() >= expires,
            None => false,
        }
    }
}

// == Cache Entry ==
/// Owned cache state for one memoized computation.
///
/// The entry starts empty, is populated by the first successful computation
/// and is cleared again when its TTL elapses. At most one computation runs at
/// a time: misses serialize on the write lock and re-check the slot before
/// computing.
#[derive(Debug)]
pub struct CacheEntry<T> {
    slot: RwLock<Option<Slot<T>>>,
    generation: AtomicU64,
    stats: StatsRecorder,
}

impl<T> Default for CacheEntry<T> {
    fn default() -> Self {
        Self {
            slot: RwLock::new(None),
            generation: AtomicU64::new(0),
            stats: StatsRecorder::default(),
        }
    }
}

impl<T> CacheEntry<T>
where
    T: Clone + Send + Sync + 'static,
{
    // == Constructor ==
    /// Creates an empty entry.
    pub fn new() -> Self {
        Self::default()
    }

    // == Get ==
    /// Returns the cached value if one is populated and unexpired.
    ///
    /// Takes only the shared lock and never waits on a computation except
    /// while a writer holds the lock.
    pub async fn get(&self) -> Option<T> {
        let guard = self.slot.read().await;
        guard
            .as_ref()
            .filter(|slot| !slot.is_expired())
            .map(|slot| slot.value.clone())
    }

    // == Get Or Compute ==
    /// Returns the cached value, computing and storing it on a miss.
    ///
    /// `ttl` of `None` or zero caches the value until the entry is dropped.
    /// A failed computation is returned to the caller and leaves the entry
    /// untouched.
    pub async fn get_or_try_insert_with<F, Fut, E>(
        self: &Arc<Self>,
        ttl: Option<Duration>,
        compute: F,
    ) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        // Fast path
        if let Some(value) = self.get().await {
            self.stats.record_hit();
            return Ok(value);
        }

        let mut guard = self.slot.write().await;

        // Another caller may have populated the slot while we waited
        if let Some(slot) = guard.as_ref() {
            if !slot.is_expired() {
                self.stats.record_hit();
                return Ok(slot.value.clone());
            }
            self.stats.record_expiration();
        }

        self.stats.record_miss();
        let value = match compute().await {
            Ok(value) => value,
            Err(err) => {
                self.stats.record_error();
                return Err(err);
            }
        };

        let ttl = ttl.filter(|ttl| !ttl.is_zero());
        let generation = self.generation.fetch_add(1, Ordering::Relaxed) + 1;
        *guard = Some(Slot {
            value: value.clone(),
            expires_at: ttl.map(|ttl| Instant::now() + ttl),
            generation,
        });
        drop(guard);

        if let Some(ttl) = ttl {
            spawn_expiry_task(Arc::downgrade(self), generation, ttl);
        }
        debug!(generation, ?ttl, "cache entry populated");

        Ok(value)
    }

    // == Expire ==
    /// Clears the value if it still belongs to `generation`.
    ///
    /// Returns true if a value was removed.
    pub async fn expire(&self, generation: u64) -> bool {
        let mut guard = self.slot.write().await;
        match guard.as_ref() {
            Some(slot) if slot.generation == generation => {
                *guard = None;
                self.stats.record_expiration();
                true
            }
            _ => false,
        }
    }

    // == Is Populated ==
    /// Returns true if an unexpired value is cached.
    pub async fn is_populated(&self) -> bool {
        self.get().await.is_some()
    }

    // == Stats ==
    /// Returns current entry statistics.
    pub async fn stats(&self) -> CacheStats {
        let populated = self.is_populated().await;
        self.stats.snapshot(populated)
    }
}
