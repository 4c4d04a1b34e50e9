//! Action Memoizer
//!
//! Wraps an action with single-flight, TTL-based caching of its data.

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::action::{Action, Data, RequestContext};
use crate::cache::{CacheEntry, CacheStats};
use crate::error::ActionError;

// == Memoizer ==
/// Caches the data of one action.
///
/// The first successful call populates the cache; later calls are served from
/// it until the TTL elapses. Errors are returned to the caller and never
/// cached, so a failing call does not poison later ones.
#[derive(Clone)]
pub struct Memoizer {
    action: Action,
    entry: Arc<CacheEntry<Data>>,
    ttl: Option<Duration>,
}

impl Memoizer {
    // == Constructor ==
    /// Creates a memoizer for `action`.
    ///
    /// `ttl` of `None` or zero caches the first successful result forever.
    pub fn new(action: Action, ttl: Option<Duration>) -> Self {
        Self {
            action,
            entry: Arc::new(CacheEntry::new()),
            ttl,
        }
    }

    /// Runs the action or returns its cached data.
    pub async fn call(&self, ctx: Arc<RequestContext>) -> Result<Data, ActionError> {
        let action = &self.action;
        let result = self
            .entry
            .get_or_try_insert_with(self.ttl, || action.call(ctx))
            .await;

        if let Err(err) = &result {
            debug!(error = %err, "memoized action failed; nothing cached");
        }
        result
    }

    /// Time to live of cached data.
    pub fn ttl(&self) -> Option<Duration> {
        self.ttl
    }

    /// Returns current cache statistics.
    pub async fn stats(&self) -> CacheStats {
        self.entry.stats().await
    }

    /// Converts the memoizer back into a plain action.
    pub fn into_action(self) -> Action {
        let memo = Arc::new(self);
        Action::new(move |ctx| {
            let memo = memo.clone();
            async move { memo.call(ctx).await }
        })
    }
}

impl std::fmt::Debug for Memoizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Memoizer").field("ttl", &self.ttl).finish()
    }
}
