//! TTL Expiry Task
//!
//! One-shot background task that clears a cache entry once its TTL elapses.

use std::sync::Weak;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::debug;

use crate::cache::CacheEntry;

/// Spawns a task that expires `generation` of `entry` after `ttl`.
///
/// The task takes the entry's write lock before clearing, so it never races
/// an in-flight read or recompute. It holds only a weak reference: once the
/// owner of the entry is dropped the task does nothing.
///
/// # Example
/// ```ignore
/// let entry = Arc::new(CacheEntry::new());
/// let handle = spawn_expiry_task(Arc::downgrade(&entry), 1, Duration::from_secs(300));
/// ```
pub fn spawn_expiry_task<T>(
    entry: Weak<CacheEntry<T>>,
    generation: u64,
    ttl: Duration,
) -> JoinHandle<()>
where
    T: Clone + Send + Sync + 'static,
{
    tokio::spawn(async move {
        tokio::time::sleep(ttl).await;

        let Some(entry) = entry.upgrade() else {
            debug!(generation, "cache entry dropped before expiry");
            return;
        };

        if entry.expire(generation).await {
            debug!(generation, ?ttl, "cache entry expired");
        } else {
            debug!(generation, "cache entry already replaced");
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn test_expiry_task_removes_value() {
        let entry = Arc::new(CacheEntry::new());
        entry
            .get_or_try_insert_with(None, || async { Ok::<_, ()>("value".to_string()) })
            .await
            .unwrap();

        let handle = spawn_expiry_task(Arc::downgrade(&entry), 1, Duration::from_secs(1));
        handle.await.unwrap();

        assert!(!entry.is_populated().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_expiry_task_preserves_newer_generation() {
        let entry = Arc::new(CacheEntry::new());
        entry
            .get_or_try_insert_with(None, || async { Ok::<_, ()>("value".to_string()) })
            .await
            .unwrap();

        let handle = spawn_expiry_task(Arc::downgrade(&entry), 7, Duration::from_secs(1));
        handle.await.unwrap();

        assert_eq!(entry.get().await.as_deref(), Some("value"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_expiry_task_tolerates_dropped_entry() {
        let entry: Arc<CacheEntry<String>> = Arc::new(CacheEntry::new());
        let weak = Arc::downgrade(&entry);
        drop(entry);

        let handle = spawn_expiry_task(weak, 1, Duration::from_secs(1));
        assert!(handle.await.is_ok(), "Task should finish without an entry");
    }
}
