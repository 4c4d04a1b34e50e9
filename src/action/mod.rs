//! Action Module
//!
//! An action does the unique work of a page: it computes the data a template
//! is rendered with. Actions can be memoized (see [`crate::cache::Memoizer`])
//! and merged (see [`merge`]).

mod context;
mod merge;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt};
use serde_json::{Map, Value};

use crate::cache::Memoizer;
use crate::error::ActionError;

pub use context::RequestContext;
pub use merge::{merge, merge_data};

/// Data produced by an action. An action with nothing to say returns an
/// empty map.
pub type Data = Map<String, Value>;

/// Boxed future returned by [`Action::call`].
pub type ActionFuture = BoxFuture<'static, Result<Data, ActionError>>;

type ActionFn = dyn Fn(Arc<RequestContext>) -> ActionFuture + Send + Sync;

// == Action ==
/// A cheaply cloneable async function of a request to page data.
#[derive(Clone)]
pub struct Action {
    inner: Arc<ActionFn>,
}

impl Action {
    /// Creates an action from an async closure.
    ///
    /// # Example
    /// ```ignore
    /// let action = Action::new(|ctx| async move {
    ///     let mut data = Data::new();
    ///     data.insert("Path".into(), ctx.path().into());
    ///     Ok(data)
    /// });
    /// ```
    pub fn new<F, Fut>(f: F) -> Self
    where
        F: Fn(Arc<RequestContext>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Data, ActionError>> + Send + 'static,
    {
        Self {
            inner: Arc::new(move |ctx| f(ctx).boxed()),
        }
    }

    /// An action that always returns the same data.
    pub fn constant(data: Data) -> Self {
        Self::new(move |_ctx| {
            let data = data.clone();
            async move { Ok::<_, ActionError>(data) }
        })
    }

    /// Runs the action for one request.
    pub fn call(&self, ctx: Arc<RequestContext>) -> ActionFuture {
        (self.inner)(ctx)
    }

    /// Returns an action that serves this action's data from a cache,
    /// recomputing it once `ttl` has elapsed.
    ///
    /// `ttl` of `None` or zero caches the first successful result forever.
    pub fn cache(self, ttl: Option<Duration>) -> Self {
        Memoizer::new(self, ttl).into_action()
    }

    /// Returns an action that runs all `actions` concurrently and merges
    /// their data. See [`merge`].
    pub fn merge(actions: impl IntoIterator<Item = Action>) -> Self {
        merge(actions.into_iter().collect())
    }
}

impl std::fmt::Debug for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Action").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_action_receives_context() {
        let action = Action::new(|ctx| async move {
            let mut data = Data::new();
            data.insert("Path".to_string(), json!(ctx.path()));
            Ok::<_, ActionError>(data)
        });

        let data = action.call(Arc::new(RequestContext::default())).await.unwrap();
        assert_eq!(data["Path"], json!("/"));
    }

    #[tokio::test]
    async fn test_constant_action() {
        let mut data = Data::new();
        data.insert("Title".to_string(), json!("Hello"));

        let action = Action::constant(data.clone());
        assert_eq!(action.call(Arc::default()).await.unwrap(), data);
    }

    #[tokio::test]
    async fn test_cache_wraps_action() {
        let counter = Arc::new(AtomicUsize::new(0));
        let seen = counter.clone();
        let action = Action::new(move |_ctx| {
            let count = seen.fetch_add(1, Ordering::SeqCst) + 1;
            async move {
                let mut data = Data::new();
                data.insert("Count".to_string(), json!(count));
                Ok::<_, ActionError>(data)
            }
        })
        .cache(Some(Duration::from_secs(3600)));

        for _ in 0..3 {
            let data = action.call(Arc::default()).await.unwrap();
            assert_eq!(data["Count"], json!(1));
        }
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }
}
