//! Merge Combinator
//!
//! Runs several actions concurrently and merges their data in list order.

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::{mpsc, watch};
use tracing::debug;

use super::{Action, Data, RequestContext};
use crate::error::ActionError;

type Tagged = (usize, Result<Data, ActionError>);

/// Returns an action that runs every action in `actions` concurrently.
///
/// Results are merged in list order, independent of completion order: the
/// first action to introduce a key wins, except that two arrays of strings
/// under the same key are concatenated. The first error aborts the merge,
/// cancels the actions still running and is returned as is; partial results
/// are discarded.
pub fn merge(actions: Vec<Action>) -> Action {
    let actions: Arc<[Action]> = actions.into();
    Action::new(move |ctx| {
        let actions = actions.clone();
        async move { run_merge(&actions, ctx).await }
    })
}

async fn run_merge(actions: &[Action], ctx: Arc<RequestContext>) -> Result<Data, ActionError> {
    if actions.is_empty() {
        return Ok(Data::new());
    }

    let (results_tx, mut results_rx) = mpsc::channel::<Tagged>(1);
    // Flipped to true exactly once, on the first error. Dropping the sender
    // (the merge itself was dropped) cancels as well.
    let (cancel_tx, cancel_rx) = watch::channel(false);

    for (index, action) in actions.iter().enumerate() {
        let work = action.call(ctx.clone());
        let results_tx = results_tx.clone();
        let mut cancel_rx = cancel_rx.clone();

        tokio::spawn(async move {
            tokio::select! {
                biased;
                _ = cancelled(&mut cancel_rx) => {
                    debug!(index, "merged action cancelled");
                }
                _ = async move {
                    let result = work.await;
                    // The collector may already be gone; nothing to report then
                    let _ = results_tx.send((index, result)).await;
                } => {}
            }
        });
    }
    drop(results_tx);

    let mut slots: Vec<Option<Data>> = vec![None; actions.len()];
    let mut received = 0;
    while received < actions.len() {
        match results_rx.recv().await {
            Some((index, Ok(data))) => {
                slots[index] = Some(data);
                received += 1;
            }
            Some((index, Err(err))) => {
                debug!(index, error = %err, "merged action failed; cancelling the rest");
                cancel_tx.send_replace(true);
                return Err(err);
            }
            None => {
                // Every sender is gone without a full set of results: a task panicked
                cancel_tx.send_replace(true);
                return Err(ActionError::from("merged action terminated without a result"));
            }
        }
    }

    Ok(merge_data(slots.into_iter().flatten()))
}

/// Resolves once cancellation is signalled or the signal's sender is dropped.
async fn cancelled(cancel_rx: &mut watch::Receiver<bool>) {
    while !*cancel_rx.borrow_and_update() {
        if cancel_rx.changed().await.is_err() {
            return;
        }
    }
}

/// Merges data maps in priority order.
///
/// For every key the first map to introduce it wins, unless both the held
/// value and a later value are arrays of strings, in which case the later
/// array is appended.
pub fn merge_data(results: impl IntoIterator<Item = Data>) -> Data {
    let mut merged = Data::new();
    for data in results {
        for (key, value) in data {
            match merged.get_mut(&key) {
                None => {
                    merged.insert(key, value);
                }
                Some(held) => {
                    if let (Value::Array(held), Value::Array(more)) = (held, value) {
                        if is_string_array(held) && is_string_array(&more) {
                            held.extend(more);
                        }
                    }
                }
            }
        }
    }
    merged
}

fn is_string_array(items: &[Value]) -> bool {
    items.iter().all(Value::is_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    fn data(value: Value) -> Data {
        match value {
            Value::Object(map) => map,
            _ => panic!("test data must be an object"),
        }
    }

    fn delayed(value: Value, delay_ms: u64) -> Action {
        let data = data(value);
        Action::new(move |_ctx| {
            let data = data.clone();
            async move {
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                Ok::<_, ActionError>(data)
            }
        })
    }

    fn failing(message: &'static str, delay_ms: u64) -> Action {
        Action::new(move |_ctx| async move {
            tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            Err::<Data, _>(ActionError::from(message))
        })
    }

    /// Sets the flag when its future is dropped before finishing.
    struct DropFlag(Arc<AtomicBool>);

    impl Drop for DropFlag {
        fn drop(&mut self) {
            self.0.store(true, Ordering::SeqCst);
        }
    }

    #[tokio::test]
    async fn test_first_action_wins_on_conflict() {
        let merged = merge(vec![delayed(json!({"k": "a1"}), 0), delayed(json!({"k": "a2"}), 0)]);

        let result = merged.call(Arc::default()).await.unwrap();
        assert_eq!(result, data(json!({"k": "a1"})));
    }

    #[tokio::test]
    async fn test_string_arrays_concatenate() {
        let merged = merge(vec![
            delayed(json!({"tags": ["x"]}), 0),
            delayed(json!({"tags": ["y"]}), 0),
        ]);

        let result = merged.call(Arc::default()).await.unwrap();
        assert_eq!(result, data(json!({"tags": ["x", "y"]})));
    }

    #[tokio::test(start_paused = true)]
    async fn test_order_independent_of_completion() {
        // The first action finishes last but still wins
        let merged = merge(vec![
            delayed(json!({"k": "slow", "tags": ["a"]}), 300),
            delayed(json!({"k": "fast", "tags": ["b"], "only": 1}), 10),
        ]);

        let result = merged.call(Arc::default()).await.unwrap();
        assert_eq!(
            result,
            data(json!({"k": "slow", "tags": ["a", "b"], "only": 1}))
        );
    }

    #[tokio::test]
    async fn test_mixed_values_keep_first() {
        let merged = merge(vec![
            delayed(json!({"tags": ["x"]}), 0),
            delayed(json!({"tags": "y"}), 0),
            delayed(json!({"tags": [1, 2]}), 0),
        ]);

        let result = merged.call(Arc::default()).await.unwrap();
        assert_eq!(result, data(json!({"tags": ["x"]})));
    }

    #[tokio::test]
    async fn test_empty_merge() {
        let result = merge(Vec::new()).call(Arc::default()).await.unwrap();
        assert!(result.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_short_circuits() {
        let merged = merge(vec![
            delayed(json!({"k": "a1"}), 10),
            failing("Stock Error", 20),
            delayed(json!({"k": "a3"}), 30),
        ]);

        let err = merged.call(Arc::default()).await.unwrap_err();
        assert_eq!(err.to_string(), "Stock Error");
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_cancels_slow_actions() {
        let dropped = Arc::new(AtomicBool::new(false));
        let flag = dropped.clone();
        let slow = Action::new(move |_ctx| {
            let guard = DropFlag(flag.clone());
            async move {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                // Only reached if the merge did not cancel us
                std::mem::forget(guard);
                Ok::<_, ActionError>(Data::new())
            }
        });

        let merged = merge(vec![slow, failing("boom", 10)]);
        let started = tokio::time::Instant::now();
        let err = merged.call(Arc::default()).await.unwrap_err();
        assert_eq!(err.to_string(), "boom");
        assert!(started.elapsed() < Duration::from_secs(1));

        // Give the cancelled task a chance to observe the signal
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(dropped.load(Ordering::SeqCst), "slow action should be dropped");
    }

    #[test]
    fn test_merge_from_blocking_caller() {
        let merged = merge(vec![delayed(json!({"a": 1}), 0), delayed(json!({"b": 2}), 0)]);
        let result = tokio_test::block_on(merged.call(Arc::default())).unwrap();
        assert_eq!(result, data(json!({"a": 1, "b": 2})));
    }

    fn string_list() -> impl Strategy<Value = Value> {
        prop::collection::vec("[a-z]{1,4}", 0..4).prop_map(|items| json!(items))
    }

    fn scalar() -> impl Strategy<Value = Value> {
        prop_oneof![
            any::<i64>().prop_map(|n| json!(n)),
            "[a-z]{0,6}".prop_map(|s| json!(s)),
            any::<bool>().prop_map(|b| json!(b)),
        ]
    }

    fn data_map() -> impl Strategy<Value = Data> {
        prop::collection::btree_map("[a-d]", prop_oneof![string_list(), scalar()], 0..4)
            .prop_map(|map| map.into_iter().collect())
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        // Every key of the merged map comes from the first map that has it;
        // string lists additionally carry every later string list in order.
        #[test]
        fn prop_merge_prefers_earlier_maps(maps in prop::collection::vec(data_map(), 0..5)) {
            let merged = merge_data(maps.clone());

            for (key, value) in &merged {
                let first = maps.iter().find_map(|m| m.get(key)).unwrap();
                match first {
                    Value::Array(items) if is_string_array(items) => {
                        let expected: Vec<Value> = maps
                            .iter()
                            .filter_map(|m| m.get(key))
                            .filter_map(|v| v.as_array())
                            .filter(|items| is_string_array(items))
                            .flatten()
                            .cloned()
                            .collect();
                        prop_assert_eq!(value, &Value::Array(expected));
                    }
                    _ => prop_assert_eq!(value, first),
                }
            }

            let key_count = maps
                .iter()
                .flat_map(|m| m.keys())
                .collect::<std::collections::BTreeSet<_>>()
                .len();
            prop_assert_eq!(merged.len(), key_count);
        }
    }
}
