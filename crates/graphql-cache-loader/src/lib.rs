//! Per-transaction request coalescer.
//!
//! A [`DataLoader`] batches every `get` issued during one executor pass into
//! a single `batchLoad` call on `dispatch()`. It is owned exclusively by one
//! transaction — never share a loader across transactions, or unrelated
//! reads end up with their lifetimes bound together (the same
//! coalesce-then-fetch shape shows up in `sui-prefetch`'s
//! `GroundTruthPrefetchConfig::fetch_concurrency`, there applied to a fixed
//! concurrency window instead of key-based dedup).
//!
//! `get` is deliberately *not* `async`: it only needs to append to a
//! pending-loads list, so it takes a plain (non-`Send`-held-across-await)
//! lock and hands back a [`Receipt`] the caller can stash without polling.
//! That's what lets an executor pass build up every reference resolution
//! for one object before calling `dispatch` once, per spec.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::hash::Hash;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use parking_lot::Mutex;
use tokio::sync::oneshot;

use graphql_cache_types::{CacheError, Result};

type BatchFuture<V> = Pin<Box<dyn Future<Output = Result<Vec<V>>> + Send>>;
type BatchLoadFn<K, V> = Arc<dyn Fn(Vec<K>) -> BatchFuture<V> + Send + Sync>;

#[derive(Debug)]
struct LoaderBatchError(String);

impl fmt::Display for LoaderBatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "batchLoad failed: {}", self.0)
    }
}

impl std::error::Error for LoaderBatchError {}

#[derive(Debug)]
struct LoaderLengthMismatch {
    requested: usize,
    returned: usize,
}

impl fmt::Display for LoaderLengthMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "batchLoad returned {} values for {} requested keys: backend contract violation",
            self.returned, self.requested
        )
    }
}

impl std::error::Error for LoaderLengthMismatch {}

#[derive(Default)]
struct PendingState<K, V> {
    /// Unique keys not yet dispatched, in first-enqueue order.
    order: Vec<K>,
    /// Every waiter for a given key; all resolve to the same value.
    waiters: HashMap<K, Vec<oneshot::Sender<Result<V>>>>,
}

/// A future resolving to the value for one enqueued key.
///
/// Produced by [`DataLoader::get`]; does nothing until polled, and only
/// completes once the owning loader's [`DataLoader::dispatch`] has run.
pub struct Receipt<V>(oneshot::Receiver<Result<V>>);

impl<V> Future for Receipt<V> {
    type Output = Result<V>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.0).poll(cx) {
            Poll::Ready(Ok(value)) => Poll::Ready(value),
            Poll::Ready(Err(_)) => Poll::Ready(Err(CacheError::Disposed)),
            Poll::Pending => Poll::Pending,
        }
    }
}

/// A per-transaction coalescer keyed by `K`, producing `V` via a
/// user-supplied batch function.
pub struct DataLoader<K, V> {
    batch_load: BatchLoadFn<K, V>,
    state: Mutex<PendingState<K, V>>,
}

impl<K, V> DataLoader<K, V>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + 'static,
{
    /// Build a loader around a batch function. The function receives the
    /// deduplicated keys enqueued since the last dispatch, in enqueue
    /// order, and must return exactly one value per key, in the same
    /// order.
    pub fn new<F, Fut>(batch_load: F) -> Self
    where
        F: Fn(Vec<K>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Vec<V>>> + Send + 'static,
    {
        Self {
            batch_load: Arc::new(move |keys| Box::pin(batch_load(keys))),
            state: Mutex::new(PendingState::default()),
        }
    }

    /// Enqueue `key`. Appends to the pending-loads list and returns
    /// immediately — no backend work happens until [`DataLoader::dispatch`]
    /// runs. Two `get` calls for the same key issued before the next
    /// dispatch resolve from the same batched call, to the same value.
    pub fn get(&self, key: K) -> Receipt<V> {
        let (tx, rx) = oneshot::channel();
        {
            let mut state = self.state.lock();
            if !state.waiters.contains_key(&key) {
                state.order.push(key.clone());
            }
            state.waiters.entry(key).or_default().push(tx);
        }
        Receipt(rx)
    }

    /// Atomically take every key enqueued since the last dispatch and
    /// resolve them with a single batch call. A dispatch with nothing
    /// pending is a no-op.
    pub async fn dispatch(&self) -> Result<()> {
        let (order, mut waiters) = {
            let mut state = self.state.lock();
            let order = std::mem::take(&mut state.order);
            let waiters = std::mem::take(&mut state.waiters);
            (order, waiters)
        };

        if order.is_empty() {
            return Ok(());
        }

        tracing::debug!(keys = order.len(), "dispatching batched load");
        let requested = order.len();
        let result = (self.batch_load)(order.clone()).await;

        match result {
            Ok(values) if values.len() == requested => {
                for (key, value) in order.into_iter().zip(values.into_iter()) {
                    if let Some(senders) = waiters.remove(&key) {
                        deliver(senders, value);
                    }
                }
                Ok(())
            }
            Ok(values) => {
                let mismatch = LoaderLengthMismatch {
                    requested,
                    returned: values.len(),
                };
                let message = mismatch.to_string();
                fail_all(order, &mut waiters, &message);
                Err(CacheError::backend(mismatch))
            }
            Err(err) => {
                let message = err.to_string();
                fail_all(order, &mut waiters, &message);
                Err(CacheError::backend(LoaderBatchError(message)))
            }
        }
    }
}

fn deliver<V: Clone>(senders: Vec<oneshot::Sender<Result<V>>>, value: V) {
    for tx in senders {
        let _ = tx.send(Ok(value.clone()));
    }
}

fn fail_all<K: Eq + Hash, V>(
    order: Vec<K>,
    waiters: &mut HashMap<K, Vec<oneshot::Sender<Result<V>>>>,
    message: &str,
) {
    for key in order {
        if let Some(senders) = waiters.remove(&key) {
            for tx in senders {
                let _ = tx.send(Err(CacheError::backend(LoaderBatchError(message.to_string()))));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn coalesces_distinct_keys_into_one_batch_call() {
        let call_count = Arc::new(AtomicUsize::new(0));
        let seen_keys = Arc::new(Mutex::new(Vec::new()));

        let loader = {
            let call_count = call_count.clone();
            let seen_keys = seen_keys.clone();
            DataLoader::<i32, String>::new(move |keys: Vec<i32>| {
                let call_count = call_count.clone();
                let seen_keys = seen_keys.clone();
                async move {
                    call_count.fetch_add(1, Ordering::SeqCst);
                    *seen_keys.lock() = keys.clone();
                    Ok(keys.into_iter().map(|k| format!("value-{k}")).collect())
                }
            })
        };

        let r1 = loader.get(1);
        let r2 = loader.get(2);
        let r3 = loader.get(3);
        loader.dispatch().await.unwrap();

        assert_eq!(r1.await.unwrap(), "value-1");
        assert_eq!(r2.await.unwrap(), "value-2");
        assert_eq!(r3.await.unwrap(), "value-3");
        assert_eq!(call_count.load(Ordering::SeqCst), 1);
        assert_eq!(*seen_keys.lock(), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn duplicate_keys_dedupe_to_one_request_and_share_a_value() {
        let call_count = Arc::new(AtomicUsize::new(0));
        let loader = {
            let call_count = call_count.clone();
            DataLoader::<&'static str, i32>::new(move |keys: Vec<&'static str>| {
                let call_count = call_count.clone();
                async move {
                    call_count.fetch_add(1, Ordering::SeqCst);
                    assert_eq!(keys, vec!["a"]);
                    Ok(vec![42])
                }
            })
        };

        let r1 = loader.get("a");
        let r2 = loader.get("a");
        loader.dispatch().await.unwrap();

        assert_eq!(r1.await.unwrap(), 42);
        assert_eq!(r2.await.unwrap(), 42);
        assert_eq!(call_count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn dispatch_with_nothing_pending_is_a_no_op() {
        let loader = DataLoader::<i32, i32>::new(|_keys| async { Ok(vec![]) });
        loader.dispatch().await.unwrap();
    }

    #[tokio::test]
    async fn length_mismatch_is_a_backend_error_not_a_panic() {
        let loader = DataLoader::<i32, i32>::new(|_keys| async { Ok(vec![1, 2]) });

        let receipt = loader.get(1);
        let result = loader.dispatch().await;
        assert!(result.is_err());
        assert!(receipt.await.is_err());
    }

    #[tokio::test]
    async fn a_fresh_dispatch_after_completion_issues_a_new_batch() {
        let call_count = Arc::new(AtomicUsize::new(0));
        let loader = {
            let call_count = call_count.clone();
            DataLoader::<i32, i32>::new(move |keys: Vec<i32>| {
                let call_count = call_count.clone();
                async move {
                    call_count.fetch_add(1, Ordering::SeqCst);
                    Ok(keys)
                }
            })
        };

        let r1 = loader.get(1);
        loader.dispatch().await.unwrap();
        assert_eq!(r1.await.unwrap(), 1);

        let r2 = loader.get(1);
        loader.dispatch().await.unwrap();
        assert_eq!(r2.await.unwrap(), 1);

        assert_eq!(call_count.load(Ordering::SeqCst), 2);
    }
}
