//! The public entry point: transactions, the write lock, and subscriber
//! notification.

use std::future::Future;
use std::sync::Arc;

use parking_lot::Mutex;

use graphql_cache_executor::CacheKeyForObject;
use graphql_cache_store::{InMemoryRecordStore, RecordStore};
use graphql_cache_types::{CacheKey, RecordSet, Result};

use crate::subscriber::Subscriber;
use crate::transaction::{ReadTransaction, ReadWriteTransaction};

/// A normalized, transactional client-side cache.
///
/// Concurrent reads are allowed to overlap; writes are serialized against
/// both reads and each other by `gate`, a `tokio::sync::RwLock` guarding the
/// subscriber list. The lock does double duty: `within_read_transaction`
/// only needs *a* read guard to participate in the reader/writer ordering
/// (it never touches the subscriber list), while `within_read_write_transaction`
/// takes the write guard and uses it to notify subscribers after merging.
///
/// `tokio::sync::RwLock` is fair and async-aware, so a writer queued behind
/// in-flight readers does not block those readers' own batched loader
/// dispatches from completing — see the crate's module docs for why a
/// thread-blocking mutex would deadlock here.
pub struct Store {
    backend: Arc<dyn RecordStore>,
    cache_key_for_object: Option<CacheKeyForObject>,
    gate: tokio::sync::RwLock<Vec<Arc<dyn Subscriber>>>,
}

impl Store {
    /// Build a store over an arbitrary backend.
    pub fn new(backend: Arc<dyn RecordStore>, cache_key_for_object: Option<CacheKeyForObject>) -> Self {
        Self {
            backend,
            cache_key_for_object,
            gate: tokio::sync::RwLock::new(Vec::new()),
        }
    }

    /// Build a store over the default in-memory backend.
    pub fn in_memory(cache_key_for_object: Option<CacheKeyForObject>) -> Self {
        Self::new(Arc::new(InMemoryRecordStore::new()), cache_key_for_object)
    }

    /// Register a subscriber. Notification order is registration order.
    pub async fn subscribe(&self, subscriber: Arc<dyn Subscriber>) {
        self.gate.write().await.push(subscriber);
    }

    /// Unregister a subscriber by pointer identity — the same `Arc` used to
    /// subscribe.
    pub async fn unsubscribe(&self, subscriber: &Arc<dyn Subscriber>) {
        self.gate.write().await.retain(|s| !Arc::ptr_eq(s, subscriber));
    }

    /// Merge `records` directly (without going through a transaction body)
    /// and notify subscribers of whatever changed. `context_identifier` lets
    /// the caller recognize and skip its own notification.
    pub async fn publish(&self, records: RecordSet, context_identifier: Option<&str>) -> Result<()> {
        let subscribers = self.gate.write().await;
        let changed = self.backend.merge(records).await?;
        tracing::debug!(changed = changed.len(), "published record set");
        if !changed.is_empty() {
            notify(&subscribers, &changed, context_identifier);
        }
        Ok(())
    }

    /// Drop every record in the store. Does not by itself notify
    /// subscribers — there is no well-defined changed-key set for "every
    /// key, forever", so callers that care tell their own watchers directly.
    pub async fn clear(&self) -> Result<()> {
        let _subscribers = self.gate.write().await;
        self.backend.clear().await
    }

    /// Run `body` holding a read guard: concurrent with other readers,
    /// blocked behind any in-flight or queued writer.
    ///
    /// `'body` is an ordinary (not higher-ranked) lifetime parameter, tied
    /// by inference to the `ReadTransaction` constructed inside this call —
    /// a `for<'a> FnOnce(...) -> Fut` bound here would force `Fut` to be
    /// valid for every possible `'a` simultaneously, which an `async move`
    /// body that actually captures the transaction can never satisfy.
    pub async fn within_read_transaction<'body, F, Fut, T>(&self, body: F) -> Result<T>
    where
        F: FnOnce(ReadTransaction<'body>) -> Fut,
        Fut: Future<Output = Result<T>> + 'body,
    {
        let _subscribers = self.gate.read().await;
        body(ReadTransaction::new(&self.backend)).await
    }

    /// Run `body` holding the write guard. Any records staged via the
    /// transaction handle's `write`/`update` methods are merged into the
    /// backend, and subscribers notified of the changed keys, only after
    /// `body` returns `Ok`.
    ///
    /// Passes the transaction to `body` *by value*, exactly like
    /// `within_read_transaction` does, and for the same reason: `'body` is
    /// an ordinary lifetime parameter (not `for<'a>` — an elided `'_` here
    /// would be read as higher-ranked, the same trap as above), tied by
    /// inference to the `ReadWriteTransaction` constructed inside this
    /// call. `ReadWriteTransaction<'body>` only ever borrows `&self.backend`
    /// and `&self.cache_key_for_object`, both valid for all of `'body`
    /// since `self` is borrowed for the whole call — nothing function-local
    /// is ever borrowed at `'body`. Staged writes live behind a `pending`
    /// handle shared with (not owned by) the transaction, so they're still
    /// readable here after the transaction itself has been consumed by
    /// `body`.
    pub async fn within_read_write_transaction<'body, F, Fut, T>(&self, body: F) -> Result<T>
    where
        F: FnOnce(ReadWriteTransaction<'body>) -> Fut,
        Fut: Future<Output = Result<T>> + 'body,
    {
        let subscribers = self.gate.write().await;
        let pending = Arc::new(Mutex::new(RecordSet::new()));
        let txn = ReadWriteTransaction::new(&self.backend, self.cache_key_for_object.as_ref(), pending.clone());
        let result = body(txn).await?;

        let staged = std::mem::take(&mut *pending.lock());
        if !staged.is_empty() {
            let changed = self.backend.merge(staged).await?;
            tracing::debug!(changed = changed.len(), "committed read-write transaction");
            if !changed.is_empty() {
                notify(&subscribers, &changed, None);
            }
        }
        Ok(result)
    }

    /// Convenience: run `operation`'s selections in a read transaction from
    /// its operation type's root key.
    pub async fn load(&self, operation: &graphql_cache_executor::GraphQLOperation) -> Result<crate::GraphQLResult> {
        self.within_read_transaction(|txn| async move { txn.read(operation).await }).await
    }
}

fn notify(subscribers: &[Arc<dyn Subscriber>], changed_keys: &std::collections::HashSet<String>, context_identifier: Option<&str>) {
    for subscriber in subscribers {
        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            subscriber.did_change_keys(changed_keys, context_identifier)
        }));
        match outcome {
            Ok(Ok(())) => {}
            Ok(Err(err)) => tracing::warn!(error = %err, "subscriber returned an error"),
            Err(_) => tracing::warn!("subscriber panicked while handling a change notification"),
        }
    }
}
