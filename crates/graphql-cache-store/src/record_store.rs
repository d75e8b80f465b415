//! The abstract backend contract.

use std::collections::HashSet;

use graphql_cache_types::{CacheKey, RecordRow, RecordSet, Result};

/// Pluggable backend for a normalized cache.
///
/// Implementations only need to guarantee exclusive-write isolation to the
/// extent the backend itself requires it — the store façade above this
/// trait already serializes writers with its own lock, so a backend need
/// not be safe against concurrent `merge` calls from unrelated callers.
/// Persistent backends (e.g. SQL) are expected to perform `merge`
/// atomically: either every field in the batch lands, or none does.
#[async_trait::async_trait]
pub trait RecordStore: Send + Sync {
    /// Load records for `keys`, positionally: the result has the same
    /// length as `keys`, with `None` for any key not present in the store.
    async fn load(&self, keys: &[CacheKey]) -> Result<Vec<Option<RecordRow>>>;

    /// Merge `records` into the store, returning the set of
    /// field-qualified keys (`"<cacheKey>.<fieldKey>"`) whose stored value
    /// changed as a result.
    async fn merge(&self, records: RecordSet) -> Result<HashSet<String>>;

    /// Drop every record in the store.
    async fn clear(&self) -> Result<()>;
}
