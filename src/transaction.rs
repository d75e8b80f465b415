//! Read and read-write transaction handles, as seen from inside a
//! `Store::within_read_transaction`/`within_read_write_transaction` body.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use parking_lot::Mutex;

use graphql_cache_executor::{
    cache_key_from_json, execute, CacheKeyForObject, DependencyTracker, GraphQLOperation, KeyShapeMapper,
    NormalizeNode, NormalizeResolver, Normalizer, OperationType, ReadNode, ReadResolver, Selection, SelectionSetMapper,
    TimestampTracker, Zip2, Zip3, CACHE_KEY_HINT_FIELD,
};
use graphql_cache_store::RecordStore;
use graphql_cache_types::{CacheError, CacheKey, RecordSet, Result};

use crate::result::{GraphQLResult, QueryMetadata, ResultSource};

fn root_key_for(operation_type: OperationType) -> CacheKey {
    match operation_type {
        OperationType::Query => CacheKey::query_root(),
        OperationType::Mutation => CacheKey::mutation_root(),
        OperationType::Subscription => CacheKey::subscription_root(),
    }
}

/// Read `selections` rooted at `key`, alongside a tree shaped like the
/// result, holding each object's resolved `CacheKey` instead of its fields.
/// `update`/`update_object` merge the two back together after the caller's
/// mutation so re-normalization lands on the same records the data came
/// from, even when the selection never asked for an identity field.
async fn read_with_identity(
    backend: &Arc<dyn RecordStore>,
    key: CacheKey,
    selections: &[Selection],
    variables: &HashMap<String, serde_json::Value>,
) -> Result<(GraphQLResult, serde_json::Value)> {
    let row = backend
        .load(std::slice::from_ref(&key))
        .await?
        .into_iter()
        .next()
        .flatten()
        .ok_or_else(|| CacheError::missing(key.clone(), "<root>"))?;

    let resolver = ReadResolver::new(backend.clone());
    let accumulator = Zip2(
        Zip3::new(SelectionSetMapper, DependencyTracker::new(), TimestampTracker),
        KeyShapeMapper,
    );
    let root = ReadNode {
        key,
        record: row.record,
        row_received_at: row.last_received_at,
    };

    let ((data, dependent_keys, min_received_at), identities) =
        execute(selections, &root, row.last_received_at, variables, &resolver, &accumulator).await?;

    Ok((
        GraphQLResult {
            data,
            dependent_keys,
            source: ResultSource::Cache,
            metadata: QueryMetadata { min_received_at },
        },
        identities,
    ))
}

async fn read_from(
    backend: &Arc<dyn RecordStore>,
    key: CacheKey,
    selections: &[Selection],
    variables: &HashMap<String, serde_json::Value>,
) -> Result<GraphQLResult> {
    let (result, _identities) = read_with_identity(backend, key, selections, variables).await?;
    Ok(result)
}

/// Merge an identity tree produced alongside a read (see
/// `read_with_identity`) into a (possibly mutated) copy of that read's data,
/// stamping `CACHE_KEY_HINT_FIELD` onto every object position both trees
/// still agree on. A mutation that replaces an object's shape entirely
/// leaves that subtree without a hint, falling back to ordinary
/// `cacheKeyForObject`/path-derived resolution for it.
fn with_identity_hints(mut data: serde_json::Value, identities: &serde_json::Value) -> serde_json::Value {
    merge_identity_hints(&mut data, identities);
    data
}

fn merge_identity_hints(data: &mut serde_json::Value, identities: &serde_json::Value) {
    match (data, identities) {
        (serde_json::Value::Object(data_fields), serde_json::Value::Object(identity_fields)) => {
            if let Some(key) = identity_fields.get(CACHE_KEY_HINT_FIELD) {
                data_fields.insert(CACHE_KEY_HINT_FIELD.to_string(), key.clone());
            }
            for (field, child_identity) in identity_fields {
                if field == CACHE_KEY_HINT_FIELD {
                    continue;
                }
                if let Some(child_data) = data_fields.get_mut(field) {
                    merge_identity_hints(child_data, child_identity);
                }
            }
        }
        (serde_json::Value::Array(data_items), serde_json::Value::Array(identity_items)) => {
            for (child_data, child_identity) in data_items.iter_mut().zip(identity_items.iter()) {
                merge_identity_hints(child_data, child_identity);
            }
        }
        _ => {}
    }
}

/// Handle passed to `Store::within_read_transaction`'s body. Each call owns
/// its own `ReadResolver` (and thus its own per-transaction `DataLoader`),
/// created fresh per `read`/`read_object` call rather than shared across the
/// transaction's lifetime.
pub struct ReadTransaction<'a> {
    backend: &'a Arc<dyn RecordStore>,
}

impl<'a> ReadTransaction<'a> {
    pub(crate) fn new(backend: &'a Arc<dyn RecordStore>) -> Self {
        Self { backend }
    }

    /// Execute `operation`'s selections from its operation type's root key.
    pub async fn read(&self, operation: &GraphQLOperation) -> Result<GraphQLResult> {
        read_from(
            self.backend,
            root_key_for(operation.operation_type),
            &operation.selections,
            &operation.variables,
        )
        .await
    }

    /// Execute `selections` rooted directly at `key`, bypassing the
    /// operation-type root sentinels — for reading a single object the
    /// caller already has a key for.
    pub async fn read_object(
        &self,
        selections: &[Selection],
        key: CacheKey,
        variables: &HashMap<String, serde_json::Value>,
    ) -> Result<GraphQLResult> {
        read_from(self.backend, key, selections, variables).await
    }
}

/// Handle passed to `Store::within_read_write_transaction`'s body. Writes
/// accumulate in a private `RecordSet` and are merged into the backend only
/// once the body returns successfully — see `Store::within_read_write_transaction`.
pub struct ReadWriteTransaction<'a> {
    backend: &'a Arc<dyn RecordStore>,
    cache_key_for_object: Option<&'a CacheKeyForObject>,
    pending: Arc<Mutex<RecordSet>>,
}

impl<'a> ReadWriteTransaction<'a> {
    /// `pending` is a handle shared with the caller (`Store::within_read_write_transaction`),
    /// which reads it back out after this transaction has been consumed —
    /// passing `Self` by value into the transaction body (as
    /// `within_read_transaction` does with `ReadTransaction`) means there is
    /// no owned `ReadWriteTransaction` left afterwards to pull a `RecordSet`
    /// out of directly.
    pub(crate) fn new(
        backend: &'a Arc<dyn RecordStore>,
        cache_key_for_object: Option<&'a CacheKeyForObject>,
        pending: Arc<Mutex<RecordSet>>,
    ) -> Self {
        Self {
            backend,
            cache_key_for_object,
            pending,
        }
    }

    pub async fn read(&self, operation: &GraphQLOperation) -> Result<GraphQLResult> {
        read_from(
            self.backend,
            root_key_for(operation.operation_type),
            &operation.selections,
            &operation.variables,
        )
        .await
    }

    pub async fn read_object(
        &self,
        selections: &[Selection],
        key: CacheKey,
        variables: &HashMap<String, serde_json::Value>,
    ) -> Result<GraphQLResult> {
        read_from(self.backend, key, selections, variables).await
    }

    /// Re-normalize `data` against `operation`'s selections (so field keys
    /// pick up the operation's arguments) and stage it for merge.
    pub async fn write(&self, data: serde_json::Value, operation: &GraphQLOperation) -> Result<()> {
        self.write_at(
            data,
            root_key_for(operation.operation_type),
            &operation.selections,
            &operation.variables,
        )
        .await
    }

    pub async fn write_object(
        &self,
        data: serde_json::Value,
        key: CacheKey,
        selections: &[Selection],
        variables: &HashMap<String, serde_json::Value>,
    ) -> Result<()> {
        self.write_at(data, key, selections, variables).await
    }

    /// Read `operation`, apply `mutator` in place, then re-normalize and
    /// stage the result. No diffing beyond what `merge`'s equality check
    /// already gives: an unchanged value after mutation reports no change.
    ///
    /// The re-normalize re-derives each object's identity from the mutated
    /// data via `cacheKeyForObject`/path fallback, *unless* the object still
    /// carries the cache key it was read from (stamped back in after the
    /// mutation) — otherwise a selection that never asked for an identity
    /// field (e.g. `hero { name }`) would re-normalize onto a fresh
    /// path-derived key instead of the record it actually came from.
    pub async fn update(
        &self,
        operation: &GraphQLOperation,
        mutator: impl FnOnce(&mut serde_json::Value),
    ) -> Result<()> {
        let (mut result, identities) = read_with_identity(
            self.backend,
            root_key_for(operation.operation_type),
            &operation.selections,
            &operation.variables,
        )
        .await?;
        mutator(&mut result.data);
        let hinted = with_identity_hints(result.data, &identities);
        self.write(hinted, operation).await
    }

    pub async fn update_object(
        &self,
        selections: &[Selection],
        key: CacheKey,
        variables: &HashMap<String, serde_json::Value>,
        mutator: impl FnOnce(&mut serde_json::Value),
    ) -> Result<()> {
        let (mut result, identities) = read_with_identity(self.backend, key.clone(), selections, variables).await?;
        mutator(&mut result.data);
        let hinted = with_identity_hints(result.data, &identities);
        self.write_object(hinted, key, selections, variables).await
    }

    async fn write_at(
        &self,
        data: serde_json::Value,
        key: CacheKey,
        selections: &[Selection],
        variables: &HashMap<String, serde_json::Value>,
    ) -> Result<()> {
        let resolver = NormalizeResolver::new(self.cache_key_for_object.cloned());
        let accumulator = Normalizer::new();
        let root = NormalizeNode::root(data, key);
        execute(selections, &root, Utc::now(), variables, &resolver, &accumulator).await?;
        self.pending.lock().extend(accumulator.into_record_set());
        Ok(())
    }
}

/// Resolve an opaque JSON id into a `CacheKey`, the same conversion the
/// normalizer applies to a `cacheKeyForObject` hook's return value. Exposed
/// so callers building a `CacheKeyForObject` closure don't need to depend on
/// `graphql-cache-executor` directly for it.
pub fn cache_key_from_object_id(value: serde_json::Value) -> Option<CacheKey> {
    cache_key_from_json(value)
}
