//! The default backend: a single in-memory table guarded by an async
//! reader/writer lock.
//!
//! Unlike the teacher's `VersionedCache` (which uses `parking_lot::RwLock`
//! because every caller there is synchronous), this guard is held across
//! `.await` points by the executor while it dispatches batched loads, so it
//! must be the `tokio::sync::RwLock` async-aware flavor — a `parking_lot`
//! guard is not `Send` across an await and would make that traversal
//! unsound to write.

use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use graphql_cache_types::{CacheKey, Record, RecordRow, RecordSet, Result};

use crate::record_store::RecordStore;

/// In-memory [`RecordStore`] backend: a mapping from [`CacheKey`] to
/// [`Record`], each paired with the timestamp of its last merge.
#[derive(Debug, Default)]
pub struct InMemoryRecordStore {
    records: RwLock<HashMap<CacheKey, (Record, DateTime<Utc>)>>,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct cache keys currently stored. Handy in tests and
    /// diagnostics; not part of the `RecordStore` contract.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait::async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn load(&self, keys: &[CacheKey]) -> Result<Vec<Option<RecordRow>>> {
        let table = self.records.read().await;
        Ok(keys
            .iter()
            .map(|key| {
                table.get(key).map(|(record, last_received_at)| RecordRow {
                    record: record.clone(),
                    last_received_at: *last_received_at,
                })
            })
            .collect())
    }

    async fn merge(&self, records: RecordSet) -> Result<HashSet<String>> {
        let mut table = self.records.write().await;
        let now = Utc::now();
        let mut changed = HashSet::new();

        for (key, incoming) in records.into_iter() {
            match table.entry(key.clone()) {
                Entry::Vacant(slot) => {
                    for (field_key, _) in incoming.iter() {
                        changed.insert(format!("{key}.{field_key}"));
                    }
                    slot.insert((incoming, now));
                }
                Entry::Occupied(mut slot) => {
                    let (existing, last_received_at) = slot.get_mut();
                    for (field_key, new_value) in incoming.iter() {
                        if existing.get(field_key) != Some(new_value) {
                            existing.set(field_key.clone(), new_value.clone());
                            changed.insert(format!("{key}.{field_key}"));
                        }
                    }
                    // Any record present in the merge batch is "touched":
                    // its freshness advances even if every field happened
                    // to be unchanged.
                    *last_received_at = now;
                }
            }
        }

        tracing::debug!(changed = changed.len(), "merged record set");
        Ok(changed)
    }

    async fn clear(&self) -> Result<()> {
        self.records.write().await.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use graphql_cache_types::{FieldValue, Scalar};

    fn scalar(s: &str) -> FieldValue {
        FieldValue::Scalar(Scalar::String(s.to_string()))
    }

    #[tokio::test]
    async fn merge_into_empty_store_reports_every_field_changed() {
        let store = InMemoryRecordStore::new();
        let mut records = RecordSet::new();
        records
            .record_mut(CacheKey::new("2001"))
            .set("name", scalar("R2-D2"));

        let changed = store.merge(records).await.unwrap();
        assert_eq!(changed, HashSet::from(["2001.name".to_string()]));
    }

    #[tokio::test]
    async fn merge_with_identical_value_reports_no_change() {
        let store = InMemoryRecordStore::new();
        let mut first = RecordSet::new();
        first
            .record_mut(CacheKey::new("2001"))
            .set("name", scalar("R2-D2"));
        store.merge(first).await.unwrap();

        let mut second = RecordSet::new();
        second
            .record_mut(CacheKey::new("2001"))
            .set("name", scalar("R2-D2"));
        let changed = store.merge(second).await.unwrap();

        assert!(changed.is_empty());
    }

    #[tokio::test]
    async fn merge_reports_only_the_field_that_changed() {
        let store = InMemoryRecordStore::new();
        let mut first = RecordSet::new();
        {
            let record = first.record_mut(CacheKey::new("2001"));
            record.set("name", scalar("R2-D2"));
            record.set("height", FieldValue::Scalar(Scalar::Number(96.into())));
        }
        store.merge(first).await.unwrap();

        let mut second = RecordSet::new();
        second
            .record_mut(CacheKey::new("2001"))
            .set("name", scalar("Artoo"));
        let changed = store.merge(second).await.unwrap();

        assert_eq!(changed, HashSet::from(["2001.name".to_string()]));
    }

    #[tokio::test]
    async fn load_is_positional_with_none_for_missing_keys() {
        let store = InMemoryRecordStore::new();
        let mut records = RecordSet::new();
        records
            .record_mut(CacheKey::new("2001"))
            .set("name", scalar("R2-D2"));
        store.merge(records).await.unwrap();

        let rows = store
            .load(&[CacheKey::new("2001"), CacheKey::new("missing")])
            .await
            .unwrap();

        assert!(rows[0].is_some());
        assert!(rows[1].is_none());
    }

    #[tokio::test]
    async fn clear_empties_the_store() {
        let store = InMemoryRecordStore::new();
        let mut records = RecordSet::new();
        records
            .record_mut(CacheKey::new("2001"))
            .set("name", scalar("R2-D2"));
        store.merge(records).await.unwrap();

        store.clear().await.unwrap();
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn republishing_the_same_record_set_is_idempotent() {
        let store = InMemoryRecordStore::new();
        let mut records = RecordSet::new();
        records
            .record_mut(CacheKey::new("2001"))
            .set("name", scalar("R2-D2"));

        store.merge(records.clone()).await.unwrap();
        let second = store.merge(records).await.unwrap();
        assert!(second.is_empty());
    }
}
