//! The flat, per-object record and the set of records exchanged with a
//! [`RecordStore`](https://docs.rs/graphql-cache-store).

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::cache_key::CacheKey;
use crate::value::FieldValue;

/// A flat mapping from field key to value for a single normalized object.
///
/// Records never nest whole objects; a sub-object is always represented as
/// a [`FieldValue::Reference`] pointing at another entry in the enclosing
/// [`RecordSet`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Record(HashMap<String, FieldValue>);

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field, overwriting any previous value under the same key.
    pub fn set(&mut self, field_key: impl Into<String>, value: FieldValue) {
        self.0.insert(field_key.into(), value);
    }

    pub fn get(&self, field_key: &str) -> Option<&FieldValue> {
        self.0.get(field_key)
    }

    pub fn contains(&self, field_key: &str) -> bool {
        self.0.contains_key(field_key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &FieldValue)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, FieldValue)> for Record {
    fn from_iter<T: IntoIterator<Item = (String, FieldValue)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// The unit of merge input/output: every touched object keyed by its
/// [`CacheKey`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordSet(HashMap<CacheKey, Record>);

impl RecordSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch or create the record for `key`, then hand the caller a mutable
    /// reference to fill it in. The normalizer uses this to accumulate
    /// fields for an object across several selections.
    pub fn record_mut(&mut self, key: CacheKey) -> &mut Record {
        self.0.entry(key).or_default()
    }

    pub fn get(&self, key: &str) -> Option<&Record> {
        self.0.get(key)
    }

    pub fn insert(&mut self, key: CacheKey, record: Record) {
        self.0.insert(key, record);
    }

    pub fn keys(&self) -> impl Iterator<Item = &CacheKey> {
        self.0.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&CacheKey, &Record)> {
        self.0.iter()
    }

    pub fn into_iter(self) -> impl Iterator<Item = (CacheKey, Record)> {
        self.0.into_iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Merge `other` into `self`, record by record, field by field, later
    /// values winning. Used to combine a normalizer's output across
    /// multiple selection sets executed in the same pass.
    pub fn extend(&mut self, other: RecordSet) {
        for (key, record) in other.0 {
            let existing = self.0.entry(key).or_default();
            for (field_key, value) in record.0 {
                existing.set(field_key, value);
            }
        }
    }
}

/// A [`Record`] paired with the timestamp of the merge that last touched
/// any of its fields. Returned by [`RecordStore::load`](https://docs.rs/graphql-cache-store)
/// so readers can compute the freshness of a query's dependencies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordRow {
    pub record: Record,
    pub last_received_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Scalar;

    #[test]
    fn record_set_extend_overwrites_per_field() {
        let mut base = RecordSet::new();
        base.record_mut(CacheKey::new("2001"))
            .set("name", FieldValue::Scalar(Scalar::String("R2-D2".into())));
        base.record_mut(CacheKey::new("2001"))
            .set("height", FieldValue::Scalar(Scalar::Number(1.into())));

        let mut patch = RecordSet::new();
        patch
            .record_mut(CacheKey::new("2001"))
            .set("name", FieldValue::Scalar(Scalar::String("Artoo".into())));

        base.extend(patch);

        let record = base.get("2001").unwrap();
        assert_eq!(
            record.get("name"),
            Some(&FieldValue::Scalar(Scalar::String("Artoo".into())))
        );
        assert_eq!(
            record.get("height"),
            Some(&FieldValue::Scalar(Scalar::Number(1.into())))
        );
    }
}
