//! The write path: turning a raw GraphQL response payload into a
//! [`RecordSet`], plus the [`Normalizer`] accumulator that builds it.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use graphql_cache_types::{CacheError, CacheKey, FieldValue, Record, RecordSet, Result, Scalar};

use crate::accumulate::{Accumulator, FieldContext, ObjectContext};
use crate::field::FieldInfo;
use crate::key::{cache_key_from_json, CacheKeyForObject, CACHE_KEY_HINT_FIELD};
use crate::resolved::{FieldResolver, Resolved, Timestamped};

/// A node of the raw response payload being normalized, paired with its
/// already-derived cache key.
#[derive(Debug, Clone)]
pub struct NormalizeNode {
    pub json: serde_json::Value,
    pub key: CacheKey,
}

impl NormalizeNode {
    pub fn root(json: serde_json::Value, key: CacheKey) -> Self {
        Self { json, key }
    }
}

/// Reads `object[responseKey]` out of the raw payload and stamps every
/// value with the same timestamp — the moment this payload was received.
/// Never dereferences anything, so `dispatch` is the inherited no-op.
pub struct NormalizeResolver {
    cache_key_for_object: Option<CacheKeyForObject>,
}

impl NormalizeResolver {
    pub fn new(cache_key_for_object: Option<CacheKeyForObject>) -> Self {
        Self { cache_key_for_object }
    }

    fn child_key(&self, json: &serde_json::Value, fallback: CacheKey) -> CacheKey {
        if let Some(hint) = json.get(CACHE_KEY_HINT_FIELD).and_then(|v| v.as_str()) {
            return CacheKey::new(hint.to_string());
        }
        self.cache_key_for_object
            .as_ref()
            .and_then(|f| f(json))
            .and_then(cache_key_from_json)
            .unwrap_or(fallback)
    }

    fn resolve_value(
        &self,
        value: &serde_json::Value,
        path: &CacheKey,
        received_at: DateTime<Utc>,
    ) -> Result<Timestamped<NormalizeNode>> {
        match value {
            serde_json::Value::Null => Ok(Timestamped {
                value: Resolved::Null,
                received_at,
            }),
            serde_json::Value::Array(items) => {
                let mut resolved = Vec::with_capacity(items.len());
                for (index, item) in items.iter().enumerate() {
                    resolved.push(self.resolve_value(item, &path.indexed_path(index), received_at)?);
                }
                Ok(Timestamped {
                    value: Resolved::List(resolved),
                    received_at,
                })
            }
            serde_json::Value::Object(_) => {
                let key = self.child_key(value, path.clone());
                Ok(Timestamped {
                    value: Resolved::Object(NormalizeNode { json: value.clone(), key }),
                    received_at,
                })
            }
            scalar => {
                let scalar = Scalar::from_json(scalar.clone())
                    .ok_or_else(|| CacheError::type_mismatch(path.clone(), "<value>", "scalar"))?;
                Ok(Timestamped {
                    value: Resolved::Scalar(scalar),
                    received_at,
                })
            }
        }
    }
}

#[async_trait::async_trait]
impl FieldResolver<NormalizeNode> for NormalizeResolver {
    async fn resolve(
        &self,
        object: &NormalizeNode,
        info: &FieldInfo,
        enclosing_received_at: DateTime<Utc>,
    ) -> Result<Timestamped<NormalizeNode>> {
        let value = object
            .json
            .get(&info.response_key)
            .ok_or_else(|| CacheError::missing(object.key.clone(), info.response_key.clone()))?;
        let path = object.key.child_path(&info.response_key);
        self.resolve_value(value, &path, enclosing_received_at)
    }

    fn typename(&self, object: &NormalizeNode) -> Option<String> {
        object.json.get("__typename").and_then(|v| v.as_str()).map(str::to_string)
    }

    fn object_key(&self, object: &NormalizeNode) -> CacheKey {
        object.key.clone()
    }
}

/// Emits a [`RecordSet`] from a traversal: every object becomes a record
/// (keyed by its cache key) whose fields are filled in field-key by
/// field-key; sub-objects are replaced in the parent record by a
/// [`FieldValue::Reference`]. `null` is preserved as a field rather than
/// omitted.
pub struct Normalizer {
    records: Mutex<RecordSet>,
}

impl Normalizer {
    pub fn new() -> Self {
        Self {
            records: Mutex::new(RecordSet::new()),
        }
    }

    /// Take the accumulated record set. Prefer calling this over
    /// `Accumulator::finish` directly when you don't have the root
    /// partial handy (e.g. outside `execute`).
    pub fn into_record_set(self) -> RecordSet {
        self.records.into_inner()
    }
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Accumulator for Normalizer {
    type Partial = FieldValue;
    type Final = RecordSet;

    fn accept_scalar(&self, value: &Scalar, _ctx: &FieldContext<'_>) -> FieldValue {
        FieldValue::Scalar(value.clone())
    }

    fn accept_list(&self, items: Vec<FieldValue>, _ctx: &FieldContext<'_>) -> FieldValue {
        FieldValue::List(items)
    }

    fn accept_object(
        &self,
        fields: Vec<(FieldContext<'_>, FieldValue)>,
        object: &ObjectContext,
    ) -> FieldValue {
        let mut records = self.records.lock();
        let record: &mut Record = records.record_mut(object.key.clone());
        for (ctx, value) in fields {
            record.set(ctx.info.field_key.clone(), value);
        }
        drop(records);
        FieldValue::Reference(object.key.clone())
    }

    fn finish(&self, _root: FieldValue) -> RecordSet {
        self.records.lock().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::execute;
    use crate::operation::{Field, Selection};
    use std::collections::HashMap;

    #[tokio::test]
    async fn normalizes_a_simple_hero_into_two_records() {
        let payload = serde_json::json!({
            "hero": {
                "__typename": "Droid",
                "id": "2001",
                "name": "R2-D2",
            }
        });

        let resolver = NormalizeResolver::new(Some(std::sync::Arc::new(|obj: &serde_json::Value| {
            obj.get("id").cloned()
        })));
        let accumulator = Normalizer::new();
        let root = NormalizeNode::root(payload, CacheKey::query_root());
        let selections = vec![Selection::field(Field::object(
            "hero",
            vec![
                Selection::field(Field::scalar("__typename")),
                Selection::field(Field::scalar("id")),
                Selection::field(Field::scalar("name")),
            ],
        ))];

        let record_set = execute(
            &selections,
            &root,
            Utc::now(),
            &HashMap::new(),
            &resolver,
            &accumulator,
        )
        .await
        .unwrap();

        let root_record = record_set.get(CacheKey::query_root().as_str()).unwrap();
        assert_eq!(
            root_record.get("hero"),
            Some(&FieldValue::Reference(CacheKey::new("2001")))
        );

        let hero_record = record_set.get("2001").unwrap();
        assert_eq!(
            hero_record.get("name"),
            Some(&FieldValue::Scalar(Scalar::String("R2-D2".to_string())))
        );
    }

    #[tokio::test]
    async fn a_cache_key_hint_wins_over_both_the_hook_and_the_path_fallback() {
        // No `id` field for the hook to find, and no hook installed at all —
        // without the hint this would normalize onto the path key
        // `QUERY_ROOT.hero` instead of the object's real identity.
        let payload = serde_json::json!({
            "hero": {
                "__cacheKey": "2001",
                "name": "C-3PO",
            }
        });

        let resolver = NormalizeResolver::new(None);
        let accumulator = Normalizer::new();
        let root = NormalizeNode::root(payload, CacheKey::query_root());
        let selections = vec![Selection::field(Field::object(
            "hero",
            vec![Selection::field(Field::scalar("name"))],
        ))];

        let record_set = execute(
            &selections,
            &root,
            Utc::now(),
            &HashMap::new(),
            &resolver,
            &accumulator,
        )
        .await
        .unwrap();

        let root_record = record_set.get(CacheKey::query_root().as_str()).unwrap();
        assert_eq!(root_record.get("hero"), Some(&FieldValue::Reference(CacheKey::new("2001"))));
        assert!(record_set.get("QUERY_ROOT.hero").is_none());

        let hero_record = record_set.get("2001").unwrap();
        assert_eq!(
            hero_record.get("name"),
            Some(&FieldValue::Scalar(Scalar::String("C-3PO".to_string())))
        );
    }
}
