//! The cache-key resolution hook installed on a store: given a node's raw
//! JSON object, optionally produce the value identifying it.

use std::sync::Arc;

use graphql_cache_types::CacheKey;

/// `(JSONObject) -> optional JSONValue`, installed once at store
/// construction and assumed read-only thereafter.
pub type CacheKeyForObject = Arc<dyn Fn(&serde_json::Value) -> Option<serde_json::Value> + Send + Sync>;

/// Reserved field name the read path stamps onto every materialized object
/// with its resolved `CacheKey`, alongside (not replacing) its selected
/// fields. `update`/`update_object` merge this into the data they re-read
/// before re-normalizing, so an object whose selection didn't happen to
/// include an identity field still re-normalizes onto the same record
/// instead of falling back to a path-derived key. Never appears in a
/// `GraphQLResult` returned from a plain `read`/`read_object`/`load` call.
pub const CACHE_KEY_HINT_FIELD: &str = "__cacheKey";

/// Convert the value a `CacheKeyForObject` hook returned into a `CacheKey`.
/// Only string and number results are meaningful identities; anything else
/// (array, object, bool, null) is treated as "no key", falling back to a
/// path-derived key.
pub fn cache_key_from_json(value: serde_json::Value) -> Option<CacheKey> {
    match value {
        serde_json::Value::String(s) => Some(CacheKey::new(s)),
        serde_json::Value::Number(n) => Some(CacheKey::new(n.to_string())),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_and_number_ids_become_keys() {
        assert_eq!(
            cache_key_from_json(serde_json::json!("2001")),
            Some(CacheKey::new("2001"))
        );
        assert_eq!(
            cache_key_from_json(serde_json::json!(2001)),
            Some(CacheKey::new("2001"))
        );
    }

    #[test]
    fn structured_results_fall_back_to_none() {
        assert_eq!(cache_key_from_json(serde_json::json!([1, 2])), None);
        assert_eq!(cache_key_from_json(serde_json::json!(null)), None);
    }
}
