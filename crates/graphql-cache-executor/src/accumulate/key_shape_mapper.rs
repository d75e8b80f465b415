//! Mirrors `SelectionSetMapper`'s output shape, but records each object's
//! resolved `CacheKey` instead of its fields — `update`/`update_object`
//! pair this with the read's typed data so a later re-normalize can land
//! back on the same record it was read from.

use graphql_cache_types::Scalar;

use crate::key::CACHE_KEY_HINT_FIELD;

use super::{Accumulator, FieldContext, ObjectContext};

/// Produces a tree shaped like `SelectionSetMapper`'s, except every object
/// position holds its `CacheKey` under [`CACHE_KEY_HINT_FIELD`] rather than
/// its field values.
#[derive(Debug, Default, Clone, Copy)]
pub struct KeyShapeMapper;

impl Accumulator for KeyShapeMapper {
    type Partial = serde_json::Value;
    type Final = serde_json::Value;

    fn accept_scalar(&self, _value: &Scalar, _ctx: &FieldContext<'_>) -> serde_json::Value {
        serde_json::Value::Null
    }

    fn accept_list(&self, items: Vec<serde_json::Value>, _ctx: &FieldContext<'_>) -> serde_json::Value {
        serde_json::Value::Array(items)
    }

    fn accept_object(
        &self,
        fields: Vec<(FieldContext<'_>, serde_json::Value)>,
        object: &ObjectContext,
    ) -> serde_json::Value {
        let mut map = serde_json::Map::with_capacity(fields.len() + 1);
        map.insert(
            CACHE_KEY_HINT_FIELD.to_string(),
            serde_json::Value::String(object.key.as_str().to_string()),
        );
        for (ctx, value) in fields {
            map.insert(ctx.info.response_key.clone(), value);
        }
        serde_json::Value::Object(map)
    }

    fn finish(&self, root: serde_json::Value) -> serde_json::Value {
        root
    }
}
