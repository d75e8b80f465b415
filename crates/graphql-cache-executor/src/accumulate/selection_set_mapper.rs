//! Materializes a typed result tree shaped by the selection set.

use graphql_cache_types::Scalar;

use super::{Accumulator, FieldContext, ObjectContext};

/// Maps an executor pass onto `serde_json::Value`, keyed by response key
/// (the GraphQL-facing name, post-alias) rather than field key.
#[derive(Debug, Default, Clone, Copy)]
pub struct SelectionSetMapper;

impl Accumulator for SelectionSetMapper {
    type Partial = serde_json::Value;
    type Final = serde_json::Value;

    fn accept_scalar(&self, value: &Scalar, _ctx: &FieldContext<'_>) -> serde_json::Value {
        value.clone().into_json()
    }

    fn accept_list(
        &self,
        items: Vec<serde_json::Value>,
        _ctx: &FieldContext<'_>,
    ) -> serde_json::Value {
        serde_json::Value::Array(items)
    }

    fn accept_object(
        &self,
        fields: Vec<(FieldContext<'_>, serde_json::Value)>,
        _object: &ObjectContext,
    ) -> serde_json::Value {
        let map = fields
            .into_iter()
            .map(|(ctx, value)| (ctx.info.response_key.clone(), value))
            .collect();
        serde_json::Value::Object(map)
    }

    fn finish(&self, root: serde_json::Value) -> serde_json::Value {
        root
    }
}
