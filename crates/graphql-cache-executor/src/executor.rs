//! The polymorphic selection-set traversal: drives a [`FieldResolver`] and
//! an [`Accumulator`] over one object, recursing into sub-selections and
//! list elements.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use futures::future::BoxFuture;

use graphql_cache_types::{CacheError, Result, Scalar};

use crate::accumulate::{Accumulator, FieldContext, ObjectContext};
use crate::field::{build_field_info, flatten_selections, FieldInfo};
use crate::operation::{FieldShape, Selection};
use crate::resolved::{FieldResolver, Resolved, Timestamped};

/// Execute `selections` against `object`, producing the accumulator's
/// final artifact.
///
/// `first_received_at` is the starting freshness timestamp for `object`'s
/// subtree (its own row's `lastReceivedAt` for a read, or the moment a
/// payload was received for a normalize pass).
pub async fn execute<O, R, A>(
    selections: &[Selection],
    object: &O,
    first_received_at: DateTime<Utc>,
    variables: &HashMap<String, serde_json::Value>,
    resolver: &R,
    accumulator: &A,
) -> Result<A::Final>
where
    O: Send + Sync,
    R: FieldResolver<O>,
    A: Accumulator,
{
    let partial =
        execute_selection_set(selections, object, first_received_at, variables, resolver, accumulator).await?;
    Ok(accumulator.finish(partial))
}

fn execute_selection_set<'a, O, R, A>(
    selections: &'a [Selection],
    object: &'a O,
    first_received_at: DateTime<Utc>,
    variables: &'a HashMap<String, serde_json::Value>,
    resolver: &'a R,
    accumulator: &'a A,
) -> BoxFuture<'a, Result<A::Partial>>
where
    O: Send + Sync,
    R: FieldResolver<O>,
    A: Accumulator,
{
    Box::pin(async move {
        let key = resolver.object_key(object);
        let typename = resolver.typename(object);
        let fields = flatten_selections(selections, typename.as_deref());
        let infos = fields
            .iter()
            .map(|field| build_field_info(field, variables))
            .collect::<Result<Vec<FieldInfo>>>()?;

        // `resolver.resolve` enqueues any reference lookups it needs as
        // soon as it's first polled, before its own first `.await` — so
        // polling every field's future once (what `join_all` does on its
        // first poll) registers every load this selection set needs
        // before `dispatch` ever runs. `futures::join!` polls its
        // arguments in order each round, so `dispatch` is only ever
        // polled after that first round.
        let resolve_futures = infos
            .iter()
            .map(|info| resolver.resolve(object, info, first_received_at));
        let (resolved, dispatch_result) = futures::join!(
            futures::future::join_all(resolve_futures),
            resolver.dispatch(),
        );

        let mut timestamped = Vec::with_capacity(resolved.len());
        let mut first_err = None;
        for item in resolved {
            match item {
                Ok(value) => timestamped.push(Some(value)),
                Err(err) => {
                    first_err.get_or_insert(err);
                    timestamped.push(None);
                }
            }
        }
        if let Some(err) = first_err {
            return Err(err);
        }
        dispatch_result?;

        let mut accepted = Vec::with_capacity(fields.len());
        for ((field, info), value) in fields.iter().zip(infos.iter()).zip(timestamped.into_iter()) {
            let value = value.expect("checked for errors above");
            let received_at = value.received_at;
            let partial = complete_value(&field.shape, value, &key, info, variables, resolver, accumulator).await?;
            accepted.push((FieldContext { info, received_at }, partial));
        }

        let object_ctx = ObjectContext {
            key,
            typename,
            row_received_at: first_received_at,
        };
        Ok(accumulator.accept_object(accepted, &object_ctx))
    })
}

fn complete_value<'a, O, R, A>(
    shape: &'a FieldShape,
    timestamped: Timestamped<O>,
    key: &'a graphql_cache_types::CacheKey,
    info: &'a FieldInfo,
    variables: &'a HashMap<String, serde_json::Value>,
    resolver: &'a R,
    accumulator: &'a A,
) -> BoxFuture<'a, Result<A::Partial>>
where
    O: Send + Sync,
    R: FieldResolver<O>,
    A: Accumulator,
{
    Box::pin(async move {
        let received_at = timestamped.received_at;
        match (shape, timestamped.value) {
            (_, Resolved::Null) => Ok(accumulator.accept_scalar(&Scalar::Null, &FieldContext { info, received_at })),
            (FieldShape::Scalar, Resolved::Scalar(s)) => {
                Ok(accumulator.accept_scalar(&s, &FieldContext { info, received_at }))
            }
            (FieldShape::Scalar, _) => {
                Err(CacheError::type_mismatch(key.clone(), info.field_key.clone(), "scalar"))
            }
            (FieldShape::Object(sub_selections), Resolved::Object(child)) => {
                execute_selection_set(sub_selections, &child, received_at, variables, resolver, accumulator).await
            }
            (FieldShape::Object(_), _) => {
                Err(CacheError::type_mismatch(key.clone(), info.field_key.clone(), "object"))
            }
            (FieldShape::List(inner_shape), Resolved::List(items)) => {
                let mut partials = Vec::with_capacity(items.len());
                for item in items {
                    partials.push(
                        complete_value(inner_shape, item, key, info, variables, resolver, accumulator).await?,
                    );
                }
                Ok(accumulator.accept_list(partials, &FieldContext { info, received_at }))
            }
            (FieldShape::List(_), _) => {
                Err(CacheError::type_mismatch(key.clone(), info.field_key.clone(), "list"))
            }
        }
    })
}
