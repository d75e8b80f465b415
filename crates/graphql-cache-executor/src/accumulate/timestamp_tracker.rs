//! Propagates the minimum `receivedAt` seen anywhere in an executor pass,
//! exposing it as the read's overall freshness.

use chrono::{DateTime, Utc};

use graphql_cache_types::Scalar;

use super::{Accumulator, FieldContext, ObjectContext};

#[derive(Debug, Default, Clone, Copy)]
pub struct TimestampTracker;

impl Accumulator for TimestampTracker {
    type Partial = DateTime<Utc>;
    type Final = DateTime<Utc>;

    fn accept_scalar(&self, _value: &Scalar, ctx: &FieldContext<'_>) -> DateTime<Utc> {
        ctx.received_at
    }

    fn accept_list(&self, items: Vec<DateTime<Utc>>, ctx: &FieldContext<'_>) -> DateTime<Utc> {
        items
            .into_iter()
            .fold(ctx.received_at, |min_so_far, t| min_so_far.min(t))
    }

    fn accept_object(
        &self,
        fields: Vec<(FieldContext<'_>, DateTime<Utc>)>,
        object: &ObjectContext,
    ) -> DateTime<Utc> {
        fields
            .into_iter()
            .fold(object.row_received_at, |min_so_far, (_, t)| min_so_far.min(t))
    }

    fn finish(&self, root: DateTime<Utc>) -> DateTime<Utc> {
        root
    }
}
