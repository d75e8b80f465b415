//! The executor's second axis of polymorphism: what to build from a
//! traversal, independent of what kind of object is being traversed.

pub mod dependency_tracker;
pub mod key_shape_mapper;
pub mod selection_set_mapper;
pub mod timestamp_tracker;
pub mod zip;

pub use dependency_tracker::DependencyTracker;
pub use key_shape_mapper::KeyShapeMapper;
pub use selection_set_mapper::SelectionSetMapper;
pub use timestamp_tracker::TimestampTracker;
pub use zip::{Zip2, Zip3};

use chrono::{DateTime, Utc};

use graphql_cache_types::CacheKey;

use crate::field::FieldInfo;

/// Per-field context handed to `accept_scalar`/`accept_list`, and paired
/// with each field's partial in `accept_object`.
#[derive(Debug, Clone, Copy)]
pub struct FieldContext<'a> {
    pub info: &'a FieldInfo,
    pub received_at: DateTime<Utc>,
}

/// Context about the object a selection set is being accumulated for.
#[derive(Debug, Clone)]
pub struct ObjectContext {
    pub key: CacheKey,
    pub typename: Option<String>,
    pub row_received_at: DateTime<Utc>,
}

/// A pluggable visitor driven by the executor. One pass produces one
/// artifact (typed data, a `RecordSet`, a dependency set, a freshness
/// timestamp...); several accumulators can run in the same pass via
/// [`Zip2`]/[`Zip3`].
pub trait Accumulator: Send + Sync {
    type Partial: Send;
    type Final;

    fn accept_scalar(
        &self,
        value: &graphql_cache_types::Scalar,
        ctx: &FieldContext<'_>,
    ) -> Self::Partial;

    fn accept_list(&self, items: Vec<Self::Partial>, ctx: &FieldContext<'_>) -> Self::Partial;

    fn accept_object(
        &self,
        fields: Vec<(FieldContext<'_>, Self::Partial)>,
        object: &ObjectContext,
    ) -> Self::Partial;

    fn finish(&self, root: Self::Partial) -> Self::Final;
}
