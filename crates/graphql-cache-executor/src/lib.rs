//! The selection-set executor: a single traversal, polymorphic over both
//! what it reads (a raw payload vs. a stored record) and what it builds
//! (a `RecordSet`, a typed result, a dependency set, a freshness
//! timestamp).
//!
//! [`executor::execute`] drives a [`resolved::FieldResolver`] and an
//! [`accumulate::Accumulator`] over one object and its selection set.
//! [`normalize::Normalizer`] + [`normalize::NormalizeResolver`] instantiate
//! the write path; [`read::ReadResolver`] plus the accumulators in
//! [`accumulate`] instantiate the read path.

pub mod accumulate;
pub mod executor;
pub mod field;
pub mod key;
pub mod normalize;
pub mod operation;
pub mod read;
pub mod resolved;

pub use accumulate::{
    Accumulator, DependencyTracker, FieldContext, KeyShapeMapper, ObjectContext, SelectionSetMapper, TimestampTracker,
    Zip2, Zip3,
};
pub use executor::execute;
pub use field::FieldInfo;
pub use key::{cache_key_from_json, CacheKeyForObject, CACHE_KEY_HINT_FIELD};
pub use normalize::{NormalizeNode, NormalizeResolver, Normalizer};
pub use operation::{
    Argument, ArgumentValue, Field, FieldShape, GraphQLOperation, InlineFragment, OperationType, Selection,
};
pub use read::{ReadNode, ReadResolver};
pub use resolved::{FieldResolver, Resolved, Timestamped};
