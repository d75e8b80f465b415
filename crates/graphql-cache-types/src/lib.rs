//! Shared types for the graphql-cache workspace.
//!
//! This crate provides the canonical, storage-layer representation of a
//! normalized GraphQL cache: [`CacheKey`] identifies a normalized object,
//! [`Record`] holds its fields, and [`RecordSet`] is the unit of merge
//! input/output exchanged between the normalizer, the store façade, and a
//! [`RecordStore`](https://docs.rs/graphql-cache-store) backend.
//!
//! Breaking these out into their own crate (rather than defining them next
//! to the executor or the backend) avoids a circular dependency between the
//! store and executor crates, both of which need them.

pub mod cache_key;
pub mod error;
pub mod record;
pub mod value;

pub use cache_key::{CacheKey, MUTATION_ROOT, QUERY_ROOT, SUBSCRIPTION_ROOT};
pub use error::CacheError;
pub use record::{Record, RecordRow, RecordSet};
pub use value::{field_key, FieldValue, Scalar};

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, CacheError>;
