//! `graphql-cache`: a normalized, transactional client-side cache for
//! GraphQL response payloads.
//!
//! The workspace is split the way the teacher splits concerns across small
//! crates sharing one `workspace.dependencies` table:
//!
//! - [`graphql_cache_types`] — [`CacheKey`], [`Reference`](graphql_cache_types::FieldValue),
//!   [`Record`](graphql_cache_types::Record), [`RecordSet`](graphql_cache_types::RecordSet),
//!   [`RecordRow`](graphql_cache_types::RecordRow), the JSON scalar value, and [`CacheError`].
//! - `graphql_cache_store` — the [`RecordStore`](graphql_cache_store::RecordStore) backend
//!   trait and the default [`InMemoryRecordStore`](graphql_cache_store::InMemoryRecordStore).
//! - `graphql_cache_loader` — the per-transaction [`DataLoader`](graphql_cache_loader::DataLoader).
//! - `graphql_cache_executor` — the selection-set [`execute`](graphql_cache_executor::execute)
//!   traversal, the [`Normalizer`](graphql_cache_executor::Normalizer) and read-path
//!   accumulators, and the hand-rolled [`GraphQLOperation`](graphql_cache_executor::GraphQLOperation)
//!   selection model.
//! - This crate ties them together behind [`Store`]: transactions, the
//!   reader/writer lock, subscriber notification, and the `load` convenience.
//!
//! A minimal round trip:
//!
//! ```no_run
//! use std::sync::Arc;
//! use graphql_cache::Store;
//! use graphql_cache_executor::{Field, GraphQLOperation, Selection};
//! use graphql_cache_types::{CacheKey, FieldValue, RecordSet, Scalar};
//!
//! # async fn run() -> graphql_cache_types::Result<()> {
//! let store = Store::in_memory(Some(Arc::new(|obj: &serde_json::Value| {
//!     obj.get("id").cloned()
//! })));
//!
//! let mut records = RecordSet::new();
//! records
//!     .record_mut(CacheKey::query_root())
//!     .set("hero", FieldValue::Reference(CacheKey::new("2001")));
//! records
//!     .record_mut(CacheKey::new("2001"))
//!     .set("name", FieldValue::Scalar(Scalar::String("R2-D2".into())));
//! store.publish(records, None).await?;
//!
//! let operation = GraphQLOperation::query(vec![Selection::field(Field::object(
//!     "hero",
//!     vec![Selection::field(Field::scalar("name"))],
//! ))]);
//! let result = store.load(&operation).await?;
//! assert_eq!(result.data["hero"]["name"], serde_json::json!("R2-D2"));
//! # Ok(())
//! # }
//! ```

pub mod result;
pub mod store;
pub mod subscriber;
pub mod transaction;

pub use result::{GraphQLResult, QueryMetadata, ResultSource};
pub use store::Store;
pub use subscriber::Subscriber;
pub use transaction::{cache_key_from_object_id, ReadTransaction, ReadWriteTransaction};

// Re-export the workspace crates at the root, the way the teacher re-exports
// its domain types rather than making callers depend on every member crate
// by hand.
pub use graphql_cache_executor as executor;
pub use graphql_cache_loader as loader;
pub use graphql_cache_store as store_backend;
pub use graphql_cache_types as types;

pub use graphql_cache_types::{CacheError, Result};
