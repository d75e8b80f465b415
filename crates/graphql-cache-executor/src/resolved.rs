//! The value shape a [`FieldResolver`] hands back to the executor, and the
//! resolver trait itself.

use chrono::{DateTime, Utc};

use graphql_cache_types::{CacheKey, Result, Scalar};

use crate::field::FieldInfo;

/// A resolved field value, before it's been matched against the field's
/// declared [`FieldShape`](crate::operation::FieldShape).
#[derive(Debug)]
pub enum Resolved<O> {
    Null,
    Scalar(Scalar),
    Object(O),
    List(Vec<Timestamped<O>>),
}

/// A resolved value paired with the timestamp it's fresh as of — the
/// minimum of every record row touched in producing it.
#[derive(Debug)]
pub struct Timestamped<O> {
    pub value: Resolved<O>,
    pub received_at: DateTime<Utc>,
}

/// The pluggable data-access half of the executor.
///
/// Implementations own whatever lets them answer `resolve`: a raw JSON
/// payload for normalization, or a [`RecordStore`](https://docs.rs/graphql-cache-store)
/// plus [`DataLoader`](https://docs.rs/graphql-cache-loader) for reads. `resolve`
/// must enqueue every batched load it needs *before* its first `.await`
/// point, so that the executor's single `dispatch` call per selection set
/// sees every pending key.
#[async_trait::async_trait]
pub trait FieldResolver<O>: Send + Sync
where
    O: Send + Sync,
{
    /// Resolve one field of `object`. `enclosing_received_at` is the
    /// running minimum freshness timestamp for `object`'s subtree; a
    /// resolver that dereferences a reference should fold in the
    /// dereferenced row's own timestamp via `.min(...)`.
    async fn resolve(
        &self,
        object: &O,
        info: &FieldInfo,
        enclosing_received_at: DateTime<Utc>,
    ) -> Result<Timestamped<O>>;

    /// Flush batched loads enqueued by `resolve` calls since the last
    /// dispatch. Resolvers that never enqueue can leave this as a no-op.
    async fn dispatch(&self) -> Result<()> {
        Ok(())
    }

    /// `object`'s GraphQL type name, if known, used to decide which
    /// typename-conditioned inline fragments apply.
    fn typename(&self, object: &O) -> Option<String>;

    /// `object`'s cache key — already derived by the resolver (via a
    /// `CacheKeyForObject` hook or response path) when it produced `object`.
    fn object_key(&self, object: &O) -> CacheKey;
}
