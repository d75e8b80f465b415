//! The shape `Store::load` and transaction reads hand back to callers.

use std::collections::HashSet;

use chrono::{DateTime, Utc};

use graphql_cache_types::CacheKey;

/// Where a `GraphQLResult`'s data came from. Always `Cache` for this store —
/// kept as an enum rather than a bare marker so a caller composing this cache
/// with a network layer can match on it without inventing its own wrapper.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultSource {
    Cache,
}

/// Freshness metadata accompanying a read: the earliest `lastReceivedAt`
/// across every record the read touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryMetadata {
    pub min_received_at: DateTime<Utc>,
}

/// The result of executing a selection set against the store: typed data,
/// the keys it depends on (for watchers deciding whether a later write
/// affects them), and freshness metadata.
#[derive(Debug, Clone)]
pub struct GraphQLResult {
    pub data: serde_json::Value,
    pub dependent_keys: HashSet<CacheKey>,
    pub source: ResultSource,
    pub metadata: QueryMetadata,
}
