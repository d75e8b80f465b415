//! The read path: dereferencing stored records back through a selection
//! set, batching reference lookups through a [`DataLoader`].

use std::sync::Arc;

use chrono::{DateTime, Utc};

use graphql_cache_loader::DataLoader;
use graphql_cache_store::RecordStore;
use graphql_cache_types::{CacheError, CacheKey, FieldValue, Record, RecordRow, Result, Scalar};

use crate::field::FieldInfo;
use crate::resolved::{FieldResolver, Resolved, Timestamped};

/// A loaded record, read-path object representation.
#[derive(Debug, Clone)]
pub struct ReadNode {
    pub key: CacheKey,
    pub record: Record,
    pub row_received_at: DateTime<Utc>,
}

type RowLoader = DataLoader<CacheKey, Option<RecordRow>>;

/// Values pending dereference, collected synchronously (no `.await`)
/// before any of them are awaited — this is what lets one `resolve` call
/// enqueue an entire list of references before the executor's single
/// `dispatch` runs.
enum Pending {
    Null,
    Scalar(Scalar),
    Reference(CacheKey, graphql_cache_loader::Receipt<Option<RecordRow>>),
    List(Vec<Pending>),
}

fn enqueue(loader: &RowLoader, value: &FieldValue) -> Pending {
    match value {
        FieldValue::Scalar(Scalar::Null) => Pending::Null,
        FieldValue::Scalar(s) => Pending::Scalar(s.clone()),
        FieldValue::Reference(key) => Pending::Reference(key.clone(), loader.get(key.clone())),
        FieldValue::List(items) => Pending::List(items.iter().map(|item| enqueue(loader, item)).collect()),
    }
}

fn resolve_pending(
    pending: Pending,
    enclosing_received_at: DateTime<Utc>,
) -> futures::future::BoxFuture<'static, Result<Timestamped<ReadNode>>> {
    Box::pin(async move {
        match pending {
            Pending::Null => Ok(Timestamped {
                value: Resolved::Null,
                received_at: enclosing_received_at,
            }),
            Pending::Scalar(s) => Ok(Timestamped {
                value: Resolved::Scalar(s),
                received_at: enclosing_received_at,
            }),
            Pending::Reference(key, receipt) => {
                let row = receipt
                    .await?
                    .ok_or_else(|| CacheError::missing(key.clone(), "<referenced object>"))?;
                let received_at = enclosing_received_at.min(row.last_received_at);
                Ok(Timestamped {
                    value: Resolved::Object(ReadNode {
                        key,
                        record: row.record,
                        row_received_at: received_at,
                    }),
                    received_at,
                })
            }
            Pending::List(items) => {
                let futures = items
                    .into_iter()
                    .map(|item| resolve_pending(item, enclosing_received_at));
                let resolved = futures::future::join_all(futures).await;
                let mut out = Vec::with_capacity(resolved.len());
                for item in resolved {
                    out.push(item?);
                }
                Ok(Timestamped {
                    value: Resolved::List(out),
                    received_at: enclosing_received_at,
                })
            }
        }
    })
}

/// Looks up `object.record[fieldKey]`, dereferencing any [`FieldValue::Reference`]
/// through a per-transaction [`DataLoader`].
pub struct ReadResolver {
    loader: Arc<RowLoader>,
}

impl ReadResolver {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        let loader = Arc::new(DataLoader::new(move |keys: Vec<CacheKey>| {
            let store = store.clone();
            async move { store.load(&keys).await }
        }));
        Self { loader }
    }
}

#[async_trait::async_trait]
impl FieldResolver<ReadNode> for ReadResolver {
    async fn resolve(
        &self,
        object: &ReadNode,
        info: &FieldInfo,
        enclosing_received_at: DateTime<Utc>,
    ) -> Result<Timestamped<ReadNode>> {
        let value = object
            .record
            .get(&info.field_key)
            .ok_or_else(|| CacheError::missing(object.key.clone(), info.field_key.clone()))?;
        let pending = enqueue(&self.loader, value);
        resolve_pending(pending, enclosing_received_at).await
    }

    async fn dispatch(&self) -> Result<()> {
        self.loader.dispatch().await
    }

    fn typename(&self, object: &ReadNode) -> Option<String> {
        match object.record.get("__typename") {
            Some(FieldValue::Scalar(Scalar::String(s))) => Some(s.clone()),
            _ => None,
        }
    }

    fn object_key(&self, object: &ReadNode) -> CacheKey {
        object.key.clone()
    }
}
