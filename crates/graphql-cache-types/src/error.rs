//! Error taxonomy shared across the workspace.
//!
//! Matches the teacher's preference for hand-rolled error enums
//! (`ValidationErrorKind`-style) over a derive-macro crate: there's a small,
//! fixed set of variants here and each carries different context, so a
//! manual `Display`/`Error` impl reads no worse than a derived one.

use std::fmt;

use crate::cache_key::CacheKey;

/// Errors surfaced by the normalized cache core.
#[derive(Debug)]
pub enum CacheError {
    /// A selection required a field that was absent from the stored
    /// record. Raised identically during normalization (reading back a
    /// value just written should never miss) and during reads.
    MissingValue { key: CacheKey, field: String },

    /// The stored value's shape didn't match what the selection expected
    /// (e.g. a scalar where a sub-selection was declared, or a single
    /// reference where a list was expected).
    TypeMismatch {
        key: CacheKey,
        field: String,
        expected: &'static str,
    },

    /// A `RecordStore` backend call failed. The backend's error is
    /// propagated unchanged, boxed so the core crate doesn't need to be
    /// generic over a backend error type.
    Backend(Box<dyn std::error::Error + Send + Sync>),

    /// The store was cleared while a transaction was in flight; in-flight
    /// reads must fail rather than observe torn state.
    Disposed,
}

impl CacheError {
    pub fn missing(key: impl Into<CacheKey>, field: impl Into<String>) -> Self {
        CacheError::MissingValue {
            key: key.into(),
            field: field.into(),
        }
    }

    pub fn type_mismatch(
        key: impl Into<CacheKey>,
        field: impl Into<String>,
        expected: &'static str,
    ) -> Self {
        CacheError::TypeMismatch {
            key: key.into(),
            field: field.into(),
            expected,
        }
    }

    pub fn backend(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        CacheError::Backend(Box::new(err))
    }
}

impl fmt::Display for CacheError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheError::MissingValue { key, field } => {
                write!(f, "missing value for field \"{field}\" on \"{key}\"")
            }
            CacheError::TypeMismatch {
                key,
                field,
                expected,
            } => write!(
                f,
                "type mismatch for field \"{field}\" on \"{key}\": expected {expected}"
            ),
            CacheError::Backend(err) => write!(f, "record store backend failure: {err}"),
            CacheError::Disposed => {
                write!(f, "store was cleared while a transaction was in flight")
            }
        }
    }
}

impl std::error::Error for CacheError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CacheError::Backend(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}
