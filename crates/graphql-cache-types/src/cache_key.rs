//! Canonical identifiers for normalized objects.
//!
//! A [`CacheKey`] is an opaque string. Root objects use the fixed sentinels
//! [`QUERY_ROOT`], [`MUTATION_ROOT`], [`SUBSCRIPTION_ROOT`]; every other key
//! is either minted by a user-supplied `CacheKeyForObject` function or
//! derived from the response path leading to it (see
//! [`CacheKey::from_path`]).

use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Sentinel key for the root of a `query` operation.
pub const QUERY_ROOT: &str = "QUERY_ROOT";
/// Sentinel key for the root of a `mutation` operation.
pub const MUTATION_ROOT: &str = "MUTATION_ROOT";
/// Sentinel key for the root of a `subscription` operation.
pub const SUBSCRIPTION_ROOT: &str = "SUBSCRIPTION_ROOT";

/// An opaque identifier for a normalized object in the store.
///
/// Cheaply cloned (a reference-counted string would be a reasonable future
/// optimization, but a plain `String` keeps the wire representation
/// trivially serde-compatible, which matters more for a cache whose
/// contents regularly cross a backend boundary).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CacheKey(String);

impl CacheKey {
    /// Wrap an arbitrary string as a cache key.
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// The sentinel key for `query` operations.
    pub fn query_root() -> Self {
        Self::new(QUERY_ROOT)
    }

    /// The sentinel key for `mutation` operations.
    pub fn mutation_root() -> Self {
        Self::new(MUTATION_ROOT)
    }

    /// The sentinel key for `subscription` operations.
    pub fn subscription_root() -> Self {
        Self::new(SUBSCRIPTION_ROOT)
    }

    /// Derive a path-based key by extending this key with a response key
    /// (and, for list elements, an index), e.g. `QUERY_ROOT.hero.friends.0`.
    ///
    /// Used when no `CacheKeyForObject` function is installed, or when it
    /// returns nothing for a particular node.
    pub fn child_path(&self, response_key: &str) -> Self {
        Self::new(format!("{}.{}", self.0, response_key))
    }

    /// Derive a path-based key for a list element.
    pub fn indexed_path(&self, index: usize) -> Self {
        Self::new(format!("{}.{}", self.0, index))
    }

    /// Borrow the underlying string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the key, returning the underlying string.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl Borrow<str> for CacheKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for CacheKey {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for CacheKey {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_sentinels_are_stable() {
        assert_eq!(CacheKey::query_root().as_str(), "QUERY_ROOT");
        assert_eq!(CacheKey::mutation_root().as_str(), "MUTATION_ROOT");
        assert_eq!(CacheKey::subscription_root().as_str(), "SUBSCRIPTION_ROOT");
    }

    #[test]
    fn path_derivation_matches_dotted_convention() {
        let root = CacheKey::query_root();
        let hero = root.child_path("hero");
        let friends = hero.child_path("friends");
        let first_friend = friends.indexed_path(0);
        assert_eq!(first_friend.as_str(), "QUERY_ROOT.hero.friends.0");
    }

    #[test]
    fn keys_compare_and_hash_by_value() {
        assert_eq!(CacheKey::new("2001"), CacheKey::from("2001".to_string()));
    }
}
