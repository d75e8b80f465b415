//! Accumulates the set of cache keys an executor pass touched.

use std::collections::HashSet;

use parking_lot::Mutex;

use graphql_cache_types::{CacheKey, Scalar};

use super::{Accumulator, FieldContext, ObjectContext};

#[derive(Debug, Default)]
pub struct DependencyTracker {
    keys: Mutex<HashSet<CacheKey>>,
}

impl DependencyTracker {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Accumulator for DependencyTracker {
    type Partial = ();
    type Final = HashSet<CacheKey>;

    fn accept_scalar(&self, _value: &Scalar, _ctx: &FieldContext<'_>) {}

    fn accept_list(&self, _items: Vec<()>, _ctx: &FieldContext<'_>) {}

    fn accept_object(&self, _fields: Vec<(FieldContext<'_>, ())>, object: &ObjectContext) {
        self.keys.lock().insert(object.key.clone());
    }

    fn finish(&self, _root: ()) -> HashSet<CacheKey> {
        self.keys.lock().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_empty() {
        let tracker = DependencyTracker::new();
        assert!(tracker.keys.lock().is_empty());
    }
}
