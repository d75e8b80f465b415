//! Change notification.

use std::collections::HashSet;

/// Notified after a successful `publish`/transaction commit with the set of
/// field-qualified keys (`"<cacheKey>.<fieldKey>"`) that changed.
///
/// Subscribers are held by `Arc` and compared by pointer identity in
/// `subscribe`/`unsubscribe`, so the same `Arc` handle used to subscribe
/// must be used to unsubscribe.
pub trait Subscriber: Send + Sync {
    /// `context_identifier` is whatever the writer passed to `publish`,
    /// letting a subscriber recognize and skip notifications about its own
    /// writes.
    fn did_change_keys(
        &self,
        changed_keys: &HashSet<String>,
        context_identifier: Option<&str>,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}
