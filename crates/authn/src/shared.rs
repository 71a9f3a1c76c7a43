//! Atomic key-set rotation.
//!
//! [`SharedKeySet`] lets a service swap in a freshly fetched [`KeySet`] while
//! validations are running. Readers take a [`snapshot`](SharedKeySet::snapshot)
//! (an `Arc` clone under a read lock held for a pointer copy) and validate
//! against it; a concurrent [`replace`](SharedKeySet::replace) never changes
//! a snapshot that is already in use.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::keyset::KeySet;

/// A replaceable, shareable reference to the current key set.
#[derive(Debug, Default)]
pub struct SharedKeySet {
    current: RwLock<Arc<KeySet>>,
}

impl SharedKeySet {
    /// Creates a shared key set holding `key_set`.
    #[must_use]
    pub fn new(key_set: KeySet) -> Self {
        Self { current: RwLock::new(Arc::new(key_set)) }
    }

    /// The current key set.
    #[must_use]
    pub fn snapshot(&self) -> Arc<KeySet> {
        Arc::clone(&self.current.read())
    }

    /// Installs `key_set` and returns the snapshot it replaced.
    pub fn replace(&self, key_set: KeySet) -> Arc<KeySet> {
        let new_keys = key_set.len();
        let previous = std::mem::replace(&mut *self.current.write(), Arc::new(key_set));

        tracing::info!(previous_keys = previous.len(), new_keys, "Key set replaced");

        previous
    }
}

impl From<KeySet> for SharedKeySet {
    fn from(key_set: KeySet) -> Self {
        Self::new(key_set)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::{
        algorithm::Algorithm,
        keyset::{KeyMaterial, KeyRecord},
    };

    fn set_with(kids: &[&str]) -> KeySet {
        KeySet::new(kids.iter().map(|kid| {
            let material = KeyMaterial::Ed25519 { x: "AAAA".into() };
            KeyRecord::new(*kid, Algorithm::EdDSA, material).unwrap()
        }))
        .unwrap()
    }

    #[test]
    fn test_default_is_empty() {
        let shared = SharedKeySet::default();
        assert!(shared.snapshot().is_empty());
    }

    #[test]
    fn test_replace_returns_previous() {
        let shared = SharedKeySet::new(set_with(&["k1"]));
        let previous = shared.replace(set_with(&["k2", "k3"]));

        assert!(previous.resolve("k1").is_ok());
        assert_eq!(shared.snapshot().len(), 2);
        assert!(shared.snapshot().resolve("k1").is_err());
    }

    #[test]
    fn test_snapshot_unaffected_by_replace() {
        let shared = SharedKeySet::from(set_with(&["old"]));
        let snapshot = shared.snapshot();

        shared.replace(set_with(&["new"]));

        assert!(snapshot.resolve("old").is_ok());
        assert!(snapshot.resolve("new").is_err());
        assert!(shared.snapshot().resolve("new").is_ok());
    }

    #[test]
    fn test_snapshots_share_allocation() {
        let shared = SharedKeySet::new(set_with(&["k1"]));
        assert!(Arc::ptr_eq(&shared.snapshot(), &shared.snapshot()));
    }
}
