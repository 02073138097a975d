//! # Outbound Ports
//!
//! What the transaction manager needs from the rest of the system: named
//! container snapshot/restore, and a read-only view of the reconciler's
//! tracking state. Mock implementations live alongside for tests.

use crate::domain::TxnError;
use mirror_types::{ChainState, Domain, DomainHashes};
use std::collections::BTreeMap;

/// Named-container snapshot access - outbound port.
///
/// Containers are in-process; captures and restores are synchronous and
/// atomic per store.
pub trait SnapshotStore: Send + Sync {
    /// Capture an opaque point-in-time value of one named container.
    fn capture(&self, store: &str) -> Result<serde_json::Value, TxnError>;

    /// Restore a previously captured value into one named container.
    fn restore(&self, store: &str, snapshot: serde_json::Value) -> Result<(), TxnError>;
}

/// Read-only view of chain/hash tracking state - outbound port.
///
/// Captured into every transaction snapshot for post-rollback diagnostics;
/// the manager never writes tracking state back. Re-anchoring after a
/// divergent rollback goes through the reconciler's resync path.
pub trait SyncStateView: Send + Sync {
    /// Current per-domain chain states.
    fn chain_states(&self) -> BTreeMap<Domain, ChainState>;

    /// Current tracked session hashes.
    fn hashes(&self) -> DomainHashes;
}

// =============================================================================
// Mock Implementations for Testing
// =============================================================================

use std::collections::HashMap;
use std::sync::Mutex;

/// Mock snapshot store for testing.
#[derive(Default)]
pub struct MockStores {
    values: Mutex<HashMap<String, serde_json::Value>>,
    failing_captures: Mutex<Vec<String>>,
    failing_restores: Mutex<Vec<String>>,
}

impl MockStores {
    /// Create an empty mock store set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a store with a value.
    pub fn seed(&self, store: &str, value: serde_json::Value) {
        if let Ok(mut values) = self.values.lock() {
            values.insert(store.to_string(), value);
        }
    }

    /// Current value of a store.
    #[must_use]
    pub fn value(&self, store: &str) -> Option<serde_json::Value> {
        self.values.lock().ok()?.get(store).cloned()
    }

    /// Make `capture` fail for one store.
    pub fn fail_capture_for(&self, store: &str) {
        if let Ok(mut failing) = self.failing_captures.lock() {
            failing.push(store.to_string());
        }
    }

    /// Make `restore` fail for one store.
    pub fn fail_restore_for(&self, store: &str) {
        if let Ok(mut failing) = self.failing_restores.lock() {
            failing.push(store.to_string());
        }
    }

    fn fails(list: &Mutex<Vec<String>>, store: &str) -> bool {
        list.lock()
            .map(|f| f.iter().any(|s| s == store))
            .unwrap_or(false)
    }
}

impl SnapshotStore for MockStores {
    fn capture(&self, store: &str) -> Result<serde_json::Value, TxnError> {
        if Self::fails(&self.failing_captures, store) {
            return Err(TxnError::SnapshotFailed {
                store: store.to_string(),
                reason: "capture failed".to_string(),
            });
        }
        self.values
            .lock()
            .ok()
            .and_then(|values| values.get(store).cloned())
            .ok_or_else(|| TxnError::SnapshotFailed {
                store: store.to_string(),
                reason: "unknown store".to_string(),
            })
    }

    fn restore(&self, store: &str, snapshot: serde_json::Value) -> Result<(), TxnError> {
        if Self::fails(&self.failing_restores, store) {
            return Err(TxnError::SnapshotFailed {
                store: store.to_string(),
                reason: "restore failed".to_string(),
            });
        }
        self.seed(store, snapshot);
        Ok(())
    }
}

/// Mock tracking-state view for testing.
#[derive(Default)]
pub struct MockStateView {
    /// Chain states returned by the view.
    pub chain_states: BTreeMap<Domain, ChainState>,
    /// Hashes returned by the view.
    pub hashes: DomainHashes,
}

impl MockStateView {
    /// Create an empty view.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl SyncStateView for MockStateView {
    fn chain_states(&self) -> BTreeMap<Domain, ChainState> {
        self.chain_states.clone()
    }

    fn hashes(&self) -> DomainHashes {
        self.hashes.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_capture_restore() {
        let stores = MockStores::new();
        stores.seed("selection", serde_json::json!({"ids": [1]}));

        let snap = stores.capture("selection").unwrap();
        stores.seed("selection", serde_json::json!({"ids": []}));
        stores.restore("selection", snap).unwrap();

        assert_eq!(
            stores.value("selection"),
            Some(serde_json::json!({"ids": [1]}))
        );
    }

    #[test]
    fn test_mock_capture_unknown_store() {
        let stores = MockStores::new();
        assert!(matches!(
            stores.capture("missing"),
            Err(TxnError::SnapshotFailed { .. })
        ));
    }

    #[test]
    fn test_mock_forced_failures() {
        let stores = MockStores::new();
        stores.seed("a", serde_json::json!(1));
        stores.fail_capture_for("a");
        assert!(stores.capture("a").is_err());

        stores.fail_restore_for("a");
        assert!(stores.restore("a", serde_json::json!(2)).is_err());
    }
}
