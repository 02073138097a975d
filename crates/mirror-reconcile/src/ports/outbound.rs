//! # Outbound Ports
//!
//! Traits for external dependencies: local state containers and the backend
//! transport collaborator. Mock implementations live alongside for tests.

use crate::domain::ReconcileError;
use async_trait::async_trait;
use mirror_types::{Domain, StateDelta};
use thiserror::Error;

/// A state container rejected an operation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Container '{store}' failed: {reason}")]
pub struct ContainerError {
    /// Container/store name.
    pub store: String,
    /// Failure description.
    pub reason: String,
}

/// Local state containers - outbound port.
///
/// Containers are in-process; all operations are synchronous and atomic
/// from the caller's perspective.
pub trait StateContainers: Send + Sync {
    /// Apply one backend-authoritative delta.
    fn apply_delta(&self, delta: &StateDelta) -> Result<(), ContainerError>;

    /// Capture an opaque point-in-time snapshot of one named container.
    fn snapshot(&self, store: &str) -> Result<serde_json::Value, ContainerError>;

    /// Restore a previously captured snapshot into one named container.
    fn restore(&self, store: &str, snapshot: serde_json::Value) -> Result<(), ContainerError>;
}

/// Backend transport collaborator - outbound port.
#[async_trait]
pub trait BackendSync: Send + Sync {
    /// Request a full authoritative snapshot for one domain.
    async fn request_resync(&self, domain: Domain) -> Result<(), ReconcileError>;
}

// =============================================================================
// Mock Implementations for Testing
// =============================================================================

use std::collections::HashMap;
use std::sync::Mutex;

/// Mock state containers for testing.
#[derive(Default)]
pub struct MockContainers {
    /// Current value per store name.
    values: Mutex<HashMap<String, serde_json::Value>>,
    /// Deltas applied, in order.
    applied: Mutex<Vec<StateDelta>>,
    /// Store names whose restore should fail.
    failing_stores: Mutex<Vec<String>>,
}

impl MockContainers {
    /// Create empty mock containers.
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

    /// Overwrite a store value directly (simulates an optimistic mutation).
    pub fn mutate(&self, store: &str, value: serde_json::Value) {
        self.seed(store, value);
    }

    /// Make `restore` fail for one store.
    pub fn fail_restore_for(&self, store: &str) {
        if let Ok(mut failing) = self.failing_stores.lock() {
            failing.push(store.to_string());
        }
    }

    /// Deltas applied so far, in arrival order.
    #[must_use]
    pub fn applied(&self) -> Vec<StateDelta> {
        self.applied.lock().map(|a| a.clone()).unwrap_or_default()
    }
}

impl StateContainers for MockContainers {
    fn apply_delta(&self, delta: &StateDelta) -> Result<(), ContainerError> {
        if let Ok(mut applied) = self.applied.lock() {
            applied.push(delta.clone());
        }
        Ok(())
    }

    fn snapshot(&self, store: &str) -> Result<serde_json::Value, ContainerError> {
        self.values
            .lock()
            .ok()
            .and_then(|values| values.get(store).cloned())
            .ok_or_else(|| ContainerError {
                store: store.to_string(),
                reason: "unknown store".to_string(),
            })
    }

    fn restore(&self, store: &str, snapshot: serde_json::Value) -> Result<(), ContainerError> {
        let failing = self
            .failing_stores
            .lock()
            .map(|f| f.iter().any(|s| s == store))
            .unwrap_or(false);
        if failing {
            return Err(ContainerError {
                store: store.to_string(),
                reason: "restore failed".to_string(),
            });
        }
        self.seed(store, snapshot);
        Ok(())
    }
}

/// Mock backend for testing.
#[derive(Default)]
pub struct MockBackend {
    /// Resync requests received, in order.
    resyncs: Mutex<Vec<Domain>>,
    /// Should resync requests fail?
    pub should_fail: bool,
}

impl MockBackend {
    /// Create a mock backend that serves all requests.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resync requests received so far.
    #[must_use]
    pub fn resyncs(&self) -> Vec<Domain> {
        self.resyncs.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl BackendSync for MockBackend {
    async fn request_resync(&self, domain: Domain) -> Result<(), ReconcileError> {
        if self.should_fail {
            return Err(ReconcileError::ResyncFailed {
                domain,
                reason: "mock failure".to_string(),
            });
        }
        if let Ok(mut resyncs) = self.resyncs.lock() {
            resyncs.push(domain);
        }
        Ok(())
    }
}
