//! # Transaction Entity
//!
//! A transaction is a snapshot plus a status. The snapshot is captured
//! before any optimistic mutation and discarded on confirmation; it is the
//! only thing rollback needs.

use mirror_types::{ChainState, Domain, DomainHashes, TransactionStatus};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Point-in-time capture of everything a rollback must restore, plus the
/// tracking state at capture time for post-rollback diagnostics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionSnapshot {
    /// Per-domain chain tracking state at capture time.
    pub chain_states: BTreeMap<Domain, ChainState>,
    /// Tracked session hashes at capture time.
    pub hashes: DomainHashes,
    /// Captured container values, in capture order.
    pub stores: Vec<(String, serde_json::Value)>,
}

/// An in-flight optimistic transaction.
#[derive(Debug, Clone)]
pub struct Transaction {
    /// Unique id, assigned at begin.
    pub id: Uuid,
    /// Human-readable description for logs and history.
    pub description: String,
    /// What kind of backend action this transaction wraps.
    pub action_type: String,
    /// Opaque action payload, forwarded to the backend by the caller.
    pub action_payload: serde_json::Value,
    /// Current lifecycle status.
    pub status: TransactionStatus,
    /// Failure reason, set on `Failed`.
    pub error: Option<String>,
    /// Submission attempts recorded against this transaction.
    pub retry_count: u32,
    /// Snapshot captured at begin. Never mutated after capture.
    pub snapshot: TransactionSnapshot,
    /// Wall-clock begin time, milliseconds since the Unix epoch.
    pub created_at_ms: u64,
    /// Last transition time.
    pub updated_at_ms: u64,
}

impl Transaction {
    /// Elapsed wall time since begin, in milliseconds.
    #[must_use]
    pub fn elapsed_ms(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.created_at_ms)
    }
}

/// Compact record of a finished transaction, kept in the bounded history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionRecord {
    /// The finished transaction.
    pub transaction_id: Uuid,
    /// Description given at begin.
    pub description: String,
    /// Action type given at begin.
    pub action_type: String,
    /// Final status.
    pub status: TransactionStatus,
    /// Failure reason, if any.
    pub error: Option<String>,
    /// Submission attempts recorded.
    pub retry_count: u32,
    /// Total lifetime in milliseconds.
    pub duration_ms: u64,
}

/// One store that failed to restore during rollback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotFailure {
    /// Container/store name.
    pub store: String,
    /// Failure description.
    pub reason: String,
}

/// Outcome of a rollback: which stores restored, which did not.
///
/// A failed restore never aborts the rollback; the remaining stores are
/// still restored and the failure is reported here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RollbackReport {
    /// The rolled-back transaction.
    pub transaction_id: Uuid,
    /// Stores whose snapshot was restored.
    pub restored: Vec<String>,
    /// Stores whose restore failed.
    pub failures: Vec<SnapshotFailure>,
}

impl RollbackReport {
    /// Whether every captured store restored cleanly.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transaction() -> Transaction {
        Transaction {
            id: Uuid::new_v4(),
            description: "move nodes".to_string(),
            action_type: "geometry.move".to_string(),
            action_payload: serde_json::json!({"dx": 4}),
            status: TransactionStatus::Pending,
            error: None,
            retry_count: 0,
            snapshot: TransactionSnapshot {
                chain_states: BTreeMap::new(),
                hashes: DomainHashes::default(),
                stores: Vec::new(),
            },
            created_at_ms: 1_000,
            updated_at_ms: 1_000,
        }
    }

    #[test]
    fn test_elapsed_saturates() {
        let tx = transaction();
        assert_eq!(tx.elapsed_ms(1_250), 250);
        // Clock skew never underflows.
        assert_eq!(tx.elapsed_ms(900), 0);
    }

    #[test]
    fn test_rollback_report_cleanliness() {
        let clean = RollbackReport {
            transaction_id: Uuid::new_v4(),
            restored: vec!["selection".to_string()],
            failures: Vec::new(),
        };
        assert!(clean.is_clean());

        let dirty = RollbackReport {
            failures: vec![SnapshotFailure {
                store: "viewport".to_string(),
                reason: "store detached".to_string(),
            }],
            ..clean
        };
        assert!(!dirty.is_clean());
    }
}
