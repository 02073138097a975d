//! # Transaction Lifecycle Types
//!
//! Status machine and the lifecycle payload emitted on the broker. The
//! transaction entity itself is owned by the transaction manager crate; only
//! the cross-subsystem pieces live here.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Transaction status machine.
///
/// `Pending -> Optimistic -> Submitted -> Confirmed` (terminal), or any
/// non-terminal status `-> Failed -> RolledBack` (terminal).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    /// Snapshot captured, mutation not yet applied.
    Pending,
    /// Optimistic mutation applied locally.
    Optimistic,
    /// Action sent to the backend, awaiting confirmation.
    Submitted,
    /// Backend confirmed; snapshot discarded.
    Confirmed,
    /// Backend rejected (or session cancelled); rollback pending or skipped.
    Failed,
    /// Snapshot restored into the affected containers.
    RolledBack,
}

impl TransactionStatus {
    /// Whether this status ends the transaction's active lifetime.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Confirmed | Self::RolledBack)
    }

    /// Whether `next` is a legal transition from this status.
    #[must_use]
    pub fn can_transition_to(&self, next: TransactionStatus) -> bool {
        use TransactionStatus::*;
        matches!(
            (self, next),
            (Pending, Optimistic)
                | (Optimistic, Submitted)
                | (Submitted, Confirmed)
                | (Pending, Failed)
                | (Optimistic, Failed)
                | (Submitted, Failed)
                | (Failed, RolledBack)
        )
    }
}

impl std::fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Optimistic => "optimistic",
            Self::Submitted => "submitted",
            Self::Confirmed => "confirmed",
            Self::Failed => "failed",
            Self::RolledBack => "rolled_back",
        };
        f.write_str(s)
    }
}

/// Lifecycle event payload published on every status transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionLifecycle {
    /// The transaction this event refers to.
    pub transaction_id: Uuid,
    /// Status after the transition.
    pub status: TransactionStatus,
    /// Failure reason, present on `Failed`/`RolledBack`.
    pub error: Option<String>,
    /// Elapsed wall time, present on terminal transitions.
    pub duration_ms: Option<u64>,
}
