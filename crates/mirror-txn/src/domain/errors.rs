//! # Transaction Errors

use mirror_types::TransactionStatus;
use thiserror::Error;
use uuid::Uuid;

/// Errors from the transaction manager.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TxnError {
    /// No in-flight transaction has this id.
    #[error("Unknown transaction: {0}")]
    UnknownTransaction(Uuid),

    /// The status machine forbids this transition.
    #[error("Invalid transition: {from} -> {to}")]
    InvalidTransition {
        /// Current status.
        from: TransactionStatus,
        /// Requested status.
        to: TransactionStatus,
    },

    /// A container snapshot could not be captured or restored.
    #[error("Snapshot failed for store '{store}': {reason}")]
    SnapshotFailed {
        /// Container/store name.
        store: String,
        /// Failure description.
        reason: String,
    },

    /// The manager's state lock was poisoned by a panicking thread.
    #[error("Transaction state lock poisoned")]
    Poisoned,
}
