//! # Transaction Domain
//!
//! The transaction entity, its captured snapshot, and rollback results.

pub mod errors;
pub mod transaction;

pub use errors::TxnError;
pub use transaction::{
    RollbackReport, SnapshotFailure, Transaction, TransactionRecord, TransactionSnapshot,
};
