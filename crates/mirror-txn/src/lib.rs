//! # Mirror Txn
//!
//! Optimistic transaction manager for local mutations that must survive
//! backend rejection.
//!
//! ## Purpose
//!
//! Before a local mutation is applied optimistically, the manager captures a
//! point-in-time snapshot of the affected state containers plus the chain and
//! hash tracking state at capture time. The transaction then walks the
//! lifecycle `Pending -> Optimistic -> Submitted -> Confirmed`, or drops to
//! `Failed -> RolledBack` at any non-terminal point, restoring the captured
//! snapshots. Rollback is all-or-nothing in intent but per-store in
//! execution: one container failing to restore never blocks the others.
//!
//! ## Module Structure
//!
//! ```text
//! mirror-txn/
//! ├── domain/          # Transaction entity, snapshot, rollback report, errors
//! ├── ports/           # Snapshot store + state view traits (outbound)
//! ├── application/     # TransactionManager
//! └── config.rs        # TxnConfig
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod application;
pub mod config;
pub mod domain;
pub mod ports;

// Re-export primary API
pub use application::TransactionManager;
pub use config::{RollbackConfig, TxnConfig};
pub use domain::{
    RollbackReport, SnapshotFailure, Transaction, TransactionRecord, TransactionSnapshot, TxnError,
};
pub use ports::{MockStateView, MockStores, SnapshotStore, SyncStateView};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
