//! # Mirror Reconcile
//!
//! The single point that turns validated backend deltas into container-state
//! mutations, and that owns all chain/hash state for the session.
//!
//! ## Purpose
//!
//! Keep the local state mirror consistent with the authoritative backend
//! under an unordered, at-least-once event stream:
//! - per-domain update chains are validated for continuity, cycles and depth;
//! - per-domain content hashes are merged non-destructively and compared to
//!   detect divergence;
//! - validated deltas are debounced and flushed as one reconciliation pass;
//! - on irreconcilable divergence the domain is re-anchored via a full
//!   resync, never by field-level merge.
//!
//! ## Module Structure
//!
//! ```text
//! mirror-reconcile/
//! ├── domain/          # Core types: ChainValidation, HashComparison, errors
//! ├── algorithms/      # Link validation, cycle guard, hash compare/merge
//! ├── ports/           # API trait (inbound) + dependency traits (outbound)
//! ├── application/     # StateReconciler + debounce timer
//! └── config.rs        # ReconcilerConfig
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod algorithms;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;

// Re-exports
pub use algorithms::{compare_hashes, merge_hashes, validate_link, CycleGuard};
pub use application::{DebounceTimer, StateReconciler};
pub use config::ReconcilerConfig;
pub use domain::{
    ChainAction, ChainValidation, HashComparison, HashSlot, ReconcileError, MAX_CHAIN_DEPTH,
};
pub use ports::{BackendSync, MockBackend, MockContainers, ReconcilerApi, StateContainers};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    #[test]
    fn test_version() {
        assert!(!super::VERSION.is_empty());
    }
}
