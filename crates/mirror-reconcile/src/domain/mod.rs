//! # Domain Layer
//!
//! Core validation/comparison result types, errors, and invariants.

pub mod errors;
pub mod invariants;
pub mod results;

pub use errors::ReconcileError;
pub use invariants::{invariant_ack_matches_head, invariant_continuity, invariant_depth_reset};
pub use results::{ChainAction, ChainValidation, HashComparison, HashSlot, MAX_CHAIN_DEPTH};
