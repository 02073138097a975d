//! # Algorithms
//!
//! Pure functions for chain link validation and hash tracking, plus the
//! bounded cycle guard. No I/O, no clock, no locks.

pub mod chain_validation;
pub mod cycle_guard;
pub mod hash_tracking;

pub use chain_validation::{validate_link, validate_link_with_depth};
pub use cycle_guard::CycleGuard;
pub use hash_tracking::{compare_hashes, merge_hashes};
