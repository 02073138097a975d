//! # Mirror Types Crate
//!
//! This crate contains all domain types shared across the synchronization
//! subsystems: domain partitions, per-domain chain tracking, content hashes,
//! the `UiEvent` tagged union, and transaction/fault lifecycle payloads.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: All cross-subsystem types are defined here.
//! - **Closed payload union**: Event payloads are a tagged enum, not opaque
//!   values dispatched by string tag, so dispatch is exhaustive at compile
//!   time.
//! - **Opaque backend artifacts**: Update ids, content hashes, snapshot blobs
//!   and delta bodies are never interpreted by this crate.

pub mod chain;
pub mod events;
pub mod fault;
pub mod transaction;

pub use chain::*;
pub use events::*;
pub use fault::*;
pub use transaction::*;

/// Schema version carried by every event and transaction.
///
/// A producer/consumer mismatch is treated as a reason to prefer a full
/// resync over applying the event.
pub const SCHEMA_VERSION: &str = "1.0";
