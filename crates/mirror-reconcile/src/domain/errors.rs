//! # Domain Errors
//!
//! Error types for the reconciler. Chain-level anomalies (gap, cycle, depth)
//! are *not* errors: they are signaled through `ChainAction` and handled by
//! requesting fresh state, never by failing the session.

use mirror_types::Domain;
use thiserror::Error;

/// Reconciler error types.
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// Event carried an incompatible schema version.
    #[error("Schema mismatch: got {got}, expected {expected}")]
    SchemaMismatch {
        /// Version carried by the event.
        got: String,
        /// Version this core speaks.
        expected: String,
    },

    /// A state container rejected a delta or snapshot restore.
    #[error("Container failure for {domain}: {reason}")]
    ContainerFailed {
        /// Domain whose container failed.
        domain: Domain,
        /// Failure description.
        reason: String,
    },

    /// The backend collaborator could not serve a resync request.
    #[error("Resync failed for {domain}: {reason}")]
    ResyncFailed {
        /// Domain being re-anchored.
        domain: Domain,
        /// Failure description.
        reason: String,
    },

    /// Too many gapped events buffered for one domain.
    #[error("Buffer overflow for {domain}: {buffered} events held")]
    BufferOverflow {
        /// Overflowing domain.
        domain: Domain,
        /// Events held at overflow time.
        buffered: usize,
    },
}
