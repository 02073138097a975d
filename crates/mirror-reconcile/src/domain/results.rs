//! # Validation Results
//!
//! Synchronous result types returned to any caller needing to pre-check an
//! event before dispatching it.

use mirror_types::Domain;
use serde::{Deserialize, Serialize};

/// Maximum updates a chain may accumulate between full resyncs.
///
/// Chains are cheap to re-anchor; the cap bounds how stale a never-resynced
/// session can get.
pub const MAX_CHAIN_DEPTH: u32 = 100;

/// What the caller should do with a chain-tracked event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChainAction {
    /// Continuity holds: fold the update into local state.
    Apply,
    /// Missing predecessor: hold the event until it is observed.
    Buffer,
    /// Chain is unrecoverable locally: request a fresh snapshot.
    Resync,
}

/// Result of validating one update against a domain's chain state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainValidation {
    /// The update can be applied as-is.
    pub is_valid: bool,
    /// The update's predecessor is not the current chain head.
    pub has_gap: bool,
    /// The update id is already the chain head (duplicate delivery).
    pub has_cycle: bool,
    /// Applying would exceed the chain depth cap.
    pub depth_exceeded: bool,
    /// What to do with the event.
    pub action: ChainAction,
}

impl ChainValidation {
    /// A clean apply.
    #[must_use]
    pub fn apply() -> Self {
        Self {
            is_valid: true,
            has_gap: false,
            has_cycle: false,
            depth_exceeded: false,
            action: ChainAction::Apply,
        }
    }

    /// Missing predecessor.
    #[must_use]
    pub fn gap() -> Self {
        Self {
            is_valid: false,
            has_gap: true,
            has_cycle: false,
            depth_exceeded: false,
            action: ChainAction::Buffer,
        }
    }

    /// Duplicate chain head.
    #[must_use]
    pub fn cycle() -> Self {
        Self {
            is_valid: false,
            has_gap: false,
            has_cycle: true,
            depth_exceeded: false,
            action: ChainAction::Resync,
        }
    }

    /// Depth cap reached.
    #[must_use]
    pub fn depth_exceeded() -> Self {
        Self {
            is_valid: false,
            has_gap: false,
            has_cycle: false,
            depth_exceeded: true,
            action: ChainAction::Resync,
        }
    }
}

/// Which hash slot diverged during comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HashSlot {
    /// A per-domain content hash.
    Domain(Domain),
    /// The whole-state hash.
    FullState,
}

/// Result of comparing two hash sets.
///
/// Only non-empty incoming fields are evaluated; absent fields are neither
/// checked nor counted as mismatches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HashComparison {
    /// No checked field diverged.
    pub matches: bool,
    /// Slots that diverged.
    pub mismatches: Vec<HashSlot>,
    /// Number of fields actually compared.
    pub checked: usize,
}
