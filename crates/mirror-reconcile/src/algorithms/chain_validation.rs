//! # Chain Link Validation
//!
//! Decides, from one domain's chain state alone, what to do with an incoming
//! update. Evaluation order matters and is part of the contract:
//!
//! 1. cycle (update id already at the head),
//! 2. fresh chain (`prev_update_id = None`, accepted unconditionally),
//! 3. depth cap (resync regardless of gap status),
//! 4. continuity (gap -> buffer),
//! 5. apply.

use crate::domain::{invariant_continuity, ChainValidation, MAX_CHAIN_DEPTH};
use mirror_types::{ChainState, UpdateId};

/// Validate one update against a domain's chain state.
///
/// Pure: the caller folds the result into `ChainState` itself. An update
/// must never be reprocessed once it is the chain head, so the cycle check
/// runs before everything else, including the fresh-chain acceptance.
#[must_use]
pub fn validate_link(
    state: &ChainState,
    update_id: &UpdateId,
    prev_update_id: Option<&UpdateId>,
) -> ChainValidation {
    validate_link_with_depth(state, update_id, prev_update_id, MAX_CHAIN_DEPTH)
}

/// `validate_link` with an explicit depth cap (tests and custom configs).
#[must_use]
pub fn validate_link_with_depth(
    state: &ChainState,
    update_id: &UpdateId,
    prev_update_id: Option<&UpdateId>,
    max_depth: u32,
) -> ChainValidation {
    if state.last_update_id.as_ref() == Some(update_id) {
        return ChainValidation::cycle();
    }

    if prev_update_id.is_none() {
        return ChainValidation::apply();
    }

    if state.chain_depth + 1 >= max_depth {
        return ChainValidation::depth_exceeded();
    }

    if !invariant_continuity(prev_update_id, state.last_update_id.as_ref()) {
        return ChainValidation::gap();
    }

    ChainValidation::apply()
}
