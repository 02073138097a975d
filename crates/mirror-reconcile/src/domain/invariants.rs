//! # Domain Invariants
//!
//! Business rules that must always hold for chain tracking.

use mirror_types::{ChainState, UpdateId};

/// Invariant: continuity holds when the update's predecessor is exactly the
/// current chain head.
#[must_use]
pub fn invariant_continuity(prev_update_id: Option<&UpdateId>, head: Option<&UpdateId>) -> bool {
    prev_update_id == head
}

/// Invariant: an acknowledgement may only land on the current chain head.
#[must_use]
pub fn invariant_ack_matches_head(state: &ChainState, update_id: &UpdateId) -> bool {
    state.last_update_id.as_ref() == Some(update_id)
}

/// Invariant: chain depth is monotonically non-decreasing between resets;
/// a reset (and only a reset) may return it to zero.
#[must_use]
pub fn invariant_depth_reset(depth_before: u32, depth_after: u32) -> bool {
    depth_after >= depth_before || depth_after == 0
}
