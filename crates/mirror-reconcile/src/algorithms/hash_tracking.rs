//! # Hash Tracking
//!
//! Per-domain content-hash comparison and non-destructive merge. An empty
//! hash means "not provided": it is never checked and never overwrites.
//! Because merges only touch provided fields, repeated partial merges are
//! commutative with respect to the fields they do not touch.

use crate::domain::{HashComparison, HashSlot};
use mirror_types::{Domain, DomainHashes};

/// Compare `incoming` hashes against `current`.
///
/// Only fields present (non-empty) in `incoming` are evaluated; absent
/// fields are neither checked nor considered mismatches.
#[must_use]
pub fn compare_hashes(current: &DomainHashes, incoming: &DomainHashes) -> HashComparison {
    let mut mismatches = Vec::new();
    let mut checked = 0;

    for domain in Domain::ALL {
        let Some(incoming_hash) = incoming.get(domain) else {
            continue;
        };
        checked += 1;
        if current.get(domain) != Some(incoming_hash) {
            mismatches.push(HashSlot::Domain(domain));
        }
    }

    if !incoming.full_state.is_empty() {
        checked += 1;
        if current.full_state != incoming.full_state {
            mismatches.push(HashSlot::FullState);
        }
    }

    HashComparison {
        matches: mismatches.is_empty(),
        mismatches,
        checked,
    }
}

/// Merge `incoming` into `current`, non-destructively.
///
/// For each field, the incoming value replaces the current one only if it
/// is non-empty; otherwise the current value is retained.
pub fn merge_hashes(current: &mut DomainHashes, incoming: &DomainHashes) {
    for domain in Domain::ALL {
        if let Some(hash) = incoming.get(domain) {
            current.set(domain, hash.to_string());
        }
    }
    if !incoming.full_state.is_empty() {
        current.full_state = incoming.full_state.clone();
    }
}
