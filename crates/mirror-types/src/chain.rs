//! # Chain Tracking Types
//!
//! Per-domain update chains and content hashes. Every backend mutation is
//! linked to its predecessor (`update_id` -> `prev_update_id`) within one
//! domain; cross-domain ordering is neither guaranteed nor required.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Opaque backend-issued update identifier.
pub type UpdateId = String;

/// A named partition of backend-owned state.
///
/// All chain and hash tracking is scoped per domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    /// Geometric model data.
    Geometry,
    /// Spatial arrangement of model elements.
    Arrangement,
    /// Routing paths between elements.
    Routing,
    /// Project phase state.
    Phase,
}

impl Domain {
    /// All domains, in canonical order.
    pub const ALL: [Domain; 4] = [
        Domain::Geometry,
        Domain::Arrangement,
        Domain::Routing,
        Domain::Phase,
    ];

    /// Stable string name (matches the wire representation).
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Geometry => "geometry",
            Self::Arrangement => "arrangement",
            Self::Routing => "routing",
            Self::Phase => "phase",
        }
    }
}

impl std::fmt::Display for Domain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Chain tracking state for one domain.
///
/// `chain_depth` counts updates applied since the last reset and is
/// monotonically non-decreasing until an explicit reset (full resync).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainState {
    /// Id of the last applied update (the chain head).
    pub last_update_id: Option<UpdateId>,
    /// Id of the last update acknowledged as durably applied.
    pub last_acked_id: Option<UpdateId>,
    /// Updates applied since the last reset.
    pub chain_depth: u32,
}

impl ChainState {
    /// Advance the chain head after a validated apply.
    pub fn advance(&mut self, update_id: UpdateId) {
        self.last_update_id = Some(update_id);
        self.chain_depth += 1;
    }

    /// Reset after a full resync: depth returns to 0, the new head (if any)
    /// is established by the snapshot.
    pub fn reset(&mut self, new_head: Option<UpdateId>) {
        self.last_update_id = new_head;
        self.last_acked_id = None;
        self.chain_depth = 0;
    }

    /// Acknowledge an update as durably applied.
    ///
    /// Advances `last_acked_id` only if `update_id` matches the current
    /// chain head. Returns whether the acknowledgement applied.
    pub fn acknowledge(&mut self, update_id: &UpdateId) -> bool {
        if self.last_update_id.as_ref() == Some(update_id) {
            self.last_acked_id = Some(update_id.clone());
            true
        } else {
            false
        }
    }
}

/// Per-domain content hashes plus one whole-state hash.
///
/// An empty-string hash means "not provided" and must never overwrite an
/// existing non-empty hash during merge.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainHashes {
    /// Content hash per domain. Missing entries mean "not provided".
    pub domains: BTreeMap<Domain, String>,
    /// Hash over the whole backend state.
    pub full_state: String,
}

impl DomainHashes {
    /// Get the hash for a domain, if a non-empty one is present.
    #[must_use]
    pub fn get(&self, domain: Domain) -> Option<&str> {
        self.domains
            .get(&domain)
            .map(String::as_str)
            .filter(|h| !h.is_empty())
    }

    /// Set the hash for a domain.
    pub fn set(&mut self, domain: Domain, hash: impl Into<String>) {
        self.domains.insert(domain, hash.into());
    }

    /// True if no hash (domain or whole-state) is present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.full_state.is_empty() && Domain::ALL.iter().all(|d| self.get(*d).is_none())
    }
}

/// Chain tracking metadata attached to a subset of events.
///
/// Created by the backend per mutation, consumed exactly once by the chain
/// validator, then folded into `ChainState` by the reconciler.
/// `prev_update_id = None` signals a fresh chain start, accepted
/// unconditionally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainTrackingMeta {
    /// Id of this update.
    pub update_id: UpdateId,
    /// Id of the update this one followed, or `None` for a fresh chain.
    pub prev_update_id: Option<UpdateId>,
    /// Domain this update belongs to.
    pub domain: Domain,
    /// Content hashes after this update was applied backend-side.
    pub domain_hashes: DomainHashes,
}
