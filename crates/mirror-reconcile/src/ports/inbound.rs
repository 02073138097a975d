//! # Inbound Ports
//!
//! The API surface the reconciler exposes to collaborators (transport glue,
//! transaction manager, UI).

use crate::domain::{ChainValidation, HashComparison, ReconcileError};
use async_trait::async_trait;
use mirror_types::{ChainState, ChainTrackingMeta, Domain, DomainHashes, ResyncReason, UiEvent, UpdateId};
use std::collections::BTreeMap;

/// Reconciler API - inbound port.
#[async_trait]
pub trait ReconcilerApi: Send + Sync {
    /// Ingest one inbound event (chain-tracked or not).
    async fn ingest(&self, event: UiEvent) -> Result<(), ReconcileError>;

    /// Pre-check chain metadata without mutating any state.
    fn validate_meta(&self, meta: &ChainTrackingMeta) -> ChainValidation;

    /// Compare reported hashes against the tracked session hashes.
    fn verify_hashes(&self, reported: &DomainHashes) -> HashComparison;

    /// Mark an update as durably applied. Returns whether the
    /// acknowledgement landed (it only does on the current chain head).
    fn acknowledge_update(&self, domain: Domain, update_id: &UpdateId) -> bool;

    /// Reset a domain's chain state and request a fresh snapshot.
    async fn force_resync(&self, domain: Domain, reason: ResyncReason)
        -> Result<(), ReconcileError>;

    /// Snapshot of all per-domain chain states (read-only; used for
    /// transaction snapshot capture).
    fn chain_states(&self) -> BTreeMap<Domain, ChainState>;

    /// Snapshot of the tracked session hashes.
    fn hashes(&self) -> DomainHashes;
}
