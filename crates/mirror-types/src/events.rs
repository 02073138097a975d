//! # UI Events
//!
//! The `UiEvent` envelope and its closed payload union. Every event that
//! flows through the broker is one of these; dispatch over payloads is
//! exhaustive by construction.

use crate::chain::{ChainTrackingMeta, Domain};
use crate::fault::FaultNotice;
use crate::transaction::TransactionLifecycle;
use crate::SCHEMA_VERSION;
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Provenance of an event, used for routing and avoiding feedback loops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventSource {
    /// Direct user action.
    User,
    /// Delivered by the backend transport.
    Backend,
    /// Internal bookkeeping (session lifecycle etc.).
    System,
    /// Emitted by the state reconciler itself.
    Reconciler,
}

/// Why a resync was requested for a domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResyncReason {
    /// Duplicate update id observed at the chain head.
    Cycle,
    /// Chain grew past the depth cap without a full resync.
    DepthExceeded,
    /// Too many gapped events buffered for the domain.
    BufferOverflow,
    /// Event carried an incompatible schema version.
    SchemaMismatch,
    /// Local content hash diverged from the backend's.
    HashMismatch,
    /// Explicitly requested by a caller.
    Requested,
}

/// A state change for one domain.
///
/// The body is opaque to the synchronization core; `structural` marks deltas
/// that must flush immediately, bypassing the debounce window (e.g. a full
/// geometry replace or a phase transition).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateDelta {
    /// Domain the delta applies to.
    pub domain: Domain,
    /// Opaque delta body, applied by the domain's state container.
    pub body: serde_json::Value,
    /// Structurally significant: flush immediately.
    #[serde(default)]
    pub structural: bool,
}

/// All event payloads that can flow through the broker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventPayload {
    /// Backend-authoritative or optimistic state change.
    StateChanged(StateDelta),

    /// A full authoritative snapshot was applied for a domain.
    SnapshotApplied {
        /// Domain that was re-anchored.
        domain: Domain,
    },

    /// The reconciler requested a full snapshot for a domain.
    ResyncRequested {
        /// Domain being resynced.
        domain: Domain,
        /// Why the resync was triggered.
        reason: ResyncReason,
    },

    /// The reconciler flushed accumulated deltas into the state containers.
    FlushCompleted {
        /// Domains touched by the flush.
        domains: Vec<Domain>,
        /// Number of deltas applied.
        delta_count: usize,
    },

    /// Transaction lifecycle transition.
    TransactionLifecycle(TransactionLifecycle),

    /// A classified, user-visible fault.
    FaultRaised(FaultNotice),
}

/// Event kinds for subscription filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// State delta events.
    StateChanged,
    /// Full snapshot applications.
    Snapshot,
    /// Resync requests.
    Resync,
    /// Reconciliation flushes.
    Flush,
    /// Transaction lifecycle events.
    Transaction,
    /// Classified faults.
    Fault,
}

/// The event envelope distributed by the broker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UiEvent {
    /// Typed payload.
    pub payload: EventPayload,
    /// Producer schema version; a mismatch prefers resync over apply.
    pub schema_version: String,
    /// Milliseconds since the Unix epoch.
    pub timestamp_ms: u64,
    /// Provenance.
    pub source: EventSource,
    /// Correlates request/response pairs across collaborators.
    pub correlation_id: Option<String>,
    /// Chain tracking metadata, present on chain-tracked backend events.
    pub chain: Option<ChainTrackingMeta>,
}

impl UiEvent {
    /// Create an event with the current schema version and timestamp.
    #[must_use]
    pub fn new(payload: EventPayload, source: EventSource) -> Self {
        Self {
            payload,
            schema_version: SCHEMA_VERSION.to_string(),
            timestamp_ms: now_ms(),
            source,
            correlation_id: None,
            chain: None,
        }
    }

    /// Create a chain-tracked backend event.
    #[must_use]
    pub fn backend(payload: EventPayload, chain: ChainTrackingMeta) -> Self {
        Self {
            chain: Some(chain),
            ..Self::new(payload, EventSource::Backend)
        }
    }

    /// Create a locally-originated event.
    #[must_use]
    pub fn local(payload: EventPayload) -> Self {
        Self::new(payload, EventSource::User)
    }

    /// Create an event raised by internal machinery rather than the user.
    #[must_use]
    pub fn system(payload: EventPayload) -> Self {
        Self::new(payload, EventSource::System)
    }

    /// Attach a correlation id.
    #[must_use]
    pub fn with_correlation(mut self, correlation_id: impl Into<String>) -> Self {
        self.correlation_id = Some(correlation_id.into());
        self
    }

    /// Get the kind of this event (for subscription filtering).
    #[must_use]
    pub fn kind(&self) -> EventKind {
        match &self.payload {
            EventPayload::StateChanged(_) => EventKind::StateChanged,
            EventPayload::SnapshotApplied { .. } => EventKind::Snapshot,
            EventPayload::ResyncRequested { .. } => EventKind::Resync,
            EventPayload::FlushCompleted { .. } => EventKind::Flush,
            EventPayload::TransactionLifecycle(_) => EventKind::Transaction,
            EventPayload::FaultRaised(_) => EventKind::Fault,
        }
    }

    /// Domain carried by the chain metadata, if any.
    #[must_use]
    pub fn chain_domain(&self) -> Option<Domain> {
        self.chain.as_ref().map(|c| c.domain)
    }
}

/// Current Unix timestamp in milliseconds.
#[must_use]
pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::DomainHashes;

    fn delta(domain: Domain) -> StateDelta {
        StateDelta {
            domain,
            body: serde_json::json!({"op": "move"}),
            structural: false,
        }
    }

    #[test]
    fn test_event_kind_mapping() {
        let event = UiEvent::local(EventPayload::StateChanged(delta(Domain::Geometry)));
        assert_eq!(event.kind(), EventKind::StateChanged);

        let event = UiEvent::local(EventPayload::ResyncRequested {
            domain: Domain::Phase,
            reason: ResyncReason::Cycle,
        });
        assert_eq!(event.kind(), EventKind::Resync);
    }

    #[test]
    fn test_backend_event_carries_chain_domain() {
        let meta = ChainTrackingMeta {
            update_id: "u1".to_string(),
            prev_update_id: None,
            domain: Domain::Routing,
            domain_hashes: DomainHashes::default(),
        };
        let event = UiEvent::backend(EventPayload::StateChanged(delta(Domain::Routing)), meta);

        assert_eq!(event.source, EventSource::Backend);
        assert_eq!(event.chain_domain(), Some(Domain::Routing));
        assert_eq!(event.schema_version, SCHEMA_VERSION);
    }

    #[test]
    fn test_local_event_has_no_chain() {
        let event = UiEvent::local(EventPayload::StateChanged(delta(Domain::Geometry)));
        assert!(event.chain.is_none());
        assert_eq!(event.source, EventSource::User);
    }

    #[test]
    fn test_system_event_source() {
        let event = UiEvent::system(EventPayload::StateChanged(delta(Domain::Geometry)));
        assert!(event.chain.is_none());
        assert_eq!(event.source, EventSource::System);
    }

    #[test]
    fn test_with_correlation() {
        let event = UiEvent::local(EventPayload::SnapshotApplied {
            domain: Domain::Phase,
        })
        .with_correlation("req-7");
        assert_eq!(event.correlation_id.as_deref(), Some("req-7"));
    }

    #[test]
    fn test_payload_serde_round_trip() {
        let event = UiEvent::local(EventPayload::FlushCompleted {
            domains: vec![Domain::Geometry, Domain::Routing],
            delta_count: 3,
        });
        let json = serde_json::to_string(&event).unwrap();
        let back: UiEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }
}
