//! # State Reconciler
//!
//! Application service orchestrating chain validation, hash tracking, and
//! debounced delta flushing. Owns all `ChainState`s and the session
//! `DomainHashes`; collaborators only read them through the API.

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, warn};

use crate::algorithms::{compare_hashes, merge_hashes, validate_link_with_depth, CycleGuard};
use crate::config::ReconcilerConfig;
use crate::domain::{ChainAction, ChainValidation, HashComparison, ReconcileError};
use crate::ports::{BackendSync, ReconcilerApi, StateContainers};
use mirror_bus::EventBroker;
use mirror_types::{
    ChainState, ChainTrackingMeta, Domain, DomainHashes, EventPayload, EventSource, ResyncReason,
    StateDelta, UiEvent, UpdateId, SCHEMA_VERSION,
};

use super::debounce::DebounceTimer;

/// Mutable session state, exclusively owned by the reconciler.
struct ReconcilerInner {
    /// Chain tracking state per domain.
    chain_states: BTreeMap<Domain, ChainState>,
    /// Tracked backend content hashes.
    hashes: DomainHashes,
    /// Second-layer duplicate-id defense.
    cycle_guard: CycleGuard,
    /// Deltas accumulated for the next flush, in arrival order.
    pending: Vec<StateDelta>,
    /// Gapped events per domain, keyed by the missing predecessor id.
    buffered: HashMap<Domain, HashMap<UpdateId, Vec<UiEvent>>>,
}

/// What one processed event asks the ingest loop to do next.
enum Step {
    /// Delta accumulated; flush now (structural) or debounce.
    Applied { structural: bool },
    /// Chain advanced but the event carried no delta payload.
    AppliedNoDelta,
    /// Event held until its predecessor arrives.
    Buffered,
    /// Domain must be re-anchored.
    Resync { domain: Domain, reason: ResyncReason },
    /// Gap buffer overflowed: re-anchor and report the loss.
    Overflow { domain: Domain, buffered: usize },
    /// Nothing to do.
    Ignored,
}

/// Reject events speaking a different schema version.
fn ensure_schema(event: &UiEvent) -> Result<(), ReconcileError> {
    if event.schema_version == SCHEMA_VERSION {
        Ok(())
    } else {
        Err(ReconcileError::SchemaMismatch {
            got: event.schema_version.clone(),
            expected: SCHEMA_VERSION.to_string(),
        })
    }
}

/// State Reconciler - the single point that turns validated backend deltas
/// into container-state mutations.
pub struct StateReconciler<C: StateContainers + 'static, B: BackendSync> {
    config: ReconcilerConfig,
    containers: Arc<C>,
    backend: Arc<B>,
    broker: Arc<EventBroker>,
    inner: Arc<Mutex<ReconcilerInner>>,
    timer: Mutex<DebounceTimer>,
}

impl<C: StateContainers + 'static, B: BackendSync> StateReconciler<C, B> {
    /// Create a reconciler with injected collaborators.
    pub fn new(
        config: ReconcilerConfig,
        containers: Arc<C>,
        backend: Arc<B>,
        broker: Arc<EventBroker>,
    ) -> Self {
        let delay = Duration::from_millis(config.debounce_ms);
        Self {
            inner: Arc::new(Mutex::new(ReconcilerInner {
                chain_states: BTreeMap::new(),
                hashes: DomainHashes::default(),
                cycle_guard: CycleGuard::with_depth(config.max_chain_depth),
                pending: Vec::new(),
                buffered: HashMap::new(),
            })),
            timer: Mutex::new(DebounceTimer::new(delay)),
            config,
            containers,
            backend,
            broker,
        }
    }

    /// Ingest one inbound event.
    ///
    /// Chain-tracked events are validated first; `apply` folds them into
    /// local state, `buffer` holds them for their predecessor, `resync`
    /// re-anchors the domain. Buffered successors are replayed in order
    /// once their predecessor lands.
    pub async fn ingest(&self, event: UiEvent) -> Result<(), ReconcileError> {
        let mut work = VecDeque::new();
        work.push_back(event);

        while let Some(event) = work.pop_front() {
            match self.process_one(event, &mut work) {
                Step::Applied { structural: true } => self.flush_now(),
                Step::Applied { structural: false } => self.arm_debounce(),
                Step::AppliedNoDelta | Step::Buffered | Step::Ignored => {}
                Step::Resync { domain, reason } => {
                    self.resync_domain(domain, reason).await?;
                }
                Step::Overflow { domain, buffered } => {
                    self.resync_domain(domain, ResyncReason::BufferOverflow)
                        .await?;
                    return Err(ReconcileError::BufferOverflow { domain, buffered });
                }
            }
        }
        Ok(())
    }

    /// Pre-check chain metadata without mutating any state.
    #[must_use]
    pub fn validate_meta(&self, meta: &ChainTrackingMeta) -> ChainValidation {
        let Ok(inner) = self.inner.lock() else {
            return ChainValidation::apply();
        };
        let state = inner
            .chain_states
            .get(&meta.domain)
            .cloned()
            .unwrap_or_default();
        validate_link_with_depth(
            &state,
            &meta.update_id,
            meta.prev_update_id.as_ref(),
            self.config.max_chain_depth,
        )
    }

    /// Compare reported hashes (e.g. recomputed by the containers) against
    /// the tracked session hashes.
    #[must_use]
    pub fn verify_hashes(&self, reported: &DomainHashes) -> HashComparison {
        let Ok(inner) = self.inner.lock() else {
            return HashComparison {
                matches: true,
                mismatches: Vec::new(),
                checked: 0,
            };
        };
        compare_hashes(&inner.hashes, reported)
    }

    /// Compare reported hashes and force a resync for every diverged domain.
    ///
    /// Returns the comparison. Divergence is never merged field-by-field;
    /// the domain is re-anchored from an authoritative snapshot.
    pub async fn reconcile_hashes(
        &self,
        reported: &DomainHashes,
    ) -> Result<HashComparison, ReconcileError> {
        let comparison = self.verify_hashes(reported);
        for slot in &comparison.mismatches {
            if let crate::domain::HashSlot::Domain(domain) = slot {
                self.resync_domain(*domain, ResyncReason::HashMismatch)
                    .await?;
            }
        }
        Ok(comparison)
    }

    /// Mark an update as durably applied (only lands on the chain head).
    pub fn acknowledge_update(&self, domain: Domain, update_id: &UpdateId) -> bool {
        let Ok(mut inner) = self.inner.lock() else {
            return false;
        };
        inner
            .chain_states
            .entry(domain)
            .or_default()
            .acknowledge(update_id)
    }

    /// Apply a full authoritative snapshot for one domain.
    ///
    /// Restores the container value, discards any buffered events, and
    /// re-anchors the chain at the snapshot's update id with depth 0. This
    /// is the landing half of a resync round-trip.
    pub fn apply_snapshot(
        &self,
        domain: Domain,
        update_id: UpdateId,
        store: &str,
        value: serde_json::Value,
    ) -> Result<(), ReconcileError> {
        self.containers
            .restore(store, value)
            .map_err(|e| ReconcileError::ContainerFailed {
                domain,
                reason: e.to_string(),
            })?;

        if let Ok(mut inner) = self.inner.lock() {
            inner.buffered.remove(&domain);
            inner.pending.retain(|delta| delta.domain != domain);
            inner
                .chain_states
                .entry(domain)
                .or_default()
                .reset(Some(update_id));
        }
        debug!(domain = %domain, store, "Authoritative snapshot applied");

        self.broker.emit(UiEvent::new(
            EventPayload::SnapshotApplied { domain },
            EventSource::Reconciler,
        ));
        Ok(())
    }

    /// Reset a domain's chain state and request a fresh snapshot.
    pub async fn force_resync(
        &self,
        domain: Domain,
        reason: ResyncReason,
    ) -> Result<(), ReconcileError> {
        self.resync_domain(domain, reason).await
    }

    /// Snapshot of all per-domain chain states.
    #[must_use]
    pub fn chain_states(&self) -> BTreeMap<Domain, ChainState> {
        self.inner
            .lock()
            .map(|inner| inner.chain_states.clone())
            .unwrap_or_default()
    }

    /// Snapshot of the tracked session hashes.
    #[must_use]
    pub fn hashes(&self) -> DomainHashes {
        self.inner
            .lock()
            .map(|inner| inner.hashes.clone())
            .unwrap_or_default()
    }

    /// Deltas currently awaiting a flush.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.inner.lock().map(|i| i.pending.len()).unwrap_or(0)
    }

    /// Gapped events currently buffered for a domain.
    #[must_use]
    pub fn buffered_count(&self, domain: Domain) -> usize {
        self.inner
            .lock()
            .map(|inner| {
                inner
                    .buffered
                    .get(&domain)
                    .map(|m| m.values().map(Vec::len).sum())
                    .unwrap_or(0)
            })
            .unwrap_or(0)
    }

    /// Flush pending deltas immediately, cancelling any armed debounce.
    pub fn flush_now(&self) {
        if let Ok(mut timer) = self.timer.lock() {
            timer.cancel();
        }
        flush_pending(&self.inner, &self.containers, &self.broker);
    }

    fn arm_debounce(&self) {
        let inner = Arc::clone(&self.inner);
        let containers = Arc::clone(&self.containers);
        let broker = Arc::clone(&self.broker);
        let Ok(mut timer) = self.timer.lock() else {
            return;
        };
        timer.arm(move || flush_pending(&inner, &containers, &broker));
    }

    /// Process one event against session state. Never awaits; replayable
    /// buffered successors are pushed onto `work`.
    fn process_one(&self, event: UiEvent, work: &mut VecDeque<UiEvent>) -> Step {
        let Some(meta) = event.chain.clone() else {
            // Not chain-tracked: accumulate the delta without bookkeeping.
            if let EventPayload::StateChanged(delta) = &event.payload {
                let structural = delta.structural;
                if let Ok(mut inner) = self.inner.lock() {
                    inner.pending.push(delta.clone());
                }
                return Step::Applied { structural };
            }
            return Step::Ignored;
        };

        if let Err(e) = ensure_schema(&event) {
            warn!(domain = %meta.domain, error = %e, "Preferring resync over apply");
            return Step::Resync {
                domain: meta.domain,
                reason: ResyncReason::SchemaMismatch,
            };
        }

        let Ok(mut inner) = self.inner.lock() else {
            return Step::Ignored;
        };

        let state = inner
            .chain_states
            .get(&meta.domain)
            .cloned()
            .unwrap_or_default();
        let validation = validate_link_with_depth(
            &state,
            &meta.update_id,
            meta.prev_update_id.as_ref(),
            self.config.max_chain_depth,
        );

        match validation.action {
            ChainAction::Apply => {
                if !inner.cycle_guard.insert(meta.update_id.clone()) {
                    warn!(
                        domain = %meta.domain,
                        update_id = %meta.update_id,
                        "Duplicate update id caught by cycle guard"
                    );
                    return Step::Resync {
                        domain: meta.domain,
                        reason: ResyncReason::Cycle,
                    };
                }

                merge_hashes(&mut inner.hashes, &meta.domain_hashes);
                inner
                    .chain_states
                    .entry(meta.domain)
                    .or_default()
                    .advance(meta.update_id.clone());

                // Replay any successors that were waiting on this update.
                let waiting = inner
                    .buffered
                    .get_mut(&meta.domain)
                    .and_then(|queue| queue.remove(&meta.update_id));
                if let Some(events) = waiting {
                    debug!(
                        domain = %meta.domain,
                        replayed = events.len(),
                        "Replaying buffered successors"
                    );
                    work.extend(events);
                }

                if let EventPayload::StateChanged(delta) = &event.payload {
                    inner.pending.push(delta.clone());
                    Step::Applied {
                        structural: delta.structural,
                    }
                } else {
                    Step::AppliedNoDelta
                }
            }
            ChainAction::Buffer => {
                let Some(prev) = meta.prev_update_id.clone() else {
                    // Unreachable: fresh chains always apply.
                    return Step::Ignored;
                };
                let queue = inner.buffered.entry(meta.domain).or_default();
                queue.entry(prev).or_default().push(event);

                let held: usize = queue.values().map(Vec::len).sum();
                if held > self.config.max_buffered_per_domain {
                    warn!(
                        domain = %meta.domain,
                        held,
                        cap = self.config.max_buffered_per_domain,
                        "Gap buffer overflow, forcing resync"
                    );
                    return Step::Overflow {
                        domain: meta.domain,
                        buffered: held,
                    };
                }
                debug!(domain = %meta.domain, held, "Event buffered awaiting predecessor");
                Step::Buffered
            }
            ChainAction::Resync => {
                let reason = if validation.has_cycle {
                    ResyncReason::Cycle
                } else {
                    ResyncReason::DepthExceeded
                };
                Step::Resync {
                    domain: meta.domain,
                    reason,
                }
            }
        }
    }

    async fn resync_domain(
        &self,
        domain: Domain,
        reason: ResyncReason,
    ) -> Result<(), ReconcileError> {
        {
            let Ok(mut inner) = self.inner.lock() else {
                return Ok(());
            };
            let discarded = inner
                .buffered
                .remove(&domain)
                .map(|queue| queue.values().map(Vec::len).sum::<usize>())
                .unwrap_or(0);
            inner.chain_states.entry(domain).or_default().reset(None);
            inner.pending.retain(|delta| delta.domain != domain);
            warn!(domain = %domain, reason = ?reason, discarded, "Resyncing domain");
        }

        self.broker.emit(UiEvent::new(
            EventPayload::ResyncRequested { domain, reason },
            EventSource::Reconciler,
        ));

        self.backend.request_resync(domain).await
    }
}

/// Single flush entry point shared by the debounce timer and the
/// structural fast path. Drains pending deltas in arrival order.
fn flush_pending<C: StateContainers>(
    inner: &Arc<Mutex<ReconcilerInner>>,
    containers: &Arc<C>,
    broker: &Arc<EventBroker>,
) {
    let deltas = {
        let Ok(mut inner) = inner.lock() else {
            return;
        };
        std::mem::take(&mut inner.pending)
    };
    if deltas.is_empty() {
        return;
    }

    let mut domains: Vec<Domain> = Vec::new();
    for delta in &deltas {
        if !domains.contains(&delta.domain) {
            domains.push(delta.domain);
        }
        if let Err(e) = containers.apply_delta(delta) {
            warn!(domain = %delta.domain, error = %e, "Container rejected delta");
        }
    }

    debug!(deltas = deltas.len(), domains = ?domains, "Reconciliation flush");
    broker.emit(UiEvent::new(
        EventPayload::FlushCompleted {
            domains,
            delta_count: deltas.len(),
        },
        EventSource::Reconciler,
    ));
}

#[async_trait]
impl<C: StateContainers + 'static, B: BackendSync> ReconcilerApi for StateReconciler<C, B> {
    async fn ingest(&self, event: UiEvent) -> Result<(), ReconcileError> {
        StateReconciler::ingest(self, event).await
    }

    fn validate_meta(&self, meta: &ChainTrackingMeta) -> ChainValidation {
        StateReconciler::validate_meta(self, meta)
    }

    fn verify_hashes(&self, reported: &DomainHashes) -> HashComparison {
        StateReconciler::verify_hashes(self, reported)
    }

    fn acknowledge_update(&self, domain: Domain, update_id: &UpdateId) -> bool {
        StateReconciler::acknowledge_update(self, domain, update_id)
    }

    async fn force_resync(
        &self,
        domain: Domain,
        reason: ResyncReason,
    ) -> Result<(), ReconcileError> {
        StateReconciler::force_resync(self, domain, reason).await
    }

    fn chain_states(&self) -> BTreeMap<Domain, ChainState> {
        StateReconciler::chain_states(self)
    }

    fn hashes(&self) -> DomainHashes {
        StateReconciler::hashes(self)
    }
}
