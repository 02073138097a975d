//! # Event Flow Integration
//!
//! Broker and reconciler working together: debounced flushing end-to-end,
//! out-of-order delivery with buffering and replay, forced resyncs, and the
//! broker's pause/replay gate.

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use parking_lot::Mutex;
    use rand::seq::SliceRandom;

    use mirror_bus::EventBroker;
    use mirror_reconcile::ports::{MockBackend, MockContainers};
    use mirror_reconcile::{ReconcilerConfig, StateReconciler};
    use mirror_types::{
        ChainTrackingMeta, Domain, DomainHashes, EventKind, EventPayload, EventSource,
        ResyncReason, StateDelta, UiEvent,
    };

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    fn reconciler() -> (
        Arc<StateReconciler<MockContainers, MockBackend>>,
        Arc<MockContainers>,
        Arc<MockBackend>,
        Arc<EventBroker>,
    ) {
        let containers = Arc::new(MockContainers::new());
        let backend = Arc::new(MockBackend::new());
        let broker = Arc::new(EventBroker::new());
        let service = Arc::new(StateReconciler::new(
            ReconcilerConfig::for_testing(),
            containers.clone(),
            backend.clone(),
            broker.clone(),
        ));
        (service, containers, backend, broker)
    }

    fn chained_event(domain: Domain, id: &str, prev: Option<&str>) -> UiEvent {
        UiEvent::backend(
            EventPayload::StateChanged(StateDelta {
                domain,
                body: serde_json::json!({ "seq": id }),
                structural: false,
            }),
            ChainTrackingMeta {
                update_id: id.to_string(),
                prev_update_id: prev.map(str::to_string),
                domain,
                domain_hashes: DomainHashes::default(),
            },
        )
    }

    fn applied_sequence(containers: &MockContainers) -> Vec<String> {
        containers
            .applied()
            .iter()
            .map(|d| d.body["seq"].as_str().unwrap_or_default().to_string())
            .collect()
    }

    // =============================================================================
    // DEBOUNCED FLUSH
    // =============================================================================

    /// A burst of events inside one debounce window produces exactly one
    /// flush, carrying every delta in arrival order.
    #[tokio::test(start_paused = true)]
    async fn test_burst_flushes_once_through_broker() {
        let (service, containers, _, broker) = reconciler();

        let flushes: Arc<Mutex<Vec<usize>>> = Arc::new(Mutex::new(Vec::new()));
        let flushes_clone = flushes.clone();
        let _sub = broker.subscribe(EventKind::Flush, move |event| {
            if let EventPayload::FlushCompleted { delta_count, .. } = &event.payload {
                flushes_clone.lock().push(*delta_count);
            }
            Ok(())
        });

        let mut prev: Option<String> = None;
        for i in 0..10 {
            let id = format!("u{i}");
            service
                .ingest(chained_event(Domain::Geometry, &id, prev.as_deref()))
                .await
                .unwrap();
            prev = Some(id);
        }

        tokio::time::sleep(Duration::from_millis(200)).await;

        assert_eq!(*flushes.lock(), vec![10]);
        let expected: Vec<String> = (0..10).map(|i| format!("u{i}")).collect();
        assert_eq!(applied_sequence(&containers), expected);
    }

    // =============================================================================
    // OUT-OF-ORDER DELIVERY
    // =============================================================================

    /// Successors arriving before their predecessor are buffered, then the
    /// whole chain replays in chain order once the predecessor lands - no
    /// matter what order the tail arrived in.
    #[tokio::test(start_paused = true)]
    async fn test_gap_buffer_then_replay_in_chain_order() {
        let containers = Arc::new(MockContainers::new());
        let backend = Arc::new(MockBackend::new());
        let broker = Arc::new(EventBroker::new());
        // Default config: the 9-deep tail fits the gap buffer.
        let service = StateReconciler::new(
            ReconcilerConfig {
                debounce_ms: 20,
                ..ReconcilerConfig::default()
            },
            containers.clone(),
            backend.clone(),
            broker,
        );

        // u2..u10 in random order, u1 withheld.
        let mut tail: Vec<usize> = (2..=10).collect();
        tail.shuffle(&mut rand::thread_rng());
        for i in tail {
            let prev = format!("u{}", i - 1);
            service
                .ingest(chained_event(Domain::Routing, &format!("u{i}"), Some(&prev)))
                .await
                .unwrap();
        }
        assert!(containers.applied().is_empty());
        assert!(backend.resyncs().is_empty());

        // The missing head arrives; everything cascades behind it.
        service
            .ingest(chained_event(Domain::Routing, "u1", None))
            .await
            .unwrap();

        let state = &service.chain_states()[&Domain::Routing];
        assert_eq!(state.last_update_id.as_deref(), Some("u10"));
        assert_eq!(state.chain_depth, 10);

        tokio::time::sleep(Duration::from_millis(100)).await;
        let expected: Vec<String> = (1..=10).map(|i| format!("u{i}")).collect();
        assert_eq!(applied_sequence(&containers), expected);
    }

    // =============================================================================
    // FORCED RESYNC
    // =============================================================================

    /// A duplicate head id is a cycle: the domain is reset and a resync
    /// lands on the backend, with the reason visible on the broker.
    #[tokio::test(start_paused = true)]
    async fn test_duplicate_head_requests_backend_resync() {
        let (service, _, backend, broker) = reconciler();

        let reasons: Arc<Mutex<Vec<ResyncReason>>> = Arc::new(Mutex::new(Vec::new()));
        let reasons_clone = reasons.clone();
        let _sub = broker.subscribe(EventKind::Resync, move |event| {
            if let EventPayload::ResyncRequested { reason, .. } = &event.payload {
                reasons_clone.lock().push(*reason);
            }
            Ok(())
        });

        service
            .ingest(chained_event(Domain::Geometry, "u1", None))
            .await
            .unwrap();
        service
            .ingest(chained_event(Domain::Geometry, "u1", None))
            .await
            .unwrap();

        assert_eq!(backend.resyncs(), vec![Domain::Geometry]);
        assert_eq!(*reasons.lock(), vec![ResyncReason::Cycle]);
        assert!(service.chain_states()[&Domain::Geometry]
            .last_update_id
            .is_none());
    }

    // =============================================================================
    // PAUSE / REPLAY
    // =============================================================================

    /// Events emitted while the broker is paused queue up and replay in
    /// FIFO order on resume.
    #[tokio::test]
    async fn test_pause_resume_preserves_fifo_order() {
        let broker = EventBroker::new();

        let seen: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = seen.clone();
        let _sub = broker.subscribe_all(move |event| {
            if let EventPayload::StateChanged(delta) = &event.payload {
                seen_clone
                    .lock()
                    .push(delta.body["seq"].as_str().unwrap_or_default().to_string());
            }
            Ok(())
        });

        broker.pause();
        for i in 0..5 {
            let delivered = broker.emit(UiEvent::new(
                EventPayload::StateChanged(StateDelta {
                    domain: Domain::Phase,
                    body: serde_json::json!({ "seq": format!("e{i}") }),
                    structural: false,
                }),
                EventSource::System,
            ));
            assert_eq!(delivered, 0);
        }
        assert!(seen.lock().is_empty());

        broker.resume();
        let expected: Vec<String> = (0..5).map(|i| format!("e{i}")).collect();
        assert_eq!(*seen.lock(), expected);
    }
}
