//! # Optimistic Transaction End-to-End
//!
//! The transaction manager snapshotting real reconciler tracking state,
//! mutating two containers optimistically, and rolling both back exactly on
//! backend rejection, with the lifecycle observable on the shared broker.

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::sync::Arc;

    use parking_lot::Mutex;

    use mirror_bus::EventBroker;
    use mirror_reconcile::ports::{MockBackend, MockContainers};
    use mirror_reconcile::{ReconcilerConfig, StateReconciler};
    use mirror_txn::{
        MockStores, RollbackConfig, SyncStateView, TransactionManager, TxnConfig,
    };
    use mirror_types::{
        ChainState, ChainTrackingMeta, Domain, DomainHashes, EventKind, EventPayload, StateDelta,
        TransactionStatus, UiEvent,
    };

    /// Adapter exposing the reconciler's tracking state to the transaction
    /// manager as a read-only view.
    struct ReconcilerView(Arc<StateReconciler<MockContainers, MockBackend>>);

    impl SyncStateView for ReconcilerView {
        fn chain_states(&self) -> BTreeMap<Domain, ChainState> {
            self.0.chain_states()
        }

        fn hashes(&self) -> DomainHashes {
            self.0.hashes()
        }
    }

    fn geometry_event(id: &str, prev: Option<&str>, hash: &str) -> UiEvent {
        let mut domain_hashes = DomainHashes::default();
        domain_hashes.set(Domain::Geometry, hash);
        UiEvent::backend(
            EventPayload::StateChanged(StateDelta {
                domain: Domain::Geometry,
                body: serde_json::json!({ "seq": id }),
                structural: false,
            }),
            ChainTrackingMeta {
                update_id: id.to_string(),
                prev_update_id: prev.map(str::to_string),
                domain: Domain::Geometry,
                domain_hashes,
            },
        )
    }

    /// begin -> optimistic mutation over two containers -> backend rejects ->
    /// both containers restored exactly, `RolledBack` observed on the broker,
    /// snapshot carrying the reconciler's chain state at capture time.
    #[tokio::test(start_paused = true)]
    async fn test_optimistic_transaction_rolls_back_two_containers() {
        let broker = Arc::new(EventBroker::new());
        let containers = Arc::new(MockContainers::new());
        let backend = Arc::new(MockBackend::new());
        let reconciler = Arc::new(StateReconciler::new(
            ReconcilerConfig::for_testing(),
            containers,
            backend,
            broker.clone(),
        ));
        reconciler
            .ingest(geometry_event("u1", None, "g1"))
            .await
            .unwrap();

        let stores = Arc::new(MockStores::new());
        stores.seed("selection", serde_json::json!({"ids": [7, 9]}));
        stores.seed("viewport", serde_json::json!({"zoom": 1.0, "pan": [0, 0]}));

        let manager = TransactionManager::new(
            TxnConfig::for_testing(),
            stores.clone(),
            Arc::new(ReconcilerView(reconciler.clone())),
            broker.clone(),
        );

        let statuses: Arc<Mutex<Vec<TransactionStatus>>> = Arc::new(Mutex::new(Vec::new()));
        let statuses_clone = statuses.clone();
        let _sub = broker.subscribe(EventKind::Transaction, move |event| {
            if let EventPayload::TransactionLifecycle(lifecycle) = &event.payload {
                statuses_clone.lock().push(lifecycle.status);
            }
            Ok(())
        });

        let id = manager
            .begin(
                "drag selection",
                "geometry.move",
                serde_json::json!({"dx": 12, "dy": -3}),
                &["selection", "viewport"],
            )
            .unwrap();

        // The snapshot carries the live tracking state.
        let snapshot = manager.snapshot_of(id).unwrap();
        assert_eq!(
            snapshot.chain_states[&Domain::Geometry]
                .last_update_id
                .as_deref(),
            Some("u1")
        );
        assert_eq!(snapshot.hashes.get(Domain::Geometry), Some("g1"));

        // Optimistic mutation of both containers.
        manager.mark_optimistic(id).unwrap();
        stores.seed("selection", serde_json::json!({"ids": []}));
        stores.seed("viewport", serde_json::json!({"zoom": 3.5, "pan": [40, 8]}));
        manager.mark_submitted(id).unwrap();

        // Backend rejects; rollback runs immediately.
        let report = manager
            .fail(id, "500 internal server error", Some(RollbackConfig::silent()))
            .unwrap();

        assert!(report.is_clean());
        assert_eq!(
            stores.value("selection"),
            Some(serde_json::json!({"ids": [7, 9]}))
        );
        assert_eq!(
            stores.value("viewport"),
            Some(serde_json::json!({"zoom": 1.0, "pan": [0, 0]}))
        );

        use TransactionStatus::*;
        assert_eq!(
            *statuses.lock(),
            vec![Pending, Optimistic, Submitted, Failed, RolledBack]
        );
        assert_eq!(manager.in_flight_count(), 0);
        assert_eq!(
            manager.history()[0].error.as_deref(),
            Some("500 internal server error")
        );
    }

    /// Session teardown cancels in-flight transactions without touching the
    /// containers.
    #[tokio::test]
    async fn test_clear_pending_leaves_containers_alone() {
        let broker = Arc::new(EventBroker::new());
        let stores = Arc::new(MockStores::new());
        stores.seed("selection", serde_json::json!({"ids": [1]}));

        let manager = TransactionManager::new(
            TxnConfig::for_testing(),
            stores.clone(),
            Arc::new(mirror_txn::MockStateView::new()),
            broker,
        );

        let id = manager
            .begin("teardown", "noop", serde_json::Value::Null, &["selection"])
            .unwrap();
        manager.mark_optimistic(id).unwrap();
        stores.seed("selection", serde_json::json!({"ids": [2, 3]}));

        assert_eq!(manager.clear_pending(), vec![id]);
        assert_eq!(
            stores.value("selection"),
            Some(serde_json::json!({"ids": [2, 3]}))
        );
        assert_eq!(manager.history()[0].error.as_deref(), Some("Cancelled"));
    }
}
