//! # Transaction Manager
//!
//! Tracks every in-flight optimistic transaction, validates each status
//! transition against the status machine, and publishes a lifecycle event
//! for every transition. The most recently begun transaction is the active
//! (UI-focus) one; any number may be pending concurrently.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::{RollbackConfig, TxnConfig};
use crate::domain::{
    RollbackReport, SnapshotFailure, Transaction, TransactionRecord, TransactionSnapshot, TxnError,
};
use crate::ports::{SnapshotStore, SyncStateView};
use mirror_bus::EventBroker;
use mirror_types::{
    now_ms, EventPayload, FaultCode, FaultNotice, Severity, TransactionLifecycle,
    TransactionStatus, UiEvent,
};

struct ManagerInner {
    in_flight: HashMap<Uuid, Transaction>,
    active_id: Option<Uuid>,
    history: VecDeque<TransactionRecord>,
}

/// Transaction Manager - owns every in-flight transaction and its snapshot.
pub struct TransactionManager<S: SnapshotStore, V: SyncStateView> {
    config: TxnConfig,
    stores: Arc<S>,
    view: Arc<V>,
    broker: Arc<EventBroker>,
    inner: Mutex<ManagerInner>,
}

impl<S: SnapshotStore, V: SyncStateView> TransactionManager<S, V> {
    /// Create a manager with injected collaborators.
    pub fn new(config: TxnConfig, stores: Arc<S>, view: Arc<V>, broker: Arc<EventBroker>) -> Self {
        Self {
            config,
            stores,
            view,
            broker,
            inner: Mutex::new(ManagerInner {
                in_flight: HashMap::new(),
                active_id: None,
                history: VecDeque::new(),
            }),
        }
    }

    /// Begin a transaction: capture the snapshot, then hand back the id.
    ///
    /// The snapshot covers exactly the named stores, in the given order.
    /// Capture is all-or-nothing; if any store fails to capture, nothing
    /// is registered.
    pub fn begin(
        &self,
        description: &str,
        action_type: &str,
        action_payload: serde_json::Value,
        store_names: &[&str],
    ) -> Result<Uuid, TxnError> {
        let mut stores = Vec::with_capacity(store_names.len());
        for name in store_names {
            let value = self.stores.capture(name)?;
            stores.push(((*name).to_string(), value));
        }

        let now = now_ms();
        let transaction = Transaction {
            id: Uuid::new_v4(),
            description: description.to_string(),
            action_type: action_type.to_string(),
            action_payload,
            status: TransactionStatus::Pending,
            error: None,
            retry_count: 0,
            snapshot: TransactionSnapshot {
                chain_states: self.view.chain_states(),
                hashes: self.view.hashes(),
                stores,
            },
            created_at_ms: now,
            updated_at_ms: now,
        };
        let id = transaction.id;

        let mut inner = self.inner.lock().map_err(|_| TxnError::Poisoned)?;
        debug!(transaction_id = %id, action_type, description, "Transaction begun");
        inner.in_flight.insert(id, transaction);
        inner.active_id = Some(id);
        drop(inner);

        self.publish(id, TransactionStatus::Pending, None, None);
        Ok(id)
    }

    /// Mark the optimistic mutation as applied locally.
    pub fn mark_optimistic(&self, id: Uuid) -> Result<(), TxnError> {
        self.transition(id, TransactionStatus::Optimistic, None)
    }

    /// Mark the action as sent to the backend.
    pub fn mark_submitted(&self, id: Uuid) -> Result<(), TxnError> {
        self.transition(id, TransactionStatus::Submitted, None)
    }

    /// Record one more submission attempt; returns the new count.
    pub fn record_retry(&self, id: Uuid) -> Result<u32, TxnError> {
        let mut inner = self.inner.lock().map_err(|_| TxnError::Poisoned)?;
        let transaction = inner
            .in_flight
            .get_mut(&id)
            .ok_or(TxnError::UnknownTransaction(id))?;
        transaction.retry_count += 1;
        transaction.updated_at_ms = now_ms();
        Ok(transaction.retry_count)
    }

    /// Backend confirmed: discard the snapshot and archive the transaction.
    pub fn confirm(&self, id: Uuid) -> Result<(), TxnError> {
        let mut inner = self.inner.lock().map_err(|_| TxnError::Poisoned)?;
        let transaction = Self::detach(&mut inner, id, TransactionStatus::Confirmed)?;
        let duration = transaction.elapsed_ms(now_ms());

        info!(transaction_id = %id, duration_ms = duration, "Transaction confirmed");
        Self::archive(
            &mut inner,
            &transaction,
            TransactionStatus::Confirmed,
            None,
            duration,
            self.config.history_capacity,
        );
        drop(inner);

        self.publish(id, TransactionStatus::Confirmed, None, Some(duration));
        Ok(())
    }

    /// Backend rejected: record the failure, then roll back at once.
    ///
    /// Rollback is unconditional; a failed action must never leave a
    /// container holding its optimistic mutation. `rollback: None` runs
    /// the restore with the manager's configured defaults.
    pub fn fail(
        &self,
        id: Uuid,
        error: &str,
        rollback: Option<RollbackConfig>,
    ) -> Result<RollbackReport, TxnError> {
        self.transition(id, TransactionStatus::Failed, Some(error.to_string()))?;
        self.rollback(id, rollback.unwrap_or_default())
    }

    /// Restore the captured snapshots and archive the transaction.
    ///
    /// Restore attempts are collected, never early-aborted: one store
    /// failing to restore still lets every other store restore, and the
    /// failure lands in the report.
    pub fn rollback(&self, id: Uuid, config: RollbackConfig) -> Result<RollbackReport, TxnError> {
        let mut inner = self.inner.lock().map_err(|_| TxnError::Poisoned)?;
        let transaction = Self::detach(&mut inner, id, TransactionStatus::RolledBack)?;
        let error = transaction.error.clone();
        let duration = transaction.elapsed_ms(now_ms());

        let mut report = RollbackReport {
            transaction_id: id,
            restored: Vec::new(),
            failures: Vec::new(),
        };
        for (store, snapshot) in &transaction.snapshot.stores {
            match self.stores.restore(store, snapshot.clone()) {
                Ok(()) => report.restored.push(store.clone()),
                Err(e) => {
                    warn!(transaction_id = %id, store = %store, error = %e, "Store restore failed");
                    report.failures.push(SnapshotFailure {
                        store: store.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }
        info!(
            transaction_id = %id,
            restored = report.restored.len(),
            failed = report.failures.len(),
            "Transaction rolled back"
        );

        Self::archive(
            &mut inner,
            &transaction,
            TransactionStatus::RolledBack,
            error.clone(),
            duration,
            self.config.history_capacity,
        );
        drop(inner);

        self.publish(id, TransactionStatus::RolledBack, error.clone(), Some(duration));

        let notify = config
            .notify_user
            .unwrap_or(self.config.notify_user_default);
        if notify {
            let user_message = config
                .user_message
                .unwrap_or_else(|| self.config.user_message_default.clone());
            self.broker.emit(UiEvent::system(EventPayload::FaultRaised(FaultNotice {
                fault_id: Uuid::new_v4(),
                code: FaultCode::Unknown,
                message: error.unwrap_or_else(|| "transaction rolled back".to_string()),
                user_message,
                severity: Severity::Error,
                recoverable: true,
                suggested_action: None,
            })));
        }
        Ok(report)
    }

    /// Session teardown: every in-flight transaction becomes failed with a
    /// fixed reason, and **no** rollback runs. The containers are going away;
    /// a restore would be wasted work.
    pub fn clear_pending(&self) -> Vec<Uuid> {
        let Ok(mut inner) = self.inner.lock() else {
            return Vec::new();
        };
        let transactions: Vec<Transaction> = {
            let mut ids: Vec<Uuid> = inner.in_flight.keys().copied().collect();
            ids.sort_unstable();
            ids.into_iter()
                .filter_map(|id| inner.in_flight.remove(&id))
                .collect()
        };
        inner.active_id = None;

        let now = now_ms();
        let error = Some("Cancelled".to_string());
        let mut cleared = Vec::with_capacity(transactions.len());
        for transaction in &transactions {
            warn!(
                transaction_id = %transaction.id,
                status = %transaction.status,
                "Pending transaction cleared"
            );
            Self::archive(
                &mut inner,
                transaction,
                TransactionStatus::Failed,
                error.clone(),
                transaction.elapsed_ms(now),
                self.config.history_capacity,
            );
            cleared.push(transaction.id);
        }
        drop(inner);

        for transaction in &transactions {
            self.publish(
                transaction.id,
                TransactionStatus::Failed,
                error.clone(),
                Some(transaction.elapsed_ms(now)),
            );
        }
        cleared
    }

    /// The UI-focus transaction, if one is in flight.
    #[must_use]
    pub fn active(&self) -> Option<Transaction> {
        let inner = self.inner.lock().ok()?;
        let id = inner.active_id?;
        inner.in_flight.get(&id).cloned()
    }

    /// Id of the UI-focus transaction, if any.
    #[must_use]
    pub fn active_transaction_id(&self) -> Option<Uuid> {
        self.inner.lock().ok().and_then(|inner| {
            inner
                .active_id
                .filter(|id| inner.in_flight.contains_key(id))
        })
    }

    /// Status of one in-flight transaction.
    #[must_use]
    pub fn status_of(&self, id: Uuid) -> Option<TransactionStatus> {
        self.inner
            .lock()
            .ok()
            .and_then(|inner| inner.in_flight.get(&id).map(|t| t.status))
    }

    /// Snapshot captured by one in-flight transaction.
    #[must_use]
    pub fn snapshot_of(&self, id: Uuid) -> Option<TransactionSnapshot> {
        self.inner
            .lock()
            .ok()
            .and_then(|inner| inner.in_flight.get(&id).map(|t| t.snapshot.clone()))
    }

    /// Number of in-flight transactions.
    #[must_use]
    pub fn in_flight_count(&self) -> usize {
        self.inner.lock().map(|inner| inner.in_flight.len()).unwrap_or(0)
    }

    /// Finished transactions, oldest first.
    #[must_use]
    pub fn history(&self) -> Vec<TransactionRecord> {
        self.inner
            .lock()
            .map(|inner| inner.history.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Non-terminal transition on an in-flight transaction.
    fn transition(
        &self,
        id: Uuid,
        to: TransactionStatus,
        error: Option<String>,
    ) -> Result<(), TxnError> {
        let mut inner = self.inner.lock().map_err(|_| TxnError::Poisoned)?;
        let transaction = inner
            .in_flight
            .get_mut(&id)
            .ok_or(TxnError::UnknownTransaction(id))?;
        if !transaction.status.can_transition_to(to) {
            return Err(TxnError::InvalidTransition {
                from: transaction.status,
                to,
            });
        }
        transaction.status = to;
        transaction.updated_at_ms = now_ms();
        if error.is_some() {
            transaction.error = error.clone();
        }
        debug!(transaction_id = %id, status = %to, "Transaction transition");
        drop(inner);

        self.publish(id, to, error, None);
        Ok(())
    }

    /// Validate a terminal transition and detach the transaction.
    fn detach(
        inner: &mut ManagerInner,
        id: Uuid,
        to: TransactionStatus,
    ) -> Result<Transaction, TxnError> {
        let current = inner
            .in_flight
            .get(&id)
            .ok_or(TxnError::UnknownTransaction(id))?
            .status;
        if !current.can_transition_to(to) {
            return Err(TxnError::InvalidTransition { from: current, to });
        }
        if inner.active_id == Some(id) {
            inner.active_id = None;
        }
        inner
            .in_flight
            .remove(&id)
            .ok_or(TxnError::UnknownTransaction(id))
    }

    fn archive(
        inner: &mut ManagerInner,
        transaction: &Transaction,
        status: TransactionStatus,
        error: Option<String>,
        duration_ms: u64,
        capacity: usize,
    ) {
        inner.history.push_back(TransactionRecord {
            transaction_id: transaction.id,
            description: transaction.description.clone(),
            action_type: transaction.action_type.clone(),
            status,
            error,
            retry_count: transaction.retry_count,
            duration_ms,
        });
        while inner.history.len() > capacity {
            inner.history.pop_front();
        }
    }

    fn publish(
        &self,
        id: Uuid,
        status: TransactionStatus,
        error: Option<String>,
        duration_ms: Option<u64>,
    ) {
        self.broker.emit(UiEvent::system(EventPayload::TransactionLifecycle(
            TransactionLifecycle {
                transaction_id: id,
                status,
                error,
                duration_ms,
            },
        )));
    }
}
