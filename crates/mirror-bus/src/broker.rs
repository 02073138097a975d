//! # Event Broker
//!
//! In-memory typed pub/sub. Constructed explicitly at session start and
//! passed by reference to all consumers; there are no process-wide globals.

use crate::history::DeliveryHistory;
use crate::subscription::{AsyncHandler, Handler, Registry, Subscription, Target};
use crate::DEFAULT_HISTORY_CAPACITY;
use futures::future::join_all;
use mirror_types::{Domain, EventKind, UiEvent};
use std::collections::VecDeque;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use tracing::{debug, warn};

/// Pause gate: while paused, emitted events queue FIFO.
#[derive(Default)]
struct ReplayGate {
    paused: bool,
    queue: VecDeque<UiEvent>,
}

/// In-memory event broker.
///
/// Delivery order per emit: kind handlers, then domain handlers (only for
/// events carrying chain metadata), then wildcard handlers. A failing
/// handler is logged and never blocks delivery to the others.
pub struct EventBroker {
    /// Handler registry, shared with subscription guards for cleanup.
    registry: Arc<RwLock<Registry>>,

    /// Pause/replay queue.
    gate: Mutex<ReplayGate>,

    /// Bounded delivery history for diagnostics.
    history: Mutex<DeliveryHistory>,

    /// Next subscription id.
    next_id: AtomicU64,

    /// Total events emitted (including queued-while-paused).
    events_emitted: AtomicU64,
}

impl EventBroker {
    /// Create a broker with the default history capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_history_capacity(DEFAULT_HISTORY_CAPACITY)
    }

    /// Create a broker retaining the last `capacity` delivery records.
    #[must_use]
    pub fn with_history_capacity(capacity: usize) -> Self {
        Self {
            registry: Arc::new(RwLock::new(Registry::default())),
            gate: Mutex::new(ReplayGate::default()),
            history: Mutex::new(DeliveryHistory::new(capacity)),
            next_id: AtomicU64::new(0),
            events_emitted: AtomicU64::new(0),
        }
    }

    /// Subscribe a synchronous handler to one event kind.
    #[must_use]
    pub fn subscribe<F>(&self, kind: EventKind, handler: F) -> Subscription
    where
        F: Fn(&UiEvent) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.register(Target::Kind(kind), Handler::Sync(Arc::new(handler)))
    }

    /// Subscribe an asynchronous handler to one event kind.
    #[must_use]
    pub fn subscribe_async<F, Fut>(&self, kind: EventKind, handler: F) -> Subscription
    where
        F: Fn(UiEvent) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.register(Target::Kind(kind), Handler::Async(boxed(handler)))
    }

    /// Subscribe to all chain-tracked events for one domain.
    #[must_use]
    pub fn subscribe_to_domain<F>(&self, domain: Domain, handler: F) -> Subscription
    where
        F: Fn(&UiEvent) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.register(Target::Domain(domain), Handler::Sync(Arc::new(handler)))
    }

    /// Subscribe an asynchronous handler to one domain.
    #[must_use]
    pub fn subscribe_to_domain_async<F, Fut>(&self, domain: Domain, handler: F) -> Subscription
    where
        F: Fn(UiEvent) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.register(Target::Domain(domain), Handler::Async(boxed(handler)))
    }

    /// Subscribe a wildcard handler (fires for every event).
    #[must_use]
    pub fn subscribe_all<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&UiEvent) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.register(Target::All, Handler::Sync(Arc::new(handler)))
    }

    /// Subscribe an asynchronous wildcard handler.
    #[must_use]
    pub fn subscribe_all_async<F, Fut>(&self, handler: F) -> Subscription
    where
        F: Fn(UiEvent) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.register(Target::All, Handler::Async(boxed(handler)))
    }

    fn register(&self, target: Target, handler: Handler) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut registry) = self.registry.write() {
            registry.insert(target, id, handler);
        }
        debug!(target = ?target, id, "New subscription created");
        Subscription::new(id, target, self.registry.clone())
    }

    /// Emit an event synchronously, fire-and-forget per handler.
    ///
    /// Sync handlers run inline; async handlers are spawned. While paused,
    /// the event is queued instead and 0 is returned.
    ///
    /// Returns the number of handlers the event was delivered to.
    pub fn emit(&self, event: UiEvent) -> usize {
        self.events_emitted.fetch_add(1, Ordering::Relaxed);

        if self.enqueue_if_paused(event.clone()) {
            return 0;
        }
        self.deliver(&event)
    }

    /// Emit an event, awaiting all async handlers in parallel.
    ///
    /// Individual handler failures are isolated and logged.
    pub async fn emit_async(&self, event: UiEvent) -> usize {
        self.events_emitted.fetch_add(1, Ordering::Relaxed);

        if self.enqueue_if_paused(event.clone()) {
            return 0;
        }

        let handlers = self.handlers_for(&event);
        let count = handlers.len();

        let mut futures = Vec::new();
        for handler in handlers {
            match handler {
                Handler::Sync(f) => {
                    if let Err(e) = f(&event) {
                        warn!(kind = ?event.kind(), error = %e, "Event handler failed");
                    }
                }
                Handler::Async(f) => futures.push(f(event.clone())),
            }
        }
        for result in join_all(futures).await {
            if let Err(e) = result {
                warn!(kind = ?event.kind(), error = %e, "Async event handler failed");
            }
        }

        self.record(&event, count);
        count
    }

    /// Pause delivery: subsequent emits queue FIFO until `resume`.
    pub fn pause(&self) {
        if let Ok(mut gate) = self.gate.lock() {
            gate.paused = true;
        }
        debug!("Event broker paused");
    }

    /// Resume delivery, replaying queued events in emission order.
    ///
    /// Returns the number of replayed events.
    pub fn resume(&self) -> usize {
        let queued = match self.gate.lock() {
            Ok(mut gate) => {
                gate.paused = false;
                std::mem::take(&mut gate.queue)
            }
            Err(_) => return 0,
        };

        let replayed = queued.len();
        debug!(replayed, "Event broker resumed");
        for event in queued {
            self.deliver(&event);
        }
        replayed
    }

    /// Whether the broker is currently paused.
    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.gate.lock().map(|g| g.paused).unwrap_or(false)
    }

    /// Total events emitted.
    #[must_use]
    pub fn events_emitted(&self) -> u64 {
        self.events_emitted.load(Ordering::Relaxed)
    }

    /// Number of registered handlers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.registry.read().map(|r| r.len()).unwrap_or(0)
    }

    /// Snapshot of the delivery history, oldest first.
    #[must_use]
    pub fn history(&self) -> Vec<crate::DeliveryRecord> {
        self.history
            .lock()
            .map(|h| h.records().cloned().collect())
            .unwrap_or_default()
    }

    fn enqueue_if_paused(&self, event: UiEvent) -> bool {
        let Ok(mut gate) = self.gate.lock() else {
            return false;
        };
        if gate.paused {
            debug!(kind = ?event.kind(), queued = gate.queue.len() + 1, "Event queued while paused");
            gate.queue.push_back(event);
            true
        } else {
            false
        }
    }

    /// Delivery order contract: kind handlers, domain handlers, wildcard.
    fn handlers_for(&self, event: &UiEvent) -> Vec<Handler> {
        self.registry
            .read()
            .map(|r| r.handlers_for(event))
            .unwrap_or_default()
    }

    fn deliver(&self, event: &UiEvent) -> usize {
        let handlers = self.handlers_for(event);
        let count = handlers.len();

        for handler in handlers {
            match handler {
                Handler::Sync(f) => {
                    if let Err(e) = f(event) {
                        warn!(kind = ?event.kind(), error = %e, "Event handler failed");
                    }
                }
                Handler::Async(f) => {
                    let kind = event.kind();
                    let fut = f(event.clone());
                    tokio::spawn(async move {
                        if let Err(e) = fut.await {
                            warn!(kind = ?kind, error = %e, "Async event handler failed");
                        }
                    });
                }
            }
        }

        self.record(event, count);
        count
    }

    fn record(&self, event: &UiEvent, handler_count: usize) {
        if let Ok(mut history) = self.history.lock() {
            history.record(event.kind(), handler_count, event.chain_domain());
        }
        debug!(
            kind = ?event.kind(),
            source = ?event.source,
            handlers = handler_count,
            "Event delivered"
        );
    }
}

impl Default for EventBroker {
    fn default() -> Self {
        Self::new()
    }
}

fn boxed<F, Fut>(handler: F) -> AsyncHandler
where
    F: Fn(UiEvent) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    Arc::new(move |event| Box::pin(handler(event)))
}
