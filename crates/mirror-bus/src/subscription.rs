//! # Subscriptions
//!
//! Handler types and the subscription guard. Dropping a `Subscription`
//! deregisters its handler.

use futures::future::BoxFuture;
use mirror_types::{Domain, EventKind, UiEvent};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tracing::debug;

/// Synchronous event handler. Failures are logged by the broker, never
/// propagated.
pub type SyncHandler = Arc<dyn Fn(&UiEvent) -> anyhow::Result<()> + Send + Sync>;

/// Asynchronous event handler. Awaited in parallel by `emit_async`, spawned
/// fire-and-forget by `emit`.
pub type AsyncHandler = Arc<dyn Fn(UiEvent) -> BoxFuture<'static, anyhow::Result<()>> + Send + Sync>;

/// A registered handler, sync or async.
#[derive(Clone)]
pub enum Handler {
    /// Invoked inline during delivery.
    Sync(SyncHandler),
    /// Awaited (`emit_async`) or spawned (`emit`).
    Async(AsyncHandler),
}

/// What a subscription is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Target {
    /// One event kind.
    Kind(EventKind),
    /// Events carrying chain metadata for one domain.
    Domain(Domain),
    /// Every event.
    All,
}

pub(crate) struct HandlerEntry {
    pub id: u64,
    pub handler: Handler,
}

/// Handler registry shared between the broker and its subscription guards.
#[derive(Default)]
pub(crate) struct Registry {
    pub by_kind: HashMap<EventKind, Vec<HandlerEntry>>,
    pub by_domain: HashMap<Domain, Vec<HandlerEntry>>,
    pub wildcard: Vec<HandlerEntry>,
}

impl Registry {
    pub fn insert(&mut self, target: Target, id: u64, handler: Handler) {
        let entry = HandlerEntry { id, handler };
        match target {
            Target::Kind(kind) => self.by_kind.entry(kind).or_default().push(entry),
            Target::Domain(domain) => self.by_domain.entry(domain).or_default().push(entry),
            Target::All => self.wildcard.push(entry),
        }
    }

    pub fn remove(&mut self, target: Target, id: u64) {
        let entries = match target {
            Target::Kind(kind) => self.by_kind.get_mut(&kind),
            Target::Domain(domain) => self.by_domain.get_mut(&domain),
            Target::All => Some(&mut self.wildcard),
        };
        if let Some(entries) = entries {
            entries.retain(|e| e.id != id);
        }
    }

    /// Handlers for one event, in delivery order: kind, then domain (only
    /// when chain metadata is present), then wildcard.
    pub fn handlers_for(&self, event: &UiEvent) -> Vec<Handler> {
        let mut handlers = Vec::new();
        if let Some(entries) = self.by_kind.get(&event.kind()) {
            handlers.extend(entries.iter().map(|e| e.handler.clone()));
        }
        if let Some(domain) = event.chain_domain() {
            if let Some(entries) = self.by_domain.get(&domain) {
                handlers.extend(entries.iter().map(|e| e.handler.clone()));
            }
        }
        handlers.extend(self.wildcard.iter().map(|e| e.handler.clone()));
        handlers
    }

    pub fn len(&self) -> usize {
        self.by_kind.values().map(Vec::len).sum::<usize>()
            + self.by_domain.values().map(Vec::len).sum::<usize>()
            + self.wildcard.len()
    }
}

/// A subscription handle.
///
/// When dropped, the handler is automatically deregistered.
pub struct Subscription {
    id: u64,
    target: Target,
    registry: Arc<RwLock<Registry>>,
}

impl Subscription {
    pub(crate) fn new(id: u64, target: Target, registry: Arc<RwLock<Registry>>) -> Self {
        Self {
            id,
            target,
            registry,
        }
    }

    /// Explicitly deregister the handler (equivalent to dropping).
    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        let Ok(mut registry) = self.registry.write() else {
            return;
        };
        registry.remove(self.target, self.id);
        debug!(target = ?self.target, id = self.id, "Subscription dropped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mirror_types::{EventPayload, StateDelta};

    fn handler() -> Handler {
        Handler::Sync(Arc::new(|_| Ok(())))
    }

    fn state_event(domain: Domain) -> UiEvent {
        UiEvent::local(EventPayload::StateChanged(StateDelta {
            domain,
            body: serde_json::Value::Null,
            structural: false,
        }))
    }

    #[test]
    fn test_registry_insert_remove() {
        let mut registry = Registry::default();
        registry.insert(Target::Kind(EventKind::StateChanged), 1, handler());
        registry.insert(Target::All, 2, handler());
        assert_eq!(registry.len(), 2);

        registry.remove(Target::Kind(EventKind::StateChanged), 1);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_domain_handlers_skip_unchained_events() {
        let mut registry = Registry::default();
        registry.insert(Target::Domain(Domain::Geometry), 1, handler());

        // Local event has no chain metadata, so no domain handler fires.
        let event = state_event(Domain::Geometry);
        assert!(registry.handlers_for(&event).is_empty());
    }

    #[test]
    fn test_subscription_drop_deregisters() {
        let registry = Arc::new(RwLock::new(Registry::default()));
        registry
            .write()
            .unwrap()
            .insert(Target::All, 7, handler());

        {
            let _sub = Subscription::new(7, Target::All, registry.clone());
        }
        assert_eq!(registry.read().unwrap().len(), 0);
    }
}
