//! # Mirror Bus - Event Broker for the Synchronization Core
//!
//! Typed pub/sub distribution of `UiEvent`s between the reconciler, the
//! transaction manager, and UI collaborators.
//!
//! ## Delivery Contract
//!
//! For a single `emit` call, delivery order is:
//!
//! 1. kind-specific handlers,
//! 2. domain handlers (only if the event carries chain metadata),
//! 3. wildcard handlers.
//!
//! Handler failures are caught and logged, never propagated to the emitter
//! or to other handlers. While paused, emitted events queue FIFO and are
//! replayed in order on resume.

// Nursery lints that are too strict
#![allow(clippy::missing_const_for_fn)]
// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod broker;
pub mod history;
pub mod subscription;

// Re-export main types
pub use broker::EventBroker;
pub use history::{DeliveryHistory, DeliveryRecord};
pub use subscription::{AsyncHandler, Handler, Subscription, SyncHandler};

/// Default number of delivery records retained for diagnostics.
pub const DEFAULT_HISTORY_CAPACITY: usize = 100;
