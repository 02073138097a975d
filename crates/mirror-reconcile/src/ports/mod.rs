//! # Ports
//!
//! Inbound API trait and outbound dependency traits (hexagonal boundary).

pub mod inbound;
pub mod outbound;

pub use inbound::ReconcilerApi;
pub use outbound::{BackendSync, ContainerError, MockBackend, MockContainers, StateContainers};
