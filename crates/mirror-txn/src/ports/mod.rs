//! # Ports

pub mod outbound;

pub use outbound::{MockStateView, MockStores, SnapshotStore, SyncStateView};
