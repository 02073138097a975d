//! # Application Layer
//!
//! The reconciler service and its debounce timer.

pub mod debounce;
pub mod reconciler;

pub use debounce::DebounceTimer;
pub use reconciler::StateReconciler;
