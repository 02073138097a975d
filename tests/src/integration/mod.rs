//! # Integration Tests
//!
//! Cross-crate choreography: events flow broker -> reconciler -> containers,
//! transactions snapshot/restore against the live reconciler view, retries
//! are gated by the fault classifier.

pub mod flows;
pub mod retry;
pub mod rollback;
