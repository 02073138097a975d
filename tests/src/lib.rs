//! # MirrorSync Test Suite
//!
//! Unified test crate for cross-crate flows.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/      # Cross-crate choreography
//!     ├── flows.rs      # Broker + reconciler event flows
//!     ├── rollback.rs   # Optimistic transaction end-to-end
//!     └── retry.rs      # Classifier-gated retry flows
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! # All tests
//! cargo test -p mirror-tests
//!
//! # By category
//! cargo test -p mirror-tests integration::
//! ```

#![allow(unused_imports)]
#![allow(dead_code)]

pub mod integration;
