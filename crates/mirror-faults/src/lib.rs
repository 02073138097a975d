//! # Mirror Faults
//!
//! Turns raw failure messages into user-facing fault notices, and retries
//! transient operations with exponential backoff.
//!
//! ## Purpose
//!
//! Backend and transport failures arrive as free-form strings. This crate
//! pattern-matches them into a closed [`FaultCode`](mirror_types::FaultCode)
//! set, attaches fixed user-facing copy from lookup tables, and decides
//! retry eligibility. The [`Retrier`] shares attempt counts per operation
//! id, so concurrent callers retrying the same logical operation draw from
//! one budget instead of multiplying it.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod classify;
pub mod retry;

pub use classify::{classify, ClassifiedFault, ClassifyOptions};
pub use retry::{Retrier, RetryConfig};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
