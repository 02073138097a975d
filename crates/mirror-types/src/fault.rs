//! # Fault Types
//!
//! User-visible fault payloads. Classification logic lives in the
//! `mirror-faults` crate; the payload types are shared here because broker
//! consumers and the transaction manager both produce/consume them.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Inferred failure code, pattern-matched from the error message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FaultCode {
    /// Generic network failure.
    Network,
    /// Operation timed out.
    Timeout,
    /// 401 / authentication required.
    Unauthorized,
    /// 403 / insufficient permissions.
    Forbidden,
    /// WebSocket channel failure.
    WebSocket,
    /// 500 / backend internal error.
    Server,
    /// Request rejected as invalid.
    Validation,
    /// Nothing matched.
    Unknown,
}

/// Coarse failure category used for retry eligibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FaultCategory {
    /// Transport-level connectivity.
    Connectivity,
    /// Authentication / authorization.
    Auth,
    /// Backend-side failure.
    Backend,
    /// Client-side misuse (validation).
    Client,
    /// Unclassified.
    Unknown,
}

/// Fault severity.
///
/// `Critical` is the only class expected to surface a blocking error state
/// to the end user, and the only one non-recoverable by default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Informational.
    Info,
    /// Degraded but functional.
    Warning,
    /// Operation failed.
    Error,
    /// Session-level failure.
    Critical,
}

/// A classified, user-visible fault as published on the broker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaultNotice {
    /// Unique id for this occurrence.
    pub fault_id: Uuid,
    /// Inferred code.
    pub code: FaultCode,
    /// Raw (developer-facing) message.
    pub message: String,
    /// Fixed user-facing message looked up from the code table.
    pub user_message: String,
    /// Severity.
    pub severity: Severity,
    /// Whether the session can continue.
    pub recoverable: bool,
    /// Suggested next step for the user, if any.
    pub suggested_action: Option<String>,
}
