//! # Fault Classification
//!
//! Keyword pattern matching over the raw failure message, plus the static
//! per-code tables for user-facing copy, category, severity, and retry
//! eligibility. The match order is significant: more specific patterns
//! (timeout, auth codes, websocket) win over the generic network bucket.

use mirror_types::{FaultCategory, FaultCode, FaultNotice, Severity};
use uuid::Uuid;

/// Caller overrides for one classification.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClassifyOptions {
    /// Pin the severity instead of using the code table.
    pub severity: Option<Severity>,
    /// Pin retry eligibility instead of using the category default.
    pub retryable: Option<bool>,
    /// Pin recoverability instead of deriving it from severity.
    pub recoverable: Option<bool>,
}

/// A fully classified failure.
#[derive(Debug, Clone)]
pub struct ClassifiedFault {
    /// The user-facing notice, ready to publish.
    pub notice: FaultNotice,
    /// Coarse category driving retry eligibility.
    pub category: FaultCategory,
    /// Whether an automatic retry is worth attempting.
    pub retryable: bool,
}

/// Classify a raw failure message.
#[must_use]
pub fn classify(message: &str, options: ClassifyOptions) -> ClassifiedFault {
    let code = infer_code(message);
    let category = category_of(code);
    let severity = options.severity.unwrap_or_else(|| default_severity(code));
    let retryable = options.retryable.unwrap_or_else(|| default_retryable(category));
    // Critical faults end the session unless the caller says otherwise.
    let recoverable = options.recoverable.unwrap_or(severity != Severity::Critical);

    ClassifiedFault {
        notice: FaultNotice {
            fault_id: Uuid::new_v4(),
            code,
            message: message.to_string(),
            user_message: user_message(code).to_string(),
            severity,
            recoverable,
            suggested_action: suggested_action(code).map(str::to_string),
        },
        category,
        retryable,
    }
}

fn infer_code(message: &str) -> FaultCode {
    let lower = message.to_lowercase();
    if lower.contains("timeout") || lower.contains("timed out") {
        FaultCode::Timeout
    } else if lower.contains("401") || lower.contains("unauthorized") {
        FaultCode::Unauthorized
    } else if lower.contains("403") || lower.contains("forbidden") {
        FaultCode::Forbidden
    } else if lower.contains("websocket") {
        FaultCode::WebSocket
    } else if lower.contains("500") || lower.contains("internal server") {
        FaultCode::Server
    } else if lower.contains("invalid") {
        FaultCode::Validation
    } else if lower.contains("network") || lower.contains("connection") {
        FaultCode::Network
    } else {
        FaultCode::Unknown
    }
}

/// Coarse category per code.
#[must_use]
pub fn category_of(code: FaultCode) -> FaultCategory {
    match code {
        FaultCode::Network | FaultCode::Timeout | FaultCode::WebSocket => {
            FaultCategory::Connectivity
        }
        FaultCode::Unauthorized | FaultCode::Forbidden => FaultCategory::Auth,
        FaultCode::Server => FaultCategory::Backend,
        FaultCode::Validation => FaultCategory::Client,
        FaultCode::Unknown => FaultCategory::Unknown,
    }
}

fn default_severity(code: FaultCode) -> Severity {
    match code {
        FaultCode::Timeout | FaultCode::WebSocket | FaultCode::Validation => Severity::Warning,
        FaultCode::Unauthorized => Severity::Critical,
        FaultCode::Network | FaultCode::Forbidden | FaultCode::Server | FaultCode::Unknown => {
            Severity::Error
        }
    }
}

fn default_retryable(category: FaultCategory) -> bool {
    matches!(category, FaultCategory::Connectivity | FaultCategory::Backend)
}

fn user_message(code: FaultCode) -> &'static str {
    match code {
        FaultCode::Network => "Unable to reach the server. Check your connection.",
        FaultCode::Timeout => "The server took too long to respond.",
        FaultCode::Unauthorized => "Your session has expired. Please sign in again.",
        FaultCode::Forbidden => "You don't have permission to perform this action.",
        FaultCode::WebSocket => "Live updates were interrupted. Reconnecting...",
        FaultCode::Server => "The server hit an internal error.",
        FaultCode::Validation => "The request was rejected as invalid.",
        FaultCode::Unknown => "Something went wrong.",
    }
}

fn suggested_action(code: FaultCode) -> Option<&'static str> {
    match code {
        FaultCode::Network | FaultCode::Timeout | FaultCode::Server => Some("Retry the action."),
        FaultCode::Unauthorized => Some("Sign in again."),
        FaultCode::Forbidden => Some("Ask an administrator for access."),
        FaultCode::WebSocket | FaultCode::Validation | FaultCode::Unknown => None,
    }
}
