//! # Transaction Manager Configuration

use serde::{Deserialize, Serialize};

/// Transaction manager configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TxnConfig {
    /// Finished transactions retained in the history ring.
    pub history_capacity: usize,

    /// Whether rollback raises a user-facing fault when the caller does not
    /// say otherwise.
    pub notify_user_default: bool,

    /// User-facing message attached to rollback faults without a custom one.
    pub user_message_default: String,
}

impl Default for TxnConfig {
    fn default() -> Self {
        Self {
            history_capacity: 50,
            notify_user_default: true,
            user_message_default: "Your last change could not be saved and was undone."
                .to_string(),
        }
    }
}

impl TxnConfig {
    /// Small, quiet values for tests.
    #[must_use]
    pub fn for_testing() -> Self {
        Self {
            history_capacity: 4,
            notify_user_default: false,
            ..Self::default()
        }
    }
}

/// Per-rollback behavior overrides.
///
/// `None` fields fall back to the manager's `TxnConfig` defaults.
#[derive(Clone, Debug, Default)]
pub struct RollbackConfig {
    /// Raise a user-facing `FaultRaised` event after the restore pass.
    pub notify_user: Option<bool>,
    /// Custom user-facing message.
    pub user_message: Option<String>,
}

impl RollbackConfig {
    /// Rollback that never surfaces a fault.
    #[must_use]
    pub fn silent() -> Self {
        Self {
            notify_user: Some(false),
            user_message: None,
        }
    }

    /// Rollback that surfaces a fault to the user.
    #[must_use]
    pub fn notifying(message: Option<&str>) -> Self {
        Self {
            notify_user: Some(true),
            user_message: message.map(str::to_string),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_history_capacity() {
        assert_eq!(TxnConfig::default().history_capacity, 50);
        assert!(TxnConfig::default().notify_user_default);
    }

    #[test]
    fn test_testing_config_is_quiet() {
        let config = TxnConfig::for_testing();
        assert!(!config.notify_user_default);
        assert!(config.history_capacity < 50);
    }
}
