//! # Reconciler Configuration

use crate::domain::MAX_CHAIN_DEPTH;
use serde::{Deserialize, Serialize};

/// Reconciler configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ReconcilerConfig {
    /// Debounce window for accumulated deltas, in milliseconds. The timer is
    /// re-armed (not extended) on every new arrival.
    pub debounce_ms: u64,

    /// Maximum updates a chain may accumulate between full resyncs.
    pub max_chain_depth: u32,

    /// Maximum gapped events buffered per domain before a forced resync.
    pub max_buffered_per_domain: usize,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 150,
            max_chain_depth: MAX_CHAIN_DEPTH,
            max_buffered_per_domain: 32,
        }
    }
}

impl ReconcilerConfig {
    /// Create a config for testing (smaller values).
    #[must_use]
    pub fn for_testing() -> Self {
        Self {
            debounce_ms: 20,
            max_chain_depth: 5,
            max_buffered_per_domain: 4,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ReconcilerConfig::default();
        assert_eq!(config.debounce_ms, 150);
        assert_eq!(config.max_chain_depth, MAX_CHAIN_DEPTH);
        assert_eq!(config.max_buffered_per_domain, 32);
    }

    #[test]
    fn test_testing_config() {
        let config = ReconcilerConfig::for_testing();
        assert!(config.debounce_ms < 150);
        assert_eq!(config.max_chain_depth, 5);
    }
}
