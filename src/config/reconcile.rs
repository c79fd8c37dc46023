//! Reconciliation loop configuration

use serde::{Deserialize, Serialize};

/// Settings for reconciliation passes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconcileConfig {
    /// Seconds between periodic drift checks
    pub interval_seconds: u64,
    /// Upper bound on concurrent work items in best-effort passes
    pub max_concurrency: usize,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            interval_seconds: 300,
            max_concurrency: 4,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reconcile_config_defaults() {
        let config = ReconcileConfig::default();
        assert_eq!(config.interval_seconds, 300);
        assert_eq!(config.max_concurrency, 4);
    }
}
