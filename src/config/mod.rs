//! Configuration module for netslice
//!
//! Provides layered configuration loading from files, environment variables, and defaults.
//!
//! # Configuration Precedence
//!
//! 1. CLI arguments (highest priority)
//! 2. Environment variables (`NETSLICE_*`)
//! 3. Configuration file (TOML)
//! 4. Default values (lowest priority)
//!
//! # Example
//!
//! ```rust
//! use netslice::config::NetsliceConfig;
//!
//! // Load defaults
//! let config = NetsliceConfig::default();
//! assert_eq!(config.reconcile.interval_seconds, 300);
//!
//! // Parse from TOML
//! let toml = r#"
//! [device]
//! timeout_seconds = 3
//! "#;
//! let config: NetsliceConfig = toml::from_str(toml).unwrap();
//! assert_eq!(config.device.timeout_seconds, 3);
//! ```

pub mod device;
pub mod error;
pub mod logging;
pub mod reconcile;
pub mod router;

pub use device::DeviceConfig;
pub use error::ConfigError;
pub use logging::{LogFormat, LoggingConfig};
pub use reconcile::ReconcileConfig;
pub use router::{CredentialSourceKind, CredentialsConfig, RouterConfig};

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Unified configuration for the controller.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct NetsliceConfig {
    /// Device transport settings
    pub device: DeviceConfig,
    /// Reconciliation pass settings
    pub reconcile: ReconcileConfig,
    /// Credential source selection
    pub credentials: CredentialsConfig,
    /// Static router table
    pub routers: Vec<RouterConfig>,
    /// Logging configuration
    pub logging: LoggingConfig,
}

impl NetsliceConfig {
    /// Load configuration from a TOML file
    ///
    /// If path is None, returns default configuration.
    /// If path doesn't exist, returns NotFound error.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => {
                if !p.exists() {
                    return Err(ConfigError::NotFound(p.to_path_buf()));
                }
                let content = std::fs::read_to_string(p)?;
                toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))
            }
            None => Ok(Self::default()),
        }
    }

    /// Apply environment variable overrides
    ///
    /// Supports NETSLICE_* environment variables for common settings.
    /// Invalid values are silently ignored (defaults are kept).
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup.
    pub fn with_overrides_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(level) = lookup("NETSLICE_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(Ok(format)) = lookup("NETSLICE_LOG_FORMAT").map(|f| f.parse()) {
            self.logging.format = format;
        }
        if let Some(Ok(interval)) = lookup("NETSLICE_INTERVAL").map(|v| v.parse()) {
            self.reconcile.interval_seconds = interval;
        }
        if let Some(Ok(n)) = lookup("NETSLICE_MAX_CONCURRENCY").map(|v| v.parse()) {
            self.reconcile.max_concurrency = n;
        }
        if let Some(Ok(timeout)) = lookup("NETSLICE_DEVICE_TIMEOUT").map(|v| v.parse()) {
            self.device.timeout_seconds = timeout;
        }

        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        let non_zero = [
            ("reconcile.interval_seconds", self.reconcile.interval_seconds),
            ("reconcile.max_concurrency", self.reconcile.max_concurrency as u64),
            ("device.timeout_seconds", self.device.timeout_seconds),
        ];
        for (field, value) in non_zero {
            if value == 0 {
                return Err(ConfigError::Validation {
                    field: field.to_string(),
                    message: "must be non-zero".to_string(),
                });
            }
        }

        let mut seen = HashSet::new();
        for (i, router) in self.routers.iter().enumerate() {
            if router.name.is_empty() {
                return Err(ConfigError::Validation {
                    field: format!("routers[{}].name", i),
                    message: "name cannot be empty".to_string(),
                });
            }
            if router.host.is_empty() {
                return Err(ConfigError::Validation {
                    field: format!("routers[{}].host", i),
                    message: "host cannot be empty".to_string(),
                });
            }
            if !seen.insert(router.name.as_str()) {
                return Err(ConfigError::DuplicateRouter(router.name.clone()));
            }
        }

        Ok(())
    }
}
