//! Credential resolution for routers.
//!
//! A [`CredentialSource`] is injected into the session factory; there is no
//! process-wide credential table. Sources:
//!
//! - [`StaticCredentials`]: the `[[routers]]` table from configuration
//! - [`EnvCredentials`]: `<ROUTER>_HOST`, `<ROUTER>_PORT`, `<ROUTER>_USER`, `<ROUTER>_PASS`
//! - [`ChainedCredentials`]: first source that resolves wins

use super::DeviceError;
use crate::config::{CredentialSourceKind, NetsliceConfig, RouterConfig};
use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Default gNMI port.
pub const DEFAULT_GNMI_PORT: u16 = 57400;

/// Key/value lookup used for environment-style sources.
pub type EnvLookup = Arc<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Lookup backed by the process environment.
pub fn process_env() -> EnvLookup {
    Arc::new(|key| std::env::var(key).ok())
}

/// Connection parameters for one router.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
}

impl Credentials {
    /// `host:port` for logging and error messages.
    pub fn target(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Resolves connection parameters by router name.
#[async_trait]
pub trait CredentialSource: Send + Sync {
    /// Source name for logging.
    fn name(&self) -> &'static str;

    /// Resolve credentials, failing with `CredentialsMissing` if any field
    /// is absent.
    async fn resolve(&self, router: &str) -> Result<Credentials, DeviceError>;
}

fn missing(router: &str, fields: &[&str]) -> DeviceError {
    DeviceError::CredentialsMissing {
        router: router.to_string(),
        missing: fields.join(", "),
    }
}

/// Credentials from the static `[[routers]]` table.
pub struct StaticCredentials {
    routers: HashMap<String, RouterConfig>,
    default_port: u16,
    env: EnvLookup,
}

impl StaticCredentials {
    pub fn new(routers: &[RouterConfig], default_port: u16) -> Self {
        Self::with_lookup(routers, default_port, process_env())
    }

    /// Create with a custom lookup for `password_env` (for testing).
    pub fn with_lookup(routers: &[RouterConfig], default_port: u16, env: EnvLookup) -> Self {
        Self {
            routers: routers
                .iter()
                .map(|r| (r.name.clone(), r.clone()))
                .collect(),
            default_port,
            env,
        }
    }
}

#[async_trait]
impl CredentialSource for StaticCredentials {
    fn name(&self) -> &'static str {
        "static"
    }

    async fn resolve(&self, router: &str) -> Result<Credentials, DeviceError> {
        let entry = self
            .routers
            .get(router)
            .ok_or_else(|| missing(router, &["host", "port", "username", "password"]))?;

        let password = entry
            .password
            .clone()
            .or_else(|| entry.password_env.as_deref().and_then(|var| (self.env)(var)));

        let mut absent = Vec::new();
        if entry.host.is_empty() {
            absent.push("host");
        }
        if entry.username.as_deref().is_none_or(str::is_empty) {
            absent.push("username");
        }
        if password.as_deref().is_none_or(str::is_empty) {
            absent.push("password");
        }
        if !absent.is_empty() {
            return Err(missing(router, &absent));
        }

        Ok(Credentials {
            host: entry.host.clone(),
            port: entry.port.unwrap_or(self.default_port),
            username: entry.username.clone().unwrap_or_default(),
            password: password.unwrap_or_default(),
        })
    }
}

/// Credentials from `<ROUTER>_HOST`-style keys.
///
/// The router name is upper-cased and non-alphanumerics become `_`, so
/// `sr-1` reads `SR_1_HOST`. `_PORT` is optional.
pub struct EnvCredentials {
    default_port: u16,
    lookup: EnvLookup,
}

impl EnvCredentials {
    pub fn new(default_port: u16) -> Self {
        Self::with_lookup(default_port, process_env())
    }

    pub fn with_lookup(default_port: u16, lookup: EnvLookup) -> Self {
        Self {
            default_port,
            lookup,
        }
    }

    /// Environment key prefix for a router.
    pub fn key_prefix(router: &str) -> String {
        router
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() {
                    c.to_ascii_uppercase()
                } else {
                    '_'
                }
            })
            .collect()
    }

    fn get(&self, prefix: &str, suffix: &str) -> Option<String> {
        (self.lookup)(&format!("{}_{}", prefix, suffix)).filter(|v| !v.is_empty())
    }
}

#[async_trait]
impl CredentialSource for EnvCredentials {
    fn name(&self) -> &'static str {
        "env"
    }

    async fn resolve(&self, router: &str) -> Result<Credentials, DeviceError> {
        let prefix = Self::key_prefix(router);
        let host = self.get(&prefix, "HOST");
        let username = self.get(&prefix, "USER");
        let password = self.get(&prefix, "PASS");
        let port = match self.get(&prefix, "PORT") {
            None => Some(self.default_port),
            Some(raw) => raw.parse().ok(),
        };

        match (host, port, username, password) {
            (Some(host), Some(port), Some(username), Some(password)) => Ok(Credentials {
                host,
                port,
                username,
                password,
            }),
            (host, port, username, password) => {
                let absent: Vec<&str> = [
                    (host.is_none(), "host"),
                    (port.is_none(), "port"),
                    (username.is_none(), "username"),
                    (password.is_none(), "password"),
                ]
                .into_iter()
                .filter_map(|(is_missing, field)| is_missing.then_some(field))
                .collect();
                Err(missing(router, &absent))
            }
        }
    }
}

/// Tries each source in order.
pub struct ChainedCredentials {
    sources: Vec<Arc<dyn CredentialSource>>,
}

impl ChainedCredentials {
    pub fn new(sources: Vec<Arc<dyn CredentialSource>>) -> Self {
        Self { sources }
    }
}

#[async_trait]
impl CredentialSource for ChainedCredentials {
    fn name(&self) -> &'static str {
        "chain"
    }

    async fn resolve(&self, router: &str) -> Result<Credentials, DeviceError> {
        let mut reasons = Vec::with_capacity(self.sources.len());

        for source in &self.sources {
            match source.resolve(router).await {
                Ok(credentials) => {
                    tracing::debug!(router, source = source.name(), "Resolved credentials");
                    return Ok(credentials);
                }
                Err(DeviceError::CredentialsMissing { missing, .. }) => {
                    reasons.push(format!("{} source: {}", source.name(), missing));
                }
                Err(other) => return Err(other),
            }
        }

        Err(DeviceError::CredentialsMissing {
            router: router.to_string(),
            missing: if reasons.is_empty() {
                "no credential sources configured".to_string()
            } else {
                reasons.join("; ")
            },
        })
    }
}

/// Build the credential source selected in configuration.
pub fn from_config(config: &NetsliceConfig) -> Arc<dyn CredentialSource> {
    let port = config.device.default_port;
    match config.credentials.source {
        CredentialSourceKind::Static => Arc::new(StaticCredentials::new(&config.routers, port)),
        CredentialSourceKind::Env => Arc::new(EnvCredentials::new(port)),
        CredentialSourceKind::Chain => Arc::new(ChainedCredentials::new(vec![
            Arc::new(StaticCredentials::new(&config.routers, port)),
            Arc::new(EnvCredentials::new(port)),
        ])),
    }
}
