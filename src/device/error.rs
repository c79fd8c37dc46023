//! Error types for device sessions.

use thiserror::Error;

/// Errors scoped to one router.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeviceError {
    /// Credential lookup failed; raised before any network attempt.
    #[error("Credentials missing for router '{router}': {missing}")]
    CredentialsMissing { router: String, missing: String },

    /// Session could not be established (unreachable, refused, timed out).
    #[error("Connection to '{router}' ({target}) failed: {message}")]
    ConnectionFailed {
        router: String,
        target: String,
        message: String,
    },

    /// Set/Get RPC reported an error or returned a malformed response.
    #[error("gNMI {rpc} RPC failed on '{router}': {message}")]
    Protocol {
        router: String,
        rpc: &'static str,
        message: String,
    },
}

impl DeviceError {
    /// Short label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            DeviceError::CredentialsMissing { .. } => "credentials_missing",
            DeviceError::ConnectionFailed { .. } => "connection_failed",
            DeviceError::Protocol { .. } => "protocol",
        }
    }
}
