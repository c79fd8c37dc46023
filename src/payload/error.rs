//! Error types for payload rendering.

use thiserror::Error;

/// Errors rendering a configuration document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PayloadError {
    /// Service type outside VPLS/VPRN/EPIPE reached the renderer.
    #[error("Unsupported service type: {0}")]
    UnsupportedServiceType(String),

    #[error("Invalid ipAddress '{address}': {message}")]
    InvalidAddress { address: String, message: String },

    #[error("EPIPE endpoint on {0} rendered without its peer's SDP id")]
    MissingRemoteSdp(String),

    #[error("Failed to encode payload: {0}")]
    Encode(String),
}
