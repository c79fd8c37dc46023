//! Error types for intent validation and loading.

use std::path::PathBuf;
use thiserror::Error;

/// Reasons a declared intent is rejected before any device is contacted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Invalid or missing 'serviceType'. Must be VPLS, VPRN, or EPIPE. Found: {0}")]
    InvalidServiceType(String),

    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("EPIPE service requires exactly two endpoints. Found: {0}")]
    EpipeEndpointCount(usize),

    #[error("EPIPE endpoint {index} has no routerName")]
    EpipeEndpointUnrouted { index: usize },

    #[error("{0} service requires at least one endpoint with a routerName")]
    NoRoutedEndpoints(String),
}

/// Errors reading an intent document from disk.
#[derive(Debug, Error)]
pub enum IntentFileError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Intent file not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to parse intent {path}: {message}")]
    Parse { path: PathBuf, message: String },
}
