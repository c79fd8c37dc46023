//! Error types for reconciliation passes.

use crate::device::DeviceError;
use crate::intent::ValidationError;
use crate::payload::PayloadError;
use thiserror::Error;

/// Failure of a pass or of one work item within it.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Payload(#[from] PayloadError),

    #[error(transparent)]
    Device(#[from] DeviceError),

    /// A panic caught at a pass or work-item boundary.
    #[error("Unexpected failure: {0}")]
    Panicked(String),
}

impl EngineError {
    /// Label for the `netslice_device_errors_total` counter, if device-scoped.
    pub fn device_kind(&self) -> Option<&'static str> {
        match self {
            EngineError::Device(e) => Some(e.kind()),
            _ => None,
        }
    }
}
