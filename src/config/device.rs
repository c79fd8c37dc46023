//! Device transport configuration

use crate::device::{Encoding, DEFAULT_GNMI_PORT};
use serde::{Deserialize, Serialize};

/// Settings for the gNMI gateway transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    /// Port used when a router entry does not name one
    pub default_port: u16,
    /// Per-RPC timeout
    pub timeout_seconds: u64,
    /// Encoding requested on Get
    pub encoding: Encoding,
    /// Plaintext transport, no TLS verification
    pub insecure: bool,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            default_port: DEFAULT_GNMI_PORT,
            timeout_seconds: 5,
            encoding: Encoding::JsonIetf,
            insecure: true,
        }
    }
}
