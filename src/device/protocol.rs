//! gNMI-shaped request and response types exchanged with a device transport.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Payload encoding requested on Get.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Encoding {
    Json,
    #[default]
    JsonIetf,
}

/// One `(path, value)` pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Update {
    pub path: String,
    pub val: Value,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SetRequest {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub update: Vec<Update>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub delete: Vec<String>,
}

/// Error reported inside an RPC response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpcError {
    #[serde(default)]
    pub code: i32,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SetResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GetRequest {
    pub path: Vec<String>,
    pub encoding: Encoding,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    #[serde(default)]
    pub update: Vec<Update>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GetResponse {
    #[serde(default)]
    pub notification: Vec<Notification>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
}

impl GetResponse {
    /// Value for `path`, falling back to the first update returned.
    ///
    /// `None` when the device returned no values at all.
    pub fn value_for(&self, path: &str) -> Option<&Value> {
        let mut updates = self.notification.iter().flat_map(|n| n.update.iter());
        let first = updates.clone().next();
        updates
            .find(|u| u.path == path)
            .or(first)
            .map(|u| &u.val)
            .filter(|v| !v.is_null())
    }
}
