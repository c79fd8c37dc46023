//! Drift detection.
//!
//! Compares the document observed on a device with the desired document for
//! one endpoint. Checks are field-level equality on `description` and
//! `admin-state` plus existence of the desired SAP; any mismatch is drift.
//! An observed document that is missing, empty or not decodable is also
//! drift, so an unreadable device is always re-enforced.
//!
//! Observed keys may carry a YANG module prefix (`nokia-conf:description`);
//! they match the unprefixed desired field.

use crate::payload::ConfigurationDocument;
use serde_json::{Map, Value};
use std::fmt;
use thiserror::Error;

/// Why an observed document could not be read.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DriftDecodeError {
    #[error("no configuration found on device")]
    Empty,

    #[error("observed configuration is not valid JSON: {0}")]
    Malformed(String),

    #[error("observed configuration is not an object")]
    NotAnObject,
}

/// One field-level difference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mismatch {
    Description {
        desired: String,
        observed: Option<String>,
    },
    AdminState {
        desired: String,
        observed: Option<String>,
    },
    MissingSap {
        desired: String,
    },
    Undecodable(DriftDecodeError),
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn shown(v: &Option<String>) -> String {
            v.as_deref()
                .map(|s| format!("'{}'", s))
                .unwrap_or_else(|| "<absent>".to_string())
        }

        match self {
            Mismatch::Description { desired, observed } => write!(
                f,
                "description mismatch: desired '{}', observed {}",
                desired,
                shown(observed)
            ),
            Mismatch::AdminState { desired, observed } => write!(
                f,
                "admin-state mismatch: desired '{}', observed {}",
                desired,
                shown(observed)
            ),
            Mismatch::MissingSap { desired } => {
                write!(f, "desired SAP not found: '{}'", desired)
            }
            Mismatch::Undecodable(e) => write!(f, "{}", e),
        }
    }
}

/// Result of one drift check.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DriftReport {
    pub mismatches: Vec<Mismatch>,
}

impl DriftReport {
    pub fn drift_detected(&self) -> bool {
        !self.mismatches.is_empty()
    }

    /// Human-readable reasons, one per mismatch.
    pub fn reasons(&self) -> Vec<String> {
        self.mismatches.iter().map(ToString::to_string).collect()
    }
}

/// Decode a raw observed document.
pub fn decode_observed(raw: &str) -> Result<Value, DriftDecodeError> {
    if raw.trim().is_empty() {
        return Err(DriftDecodeError::Empty);
    }
    serde_json::from_str(raw).map_err(|e| DriftDecodeError::Malformed(e.to_string()))
}

/// Check drift against a raw (encoded) observed document.
pub fn detect_raw(desired: &ConfigurationDocument, observed: &str) -> DriftReport {
    match decode_observed(observed) {
        Ok(value) => detect(desired, Some(&value)),
        Err(e) => undecodable(e),
    }
}

/// Check drift against a structured observed document.
///
/// `None` means the device returned no configuration for the path.
pub fn detect(desired: &ConfigurationDocument, observed: Option<&Value>) -> DriftReport {
    let observed = match observed {
        None | Some(Value::Null) => return undecodable(DriftDecodeError::Empty),
        Some(Value::Object(map)) if map.is_empty() => {
            return undecodable(DriftDecodeError::Empty)
        }
        Some(Value::Object(map)) => map,
        Some(_) => return undecodable(DriftDecodeError::NotAnObject),
    };

    let common = desired.payload.common();
    let mut mismatches = Vec::new();

    let observed_description = string_field(observed, "description");
    if observed_description.as_deref() != Some(common.description.as_str()) {
        mismatches.push(Mismatch::Description {
            desired: common.description.clone(),
            observed: observed_description,
        });
    }

    let observed_admin = string_field(observed, "admin-state");
    if observed_admin.as_deref() != Some(common.admin_state.as_str()) {
        mismatches.push(Mismatch::AdminState {
            desired: common.admin_state.to_string(),
            observed: observed_admin,
        });
    }

    if let Some(desired_sap) = desired.payload.sap_id() {
        if !observed_sap_ids(observed).any(|id| id == desired_sap) {
            mismatches.push(Mismatch::MissingSap {
                desired: desired_sap.to_string(),
            });
        }
    }

    DriftReport { mismatches }
}

fn undecodable(error: DriftDecodeError) -> DriftReport {
    DriftReport {
        mismatches: vec![Mismatch::Undecodable(error)],
    }
}

/// Look up a field by name, accepting a `module:` prefix on the key.
fn field<'a>(map: &'a Map<String, Value>, name: &str) -> Option<&'a Value> {
    map.get(name).or_else(|| {
        map.iter()
            .find(|(key, _)| {
                key.rsplit_once(':')
                    .is_some_and(|(_, local)| local == name)
            })
            .map(|(_, value)| value)
    })
}

fn string_field(map: &Map<String, Value>, name: &str) -> Option<String> {
    field(map, name).map(|v| match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    })
}

/// SAP ids at the top level and nested under VPRN interfaces.
fn observed_sap_ids(map: &Map<String, Value>) -> impl Iterator<Item = &str> {
    let top = sap_ids(field(map, "sap"));
    let nested = field(map, "interface")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(Value::as_object)
        .flat_map(|iface| sap_ids(field(iface, "sap")));
    top.chain(nested)
}

fn sap_ids(list: Option<&Value>) -> impl Iterator<Item = &str> {
    list.and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(Value::as_object)
        .filter_map(|sap| field(sap, "sap-id").and_then(Value::as_str))
}
