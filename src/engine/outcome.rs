//! Per-router outcomes and the status shapes produced by each pass.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Result of one work item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "message")]
pub enum ReconciliationOutcome {
    Provisioned,
    /// Drift was found and repaired
    Reconciled,
    InSync,
    Error(String),
}

impl ReconciliationOutcome {
    pub fn is_error(&self) -> bool {
        matches!(self, ReconciliationOutcome::Error(_))
    }

    fn severity(&self) -> u8 {
        match self {
            ReconciliationOutcome::InSync => 0,
            ReconciliationOutcome::Provisioned => 1,
            ReconciliationOutcome::Reconciled => 2,
            ReconciliationOutcome::Error(_) => 3,
        }
    }

    /// Combine two outcomes for the same router. The more severe one wins;
    /// on a tie the existing outcome is kept.
    pub fn merge(self, other: ReconciliationOutcome) -> Self {
        if other.severity() > self.severity() {
            other
        } else {
            self
        }
    }

    /// Status string stored under `ProvisionedEndpoints`, e.g. `"VPLS Provisioned"`.
    pub fn describe(&self, service_type: &str) -> String {
        match self {
            ReconciliationOutcome::Provisioned => format!("{} Provisioned", service_type),
            ReconciliationOutcome::Reconciled => format!("{} Reconciled", service_type),
            ReconciliationOutcome::InSync => format!("{} InSync", service_type),
            ReconciliationOutcome::Error(message) => format!("Error: {}", message),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    Ready,
    Error,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Ready => write!(f, "Ready"),
            Phase::Error => write!(f, "Error"),
        }
    }
}

/// Aggregated operational state. Ordered so that folding with `max`
/// yields `ERROR` over `DOWN` over `UP`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum OperationalStatus {
    #[default]
    Up,
    Down,
    Error,
}

impl OperationalStatus {
    /// Classify a device-reported state string.
    pub fn from_reported(state: &str) -> Self {
        if state == "UP" {
            OperationalStatus::Up
        } else {
            OperationalStatus::Down
        }
    }

    pub fn combine(self, other: OperationalStatus) -> Self {
        self.max(other)
    }
}

impl fmt::Display for OperationalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationalStatus::Up => write!(f, "UP"),
            OperationalStatus::Down => write!(f, "DOWN"),
            OperationalStatus::Error => write!(f, "ERROR"),
        }
    }
}

/// Status of one slice after a create/update or periodic pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SliceStatus {
    pub phase: Phase,
    pub service_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operational_status: Option<OperationalStatus>,
    pub message: String,
    /// Keyed by router name
    pub outcomes: BTreeMap<String, ReconciliationOutcome>,
}

impl SliceStatus {
    pub fn error(service_type: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            phase: Phase::Error,
            service_type: service_type.into(),
            operational_status: None,
            message: message.into(),
            outcomes: BTreeMap::new(),
        }
    }

    pub fn is_ready(&self) -> bool {
        self.phase == Phase::Ready
    }

    /// The persisted status document.
    pub fn to_patch(&self) -> StatusPatch {
        StatusPatch {
            status: StatusBody {
                status: self.phase,
                service_type: self.service_type.clone(),
                operational_status: self.operational_status,
                message: self.message.clone(),
                provisioned_endpoints: self
                    .outcomes
                    .iter()
                    .map(|(router, outcome)| (router.clone(), outcome.describe(&self.service_type)))
                    .collect(),
            },
        }
    }
}

/// `{"status": {...}}` as written back to the slice record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusPatch {
    pub status: StatusBody,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StatusBody {
    pub status: Phase,
    pub service_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operational_status: Option<OperationalStatus>,
    pub message: String,
    #[serde(default)]
    pub provisioned_endpoints: BTreeMap<String, String>,
}

/// Result of a delete pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteOutcome {
    pub success: bool,
    pub message: String,
    /// Router name to failure message
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub failures: BTreeMap<String, String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_operational_fold_error_overrides_down() {
        let folded = [
            OperationalStatus::Up,
            OperationalStatus::Down,
            OperationalStatus::Error,
            OperationalStatus::Up,
        ]
        .into_iter()
        .fold(OperationalStatus::Up, OperationalStatus::combine);
        assert_eq!(folded, OperationalStatus::Error);

        assert_eq!(
            OperationalStatus::Up.combine(OperationalStatus::Down),
            OperationalStatus::Down
        );
    }

    #[test]
    fn test_outcome_merge_keeps_most_severe() {
        let error = ReconciliationOutcome::Error("bad address".to_string());

        assert_eq!(
            error.clone().merge(ReconciliationOutcome::Reconciled),
            error
        );
        assert_eq!(
            ReconciliationOutcome::Reconciled.merge(error.clone()),
            error
        );
        assert_eq!(
            ReconciliationOutcome::InSync.merge(ReconciliationOutcome::Reconciled),
            ReconciliationOutcome::Reconciled
        );
        assert_eq!(
            ReconciliationOutcome::Reconciled.merge(ReconciliationOutcome::InSync),
            ReconciliationOutcome::Reconciled
        );

        let first = ReconciliationOutcome::Error("first".to_string());
        assert_eq!(
            first.clone().merge(ReconciliationOutcome::Error("second".to_string())),
            first
        );
    }

    #[test]
    fn test_from_reported_only_up_is_up() {
        assert_eq!(OperationalStatus::from_reported("UP"), OperationalStatus::Up);
        assert_eq!(OperationalStatus::from_reported("DOWN"), OperationalStatus::Down);
        assert_eq!(OperationalStatus::from_reported("UNKNOWN"), OperationalStatus::Down);
    }

    #[test]
    fn test_patch_shape() {
        let mut outcomes = BTreeMap::new();
        outcomes.insert("SR1".to_string(), ReconciliationOutcome::Provisioned);
        outcomes.insert(
            "SR2".to_string(),
            ReconciliationOutcome::Error("connection refused".to_string()),
        );
        let status = SliceStatus {
            phase: Phase::Error,
            service_type: "VPLS".to_string(),
            operational_status: None,
            message: "failed".to_string(),
            outcomes,
        };

        let value = serde_json::to_value(status.to_patch()).unwrap();
        assert_eq!(
            value,
            json!({
                "status": {
                    "Status": "Error",
                    "ServiceType": "VPLS",
                    "Message": "failed",
                    "ProvisionedEndpoints": {
                        "SR1": "VPLS Provisioned",
                        "SR2": "Error: connection refused"
                    }
                }
            })
        );
    }

    #[test]
    fn test_patch_includes_operational_status_when_set() {
        let mut status = SliceStatus::error("EPIPE", "x");
        status.operational_status = Some(OperationalStatus::Down);

        let value = serde_json::to_value(status.to_patch()).unwrap();
        assert_eq!(value["status"]["OperationalStatus"], "DOWN");
    }
}
