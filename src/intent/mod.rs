//! Declared network slice intent.
//!
//! A [`ServiceIntent`] names a service type, service parameters and the
//! attachment endpoints on each router. It is supplied by the caller and is
//! never mutated by a reconciliation pass.
//!
//! # Example
//!
//! ```rust
//! use netslice::intent::{ServiceIntent, ServiceType};
//!
//! let intent: ServiceIntent = serde_json::from_str(r#"{
//!     "serviceType": "VPLS",
//!     "serviceId": "100",
//!     "endpoints": [{"routerName": "SR1", "interfaceName": "1/1/1", "vlanId": 10}]
//! }"#).unwrap();
//!
//! assert_eq!(intent.validate().unwrap(), ServiceType::Vpls);
//! assert_eq!(intent.service_name(), "VPLS_100");
//! ```

mod error;
pub mod work;

pub use error::{IntentFileError, ValidationError};
pub use work::{expand, WorkItem};

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Default SDP id bound when an endpoint does not name one.
pub const DEFAULT_SDP_ID: u32 = 1000;

/// Default VPRN interface address when an endpoint does not name one.
pub const DEFAULT_IP_ADDRESS: &str = "10.0.0.1/30";

/// Supported service types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ServiceType {
    /// Multipoint L2 service
    Vpls,
    /// L3 VPN routing instance
    Vprn,
    /// Point-to-point L2 pseudowire
    Epipe,
}

impl ServiceType {
    /// Lower-case segment used in `/configure/service/<type>` paths.
    pub fn path_segment(self) -> &'static str {
        match self {
            ServiceType::Vpls => "vpls",
            ServiceType::Vprn => "vprn",
            ServiceType::Epipe => "epipe",
        }
    }
}

impl fmt::Display for ServiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ServiceType::Vpls => "VPLS",
            ServiceType::Vprn => "VPRN",
            ServiceType::Epipe => "EPIPE",
        };
        f.write_str(s)
    }
}

impl FromStr for ServiceType {
    type Err = ValidationError;

    /// Exact match only. `ePipe` is accepted as the legacy spelling of EPIPE.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "VPLS" => Ok(ServiceType::Vpls),
            "VPRN" => Ok(ServiceType::Vprn),
            "EPIPE" | "ePipe" => Ok(ServiceType::Epipe),
            _ => Err(ValidationError::InvalidServiceType(s.to_string())),
        }
    }
}

/// Administrative state pushed to the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AdminState {
    #[default]
    Enable,
    Disable,
}

impl AdminState {
    pub fn as_str(self) -> &'static str {
        match self {
            AdminState::Enable => "enable",
            AdminState::Disable => "disable",
        }
    }
}

impl fmt::Display for AdminState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a VPLS instance binds its SDP.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum VplsMode {
    #[default]
    #[serde(alias = "mesh-sdp")]
    Mesh,
    #[serde(alias = "spoke-sdp")]
    Spoke,
}

/// One router-side attachment point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Endpoint {
    /// Key into the router credential set; endpoints without one are skipped
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub router_name: Option<String>,
    pub interface_name: String,
    #[serde(alias = "vlanID")]
    pub vlan_id: u16,
    #[serde(default = "default_sdp_id")]
    pub sdp_id: u32,
    /// CIDR string, only used by VPRN
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
}

impl Endpoint {
    /// SAP identifier `"{interfaceName}:{vlanId}"`.
    pub fn sap_id(&self) -> String {
        format!("{}:{}", self.interface_name, self.vlan_id)
    }

    pub fn ip_address(&self) -> &str {
        self.ip_address.as_deref().unwrap_or(DEFAULT_IP_ADDRESS)
    }

    /// Router name, treating an empty string as absent.
    pub fn router(&self) -> Option<&str> {
        self.router_name.as_deref().filter(|name| !name.is_empty())
    }
}

fn default_sdp_id() -> u32 {
    DEFAULT_SDP_ID
}

fn default_customer_id() -> u32 {
    1
}

/// Declared desired state for one network slice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceIntent {
    /// Raw service type as declared; checked by [`ServiceIntent::validate`]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_type: Option<String>,
    #[serde(
        default,
        deserialize_with = "deserialize_service_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub service_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_name: Option<String>,
    #[serde(default = "default_customer_id", alias = "customer")]
    pub customer_id: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub admin_state: AdminState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub router_id: Option<String>,
    #[serde(default, alias = "vplsType")]
    pub vpls_mode: VplsMode,
    #[serde(default)]
    pub endpoints: Vec<Endpoint>,
}

impl ServiceIntent {
    /// Check the service type and endpoint invariants.
    ///
    /// Returns the parsed service type on success. Nothing here touches a
    /// device, so a failing intent never opens a session.
    pub fn validate(&self) -> Result<ServiceType, ValidationError> {
        let service_type = self.service_type()?;

        if self.service_id.as_deref().is_none_or(str::is_empty) {
            return Err(ValidationError::MissingField("serviceId"));
        }

        match service_type {
            ServiceType::Epipe => {
                if self.endpoints.len() != 2 {
                    return Err(ValidationError::EpipeEndpointCount(self.endpoints.len()));
                }
                if let Some(index) = self.endpoints.iter().position(|e| e.router().is_none()) {
                    return Err(ValidationError::EpipeEndpointUnrouted { index });
                }
            }
            ServiceType::Vpls | ServiceType::Vprn => {
                if !self.endpoints.iter().any(|e| e.router().is_some()) {
                    return Err(ValidationError::NoRoutedEndpoints(service_type.to_string()));
                }
            }
        }

        if service_type == ServiceType::Vprn && self.router_id.as_deref().is_none_or(str::is_empty)
        {
            return Err(ValidationError::MissingField("routerId"));
        }

        Ok(service_type)
    }

    /// Parse the declared service type.
    pub fn service_type(&self) -> Result<ServiceType, ValidationError> {
        match self.service_type.as_deref() {
            Some(raw) => raw.parse(),
            None => Err(ValidationError::InvalidServiceType("<none>".to_string())),
        }
    }

    /// Declared service type for display, even when invalid.
    pub fn service_type_label(&self) -> String {
        match self.service_type() {
            Ok(t) => t.to_string(),
            Err(_) => self
                .service_type
                .clone()
                .unwrap_or_else(|| "Unknown".to_string()),
        }
    }

    pub fn service_id(&self) -> &str {
        self.service_id.as_deref().unwrap_or_default()
    }

    /// Service name, derived as `"{serviceType}_{serviceId}"` when absent.
    pub fn service_name(&self) -> String {
        match &self.service_name {
            Some(name) if !name.is_empty() => name.clone(),
            _ => format!("{}_{}", self.service_type_label(), self.service_id()),
        }
    }

    /// Description, defaulting to `"Service {serviceType} {serviceId}"`.
    pub fn description(&self) -> String {
        match &self.description {
            Some(d) => d.clone(),
            None => format!("Service {} {}", self.service_type_label(), self.service_id()),
        }
    }

    /// Load an intent from a TOML or JSON file, chosen by extension.
    pub fn load(path: &Path) -> Result<Self, IntentFileError> {
        if !path.exists() {
            return Err(IntentFileError::NotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)?;
        let parse_err = |message: String| IntentFileError::Parse {
            path: path.to_path_buf(),
            message,
        };

        match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => toml::from_str(&content).map_err(|e| parse_err(e.to_string())),
            _ => serde_json::from_str(&content).map_err(|e| parse_err(e.to_string())),
        }
    }
}

/// Accepts `"100"` or `100` for the opaque service id.
fn deserialize_service_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(u64),
    }

    Ok(Option::<Raw>::deserialize(deserializer)?.map(|raw| match raw {
        Raw::Text(s) => s,
        Raw::Number(n) => n.to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn endpoint(router: Option<&str>, vlan: u16) -> Endpoint {
        Endpoint {
            router_name: router.map(str::to_string),
            interface_name: "1/1/1".to_string(),
            vlan_id: vlan,
            sdp_id: DEFAULT_SDP_ID,
            ip_address: None,
        }
    }

    fn intent(service_type: Option<&str>, endpoints: Vec<Endpoint>) -> ServiceIntent {
        ServiceIntent {
            service_type: service_type.map(str::to_string),
            service_id: Some("100".to_string()),
            service_name: None,
            customer_id: 1,
            description: None,
            admin_state: AdminState::Enable,
            router_id: Some("10.10.10.1".to_string()),
            vpls_mode: VplsMode::Mesh,
            endpoints,
        }
    }

    #[test]
    fn test_parse_minimal_json_applies_defaults() {
        let intent: ServiceIntent = serde_json::from_str(
            r#"{"serviceType":"VPLS","serviceId":100,
                "endpoints":[{"routerName":"SR1","interfaceName":"1/1/1","vlanID":10}]}"#,
        )
        .unwrap();

        assert_eq!(intent.service_id(), "100");
        assert_eq!(intent.customer_id, 1);
        assert_eq!(intent.admin_state, AdminState::Enable);
        assert_eq!(intent.vpls_mode, VplsMode::Mesh);
        assert_eq!(intent.endpoints[0].sdp_id, 1000);
        assert_eq!(intent.endpoints[0].ip_address(), "10.0.0.1/30");
        assert_eq!(intent.service_name(), "VPLS_100");
        assert_eq!(intent.description(), "Service VPLS 100");
    }

    #[test]
    fn test_parse_toml_with_legacy_keys() {
        let toml = r#"
        serviceType = "ePipe"
        serviceId = "200"
        customer = 7
        vplsType = "spoke-sdp"

        [[endpoints]]
        routerName = "SR1"
        interfaceName = "1/1/2"
        vlanId = 20
        sdpId = 1001
        "#;
        let intent: ServiceIntent = toml::from_str(toml).unwrap();
        assert_eq!(intent.service_type().unwrap(), ServiceType::Epipe);
        assert_eq!(intent.customer_id, 7);
        assert_eq!(intent.vpls_mode, VplsMode::Spoke);
        assert_eq!(intent.service_name(), "EPIPE_200");
    }

    #[test]
    fn test_explicit_service_name_wins() {
        let mut i = intent(Some("VPLS"), vec![endpoint(Some("SR1"), 10)]);
        i.service_name = Some("customer-a".to_string());
        assert_eq!(i.service_name(), "customer-a");
    }

    #[test]
    fn test_validate_rejects_unknown_service_type() {
        let i = intent(Some("EVPN"), vec![endpoint(Some("SR1"), 10)]);
        assert_eq!(
            i.validate(),
            Err(ValidationError::InvalidServiceType("EVPN".to_string()))
        );
    }

    #[test]
    fn test_service_type_must_match_exactly() {
        for raw in ["vpls", "Vprn", "epipe", "EPipe", " VPLS"] {
            assert_eq!(
                raw.parse::<ServiceType>(),
                Err(ValidationError::InvalidServiceType(raw.to_string())),
                "{raw} should be rejected"
            );
        }

        let i = intent(Some("vpls"), vec![endpoint(Some("SR1"), 10)]);
        assert!(matches!(
            i.validate(),
            Err(ValidationError::InvalidServiceType(ref found)) if found == "vpls"
        ));
    }

    #[test]
    fn test_service_type_canonical_names_and_legacy_epipe() {
        assert_eq!("VPLS".parse(), Ok(ServiceType::Vpls));
        assert_eq!("VPRN".parse(), Ok(ServiceType::Vprn));
        assert_eq!("EPIPE".parse(), Ok(ServiceType::Epipe));
        assert_eq!("ePipe".parse(), Ok(ServiceType::Epipe));
    }

    #[test]
    fn test_validate_rejects_missing_service_type() {
        let i = intent(None, vec![endpoint(Some("SR1"), 10)]);
        assert!(matches!(
            i.validate(),
            Err(ValidationError::InvalidServiceType(_))
        ));
    }

    #[test]
    fn test_validate_epipe_endpoint_count() {
        for count in [0usize, 1, 3] {
            let endpoints = (0..count).map(|_| endpoint(Some("SR1"), 10)).collect();
            let i = intent(Some("EPIPE"), endpoints);
            assert_eq!(
                i.validate(),
                Err(ValidationError::EpipeEndpointCount(count))
            );
        }

        let i = intent(
            Some("EPIPE"),
            vec![endpoint(Some("SR1"), 10), endpoint(Some("SR2"), 10)],
        );
        assert_eq!(i.validate(), Ok(ServiceType::Epipe));
    }

    #[test]
    fn test_validate_epipe_requires_both_routers() {
        let i = intent(
            Some("EPIPE"),
            vec![endpoint(Some("SR1"), 10), endpoint(None, 10)],
        );
        assert_eq!(
            i.validate(),
            Err(ValidationError::EpipeEndpointUnrouted { index: 1 })
        );
    }

    #[test]
    fn test_validate_vpls_requires_a_routed_endpoint() {
        let i = intent(Some("VPLS"), vec![endpoint(None, 10), endpoint(Some(""), 11)]);
        assert!(matches!(
            i.validate(),
            Err(ValidationError::NoRoutedEndpoints(_))
        ));
    }

    #[test]
    fn test_validate_vprn_requires_router_id() {
        let mut i = intent(Some("VPRN"), vec![endpoint(Some("SR1"), 10)]);
        i.router_id = None;
        assert_eq!(i.validate(), Err(ValidationError::MissingField("routerId")));
    }

    #[test]
    fn test_validate_requires_service_id() {
        let mut i = intent(Some("VPLS"), vec![endpoint(Some("SR1"), 10)]);
        i.service_id = None;
        assert_eq!(i.validate(), Err(ValidationError::MissingField("serviceId")));
    }

    #[test]
    fn test_load_missing_file() {
        let result = ServiceIntent::load(Path::new("/nonexistent/slice.toml"));
        assert!(matches!(result, Err(IntentFileError::NotFound(_))));
    }

    #[test]
    fn test_load_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("slice.json");
        std::fs::write(
            &path,
            r#"{"serviceType":"VPRN","serviceId":"300","routerId":"1.1.1.1",
                "endpoints":[{"routerName":"SR3","interfaceName":"1/1/3","vlanId":30,"ipAddress":"192.168.0.1/24"}]}"#,
        )
        .unwrap();

        let intent = ServiceIntent::load(&path).unwrap();
        assert_eq!(intent.validate().unwrap(), ServiceType::Vprn);
        assert_eq!(intent.endpoints[0].ip_address(), "192.168.0.1/24");
    }

    #[test]
    fn test_load_reports_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("slice.toml");
        std::fs::write(&path, "serviceType = [").unwrap();

        assert!(matches!(
            ServiceIntent::load(&path),
            Err(IntentFileError::Parse { .. })
        ));
    }
}
