//! Service payload model.
//!
//! Translates a [`WorkItem`] (intent + one endpoint + optional remote SDP id)
//! into a typed [`ConfigurationDocument`] targeting one device path. Rendering
//! is pure: the same inputs always produce the same document.
//!
//! # Example
//!
//! ```rust
//! use netslice::intent::{expand, ServiceIntent};
//! use netslice::payload::render;
//!
//! let intent: ServiceIntent = serde_json::from_str(r#"{
//!     "serviceType": "VPLS", "serviceId": "100",
//!     "endpoints": [{"routerName": "SR1", "interfaceName": "1/1/1", "vlanId": 10}]
//! }"#).unwrap();
//! let service_type = intent.validate().unwrap();
//! let items = expand(&intent, service_type);
//!
//! let doc = render(&items[0]).unwrap();
//! assert_eq!(doc.path, "/configure/service/vpls[service-name=VPLS_100]");
//! ```

mod epipe;
mod error;
mod vprn;
mod vpls;


pub use epipe::EpipePayload;
pub use error::PayloadError;
pub use vpls::VplsPayload;
pub use vprn::{BgpIpvpn, VprnInterface, VprnPayload};

use crate::intent::{AdminState, ServiceIntent, ServiceType, WorkItem};
use serde::{Deserialize, Serialize};

/// Fields carried by every service document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CommonFields {
    pub admin_state: AdminState,
    pub description: String,
    pub customer: String,
    pub service_id: String,
}

impl CommonFields {
    fn from_intent(intent: &ServiceIntent) -> Self {
        Self {
            admin_state: intent.admin_state,
            description: intent.description(),
            customer: intent.customer_id.to_string(),
            service_id: intent.service_id().to_string(),
        }
    }
}

/// Service access point entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Sap {
    pub sap_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin_state: Option<AdminState>,
}

/// SDP binding entry (`"{sdpId}:{serviceId}"`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SdpBinding {
    pub sdp_bind_id: String,
}

impl SdpBinding {
    fn new(sdp_id: u32, service_id: &str) -> Self {
        Self {
            sdp_bind_id: format!("{}:{}", sdp_id, service_id),
        }
    }
}

/// Type-specific payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ServicePayload {
    Vpls(VplsPayload),
    Vprn(VprnPayload),
    Epipe(EpipePayload),
}

impl ServicePayload {
    pub fn common(&self) -> &CommonFields {
        match self {
            ServicePayload::Vpls(p) => &p.common,
            ServicePayload::Vprn(p) => &p.common,
            ServicePayload::Epipe(p) => &p.common,
        }
    }

    pub fn service_type(&self) -> ServiceType {
        match self {
            ServicePayload::Vpls(_) => ServiceType::Vpls,
            ServicePayload::Vprn(_) => ServiceType::Vprn,
            ServicePayload::Epipe(_) => ServiceType::Epipe,
        }
    }

    /// The SAP this endpoint attaches with. VPRN nests it under the interface.
    pub fn sap_id(&self) -> Option<&str> {
        let sap = match self {
            ServicePayload::Vpls(p) => p.sap.first(),
            ServicePayload::Vprn(p) => p.interface.first().and_then(|i| i.sap.first()),
            ServicePayload::Epipe(p) => p.sap.first(),
        };
        sap.map(|s| s.sap_id.as_str())
    }
}

/// A rendered document plus the device path it targets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfigurationDocument {
    pub path: String,
    pub payload: ServicePayload,
}

impl ConfigurationDocument {
    /// Encode the payload as the JSON value sent in a Set update.
    pub fn to_value(&self) -> Result<serde_json::Value, PayloadError> {
        serde_json::to_value(&self.payload).map_err(|e| PayloadError::Encode(e.to_string()))
    }

    /// The `(path, value)` update pair for a Set request.
    pub fn to_update(&self) -> Result<(String, serde_json::Value), PayloadError> {
        Ok((self.path.clone(), self.to_value()?))
    }
}

/// Device path for a service's configuration subtree.
///
/// VPRN is keyed by `service-id` while carrying the service name, matching
/// how the rest of the fleet addresses it.
pub fn service_path(service_type: ServiceType, service_name: &str) -> String {
    let key = match service_type {
        ServiceType::Vprn => "service-id",
        ServiceType::Vpls | ServiceType::Epipe => "service-name",
    };
    format!(
        "/configure/service/{}[{}={}]",
        service_type.path_segment(),
        key,
        service_name
    )
}

/// Operational state path for a service id.
pub fn oper_state_path(service_id: &str) -> String {
    format!("/state/service/id[service-id={}]/oper-state", service_id)
}

/// Render the configuration document for one work item.
///
/// The declared service type is re-checked here so that a document is never
/// emitted for a type the model does not know, even if validation was skipped.
pub fn render(item: &WorkItem<'_>) -> Result<ConfigurationDocument, PayloadError> {
    let declared = item
        .intent
        .service_type()
        .map_err(|_| PayloadError::UnsupportedServiceType(item.intent.service_type_label()))?;
    if declared != item.service_type {
        return Err(PayloadError::UnsupportedServiceType(
            item.intent.service_type_label(),
        ));
    }

    let common = CommonFields::from_intent(item.intent);
    let payload = match item.service_type {
        ServiceType::Vpls => ServicePayload::Vpls(vpls::build(item, common)),
        ServiceType::Vprn => ServicePayload::Vprn(vprn::build(item, common)?),
        ServiceType::Epipe => ServicePayload::Epipe(epipe::build(item, common)?),
    };

    Ok(ConfigurationDocument {
        path: service_path(item.service_type, &item.intent.service_name()),
        payload,
    })
}
