//! VPLS payload.

use super::{CommonFields, Sap, SdpBinding};
use crate::intent::{AdminState, VplsMode, WorkItem};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct VplsPayload {
    #[serde(flatten)]
    pub common: CommonFields,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mesh_sdp: Option<Vec<SdpBinding>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spoke_sdp: Option<Vec<SdpBinding>>,
    pub sap: Vec<Sap>,
}

pub(super) fn build(item: &WorkItem<'_>, common: CommonFields) -> VplsPayload {
    let binding = vec![SdpBinding::new(item.endpoint.sdp_id, &common.service_id)];
    let (mesh_sdp, spoke_sdp) = match item.intent.vpls_mode {
        VplsMode::Mesh => (Some(binding), None),
        VplsMode::Spoke => (None, Some(binding)),
    };

    VplsPayload {
        common,
        mesh_sdp,
        spoke_sdp,
        sap: vec![Sap {
            sap_id: item.endpoint.sap_id(),
            admin_state: Some(AdminState::Enable),
        }],
    }
}
