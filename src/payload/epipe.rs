//! EPIPE payload.
//!
//! An EPIPE is two-sided: each router's document binds its spoke-SDP to the
//! SDP id declared on the *other* endpoint.

use super::{CommonFields, PayloadError, Sap, SdpBinding};
use crate::intent::WorkItem;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct EpipePayload {
    #[serde(flatten)]
    pub common: CommonFields,
    pub sap: Vec<Sap>,
    pub spoke_sdp: SdpBinding,
}

pub(super) fn build(
    item: &WorkItem<'_>,
    common: CommonFields,
) -> Result<EpipePayload, PayloadError> {
    let remote_sdp_id = item
        .remote_sdp_id
        .ok_or_else(|| PayloadError::MissingRemoteSdp(item.router_name.to_string()))?;
    let spoke_sdp = SdpBinding::new(remote_sdp_id, &common.service_id);

    Ok(EpipePayload {
        common,
        sap: vec![Sap {
            sap_id: item.endpoint.sap_id(),
            admin_state: None,
        }],
        spoke_sdp,
    })
}
