//! Expansion of an intent into per-router work items.

use super::{Endpoint, ServiceIntent, ServiceType};

/// The unit of work executed against exactly one router.
#[derive(Debug, Clone, Copy)]
pub struct WorkItem<'a> {
    pub intent: &'a ServiceIntent,
    pub service_type: ServiceType,
    pub endpoint: &'a Endpoint,
    pub router_name: &'a str,
    /// SDP id of the paired endpoint (EPIPE only)
    pub remote_sdp_id: Option<u32>,
}

/// Expand a validated intent into work items.
///
/// EPIPE yields exactly two items, `endpoints[0]` paired with `endpoints[1]`
/// and back, each carrying the other side's SDP id. Other service types
/// yield one item per endpoint that names a router.
pub fn expand(intent: &ServiceIntent, service_type: ServiceType) -> Vec<WorkItem<'_>> {
    match (service_type, intent.endpoints.as_slice()) {
        (ServiceType::Epipe, [a, b]) => [(a, b), (b, a)]
            .into_iter()
            .filter_map(|(local, remote)| {
                local.router().map(|router_name| WorkItem {
                    intent,
                    service_type,
                    endpoint: local,
                    router_name,
                    remote_sdp_id: Some(remote.sdp_id),
                })
            })
            .collect(),
        // Validation rejects any other EPIPE shape
        (ServiceType::Epipe, _) => Vec::new(),
        _ => intent
            .endpoints
            .iter()
            .filter_map(|endpoint| {
                endpoint.router().map(|router_name| WorkItem {
                    intent,
                    service_type,
                    endpoint,
                    router_name,
                    remote_sdp_id: None,
                })
            })
            .collect(),
    }
}
