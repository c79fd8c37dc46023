//! VPRN payload.

use super::{CommonFields, PayloadError, Sap};
use crate::intent::{AdminState, WorkItem};
use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;

/// Route-distinguisher / route-target administrator field.
const BGP_ASN: u32 = 64496;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct VprnPayload {
    #[serde(flatten)]
    pub common: CommonFields,
    pub router_id: String,
    pub interface: Vec<VprnInterface>,
    pub bgp_ipvpn: BgpIpvpn,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct VprnInterface {
    pub interface_name: String,
    pub ipv4: Ipv4,
    pub sap: Vec<Sap>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ipv4 {
    pub primary: PrimaryAddress,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PrimaryAddress {
    pub address: String,
    pub prefix_length: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BgpIpvpn {
    pub mpls: Mpls,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Mpls {
    pub admin_state: AdminState,
    pub auto_bind_tunnel: AutoBindTunnel,
    pub route_distinguisher: String,
    pub vrf_target: VrfTarget,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutoBindTunnel {
    pub resolution: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VrfTarget {
    pub community: String,
}

/// Split `"a.b.c.d/len"` into address and prefix length.
pub(super) fn split_cidr(cidr: &str) -> Result<(Ipv4Addr, u8), PayloadError> {
    let invalid = |message: &str| PayloadError::InvalidAddress {
        address: cidr.to_string(),
        message: message.to_string(),
    };

    let (address, prefix) = cidr
        .split_once('/')
        .ok_or_else(|| invalid("expected address/prefix-length"))?;
    let address: Ipv4Addr = address
        .trim()
        .parse()
        .map_err(|_| invalid("not an IPv4 address"))?;
    let prefix: u8 = prefix
        .trim()
        .parse()
        .map_err(|_| invalid("prefix length is not a number"))?;
    if prefix > 32 {
        return Err(invalid("prefix length exceeds 32"));
    }

    Ok((address, prefix))
}

pub(super) fn build(item: &WorkItem<'_>, common: CommonFields) -> Result<VprnPayload, PayloadError> {
    let endpoint = item.endpoint;
    let (address, prefix_length) = split_cidr(endpoint.ip_address())?;
    let service_id = common.service_id.clone();

    Ok(VprnPayload {
        common,
        router_id: item.intent.router_id.clone().unwrap_or_default(),
        interface: vec![VprnInterface {
            interface_name: format!("{}{}", endpoint.interface_name, endpoint.vlan_id),
            ipv4: Ipv4 {
                primary: PrimaryAddress {
                    address: address.to_string(),
                    prefix_length,
                },
            },
            sap: vec![Sap {
                sap_id: endpoint.sap_id(),
                admin_state: None,
            }],
        }],
        bgp_ipvpn: BgpIpvpn {
            mpls: Mpls {
                admin_state: AdminState::Enable,
                auto_bind_tunnel: AutoBindTunnel {
                    resolution: "any".to_string(),
                },
                route_distinguisher: format!("{}:{}", BGP_ASN, service_id),
                vrf_target: VrfTarget {
                    community: format!("target:{}:{}", BGP_ASN, service_id),
                },
            },
        },
    })
}
