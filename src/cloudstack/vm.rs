//! Virtual machine records
//!
//! Only the fields the provider reads are modelled; everything else in the
//! `listVirtualMachines` response is ignored. Missing fields decode as empty.

use serde::{Deserialize, Serialize};

/// A virtual machine as returned by `listVirtualMachines`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VirtualMachine {
    pub id: String,
    pub name: String,
    #[serde(rename = "displayname")]
    pub display_name: String,
    #[serde(rename = "hostname")]
    pub host_name: String,
    #[serde(rename = "zonename")]
    pub zone_name: String,
    #[serde(rename = "serviceofferingname")]
    pub service_offering_name: String,
    #[serde(rename = "publicip")]
    pub public_ip: String,
    pub state: String,
    pub nic: Vec<Nic>,
}

/// A network interface attached to a virtual machine
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Nic {
    pub id: String,
    #[serde(rename = "ipaddress")]
    pub ip_address: String,
    #[serde(rename = "networkname")]
    pub network_name: String,
    #[serde(rename = "isdefault")]
    pub is_default: bool,
}

/// Body of a `listvirtualmachinesresponse`
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct ListVirtualMachinesResponse {
    #[serde(rename = "virtualmachine")]
    pub virtual_machines: Vec<VirtualMachine>,
}
