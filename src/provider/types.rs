//! Orchestrator-facing data shapes

use serde::{Deserialize, Serialize};
use std::fmt;

/// Orchestrator-level name of a cluster member, usually its host name
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeName(pub String);

impl NodeName {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeName {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

/// The part of an orchestrator node object the provider reads
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub name: String,
}

impl Node {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
        }
    }

    pub fn node_name(&self) -> NodeName {
        NodeName(self.name.clone())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeAddressType {
    #[serde(rename = "InternalIP")]
    InternalIp,
    #[serde(rename = "Hostname")]
    Hostname,
    #[serde(rename = "ExternalIP")]
    ExternalIp,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeAddress {
    #[serde(rename = "type")]
    pub kind: NodeAddressType,
    pub address: String,
}

impl NodeAddress {
    pub fn new(kind: NodeAddressType, address: &str) -> Self {
        Self {
            kind,
            address: address.to_string(),
        }
    }
}

/// Failure domain and region of an instance.
///
/// CloudStack has no separate region concept, both carry the zone name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Zone {
    pub failure_domain: String,
    pub region: String,
}

impl Zone {
    pub fn from_name(zone_name: &str) -> Self {
        Self {
            failure_domain: zone_name.to_string(),
            region: zone_name.to_string(),
        }
    }
}

/// Combined instance description returned by [`super::InstancesV2::instance_metadata`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceMetadata {
    pub provider_id: String,
    pub instance_type: String,
    pub node_addresses: Vec<NodeAddress>,
    pub zone: String,
    pub region: String,
}

/// Optional capabilities the orchestrator may ask a provider for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Capability {
    LoadBalancer,
    Instances,
    InstancesV2,
    Zones,
    Clusters,
    Routes,
}

impl Capability {
    pub const ALL: [Capability; 6] = [
        Capability::LoadBalancer,
        Capability::Instances,
        Capability::InstancesV2,
        Capability::Zones,
        Capability::Clusters,
        Capability::Routes,
    ];
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Capability::LoadBalancer => "load-balancer",
            Capability::Instances => "instances",
            Capability::InstancesV2 => "instances-v2",
            Capability::Zones => "zones",
            Capability::Clusters => "clusters",
            Capability::Routes => "routes",
        };
        f.write_str(name)
    }
}
