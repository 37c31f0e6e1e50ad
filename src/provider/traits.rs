//! Capability traits a cloud provider exposes to the orchestrator

use super::error::ProviderError;
use super::types::{Capability, InstanceMetadata, Node, NodeAddress, NodeName, Zone};
use async_trait::async_trait;

pub type Result<T> = std::result::Result<T, ProviderError>;

/// Entry point the orchestrator holds for a configured provider
pub trait CloudProvider: Send + Sync {
    /// Called once by the host after construction
    fn initialize(&self) {}

    fn provider_name(&self) -> &str;

    fn has_cluster_id(&self) -> bool;

    /// Whether the provider implements `capability` in its current state
    fn supports(&self, capability: Capability) -> bool;

    fn instances(&self) -> Option<&dyn Instances>;

    fn instances_v2(&self) -> Option<&dyn InstancesV2>;

    fn zones(&self) -> Option<&dyn Zones>;
}

/// Per-node identity and addressing
#[async_trait]
pub trait Instances: Send + Sync {
    async fn node_addresses(&self, name: &NodeName) -> Result<Vec<NodeAddress>>;

    async fn node_addresses_by_provider_id(&self, provider_id: &str) -> Result<Vec<NodeAddress>>;

    async fn instance_id(&self, name: &NodeName) -> Result<String>;

    async fn instance_type(&self, name: &NodeName) -> Result<String>;

    async fn instance_type_by_provider_id(&self, provider_id: &str) -> Result<String>;

    async fn add_ssh_key_to_all_instances(&self, user: &str, key_data: &[u8]) -> Result<()>;

    async fn current_node_name(&self, hostname: &str) -> Result<NodeName>;

    async fn instance_exists_by_provider_id(&self, provider_id: &str) -> Result<bool>;

    async fn instance_shutdown_by_provider_id(&self, provider_id: &str) -> Result<bool>;
}

/// Node-object based instance queries
#[async_trait]
pub trait InstancesV2: Send + Sync {
    async fn instance_exists(&self, node: &Node) -> Result<bool>;

    async fn instance_shutdown(&self, node: &Node) -> Result<bool>;

    async fn instance_metadata(&self, node: &Node) -> Result<InstanceMetadata>;
}

#[async_trait]
pub trait Zones: Send + Sync {
    /// Zone of the host the provider is running on
    async fn get_zone(&self) -> Result<Zone>;

    async fn get_zone_by_provider_id(&self, provider_id: &str) -> Result<Zone>;

    async fn get_zone_by_node_name(&self, name: &NodeName) -> Result<Zone>;
}
