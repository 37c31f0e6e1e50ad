//! Instance queries
//!
//! Each query performs a single project-scoped `listVirtualMachines` lookup
//! and reshapes the result.

use super::cloud::CsCloud;
use super::error::ProviderError;
use super::traits::{Instances, InstancesV2, Result, Zones};
use super::types::{InstanceMetadata, Node, NodeAddress, NodeAddressType, NodeName};
use super::PROVIDER_NAME;
use crate::cloudstack::VirtualMachine;
use async_trait::async_trait;
use regex::Regex;
use std::sync::LazyLock;

/// Characters that may never appear in a label value
static LABEL_INVALID_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^-A-Za-z0-9_.]").expect("label regex should compile"));

/// Turn a service offering name into a label-safe instance type.
///
/// Drops characters outside `[A-Za-z0-9._-]`, then trims anything
/// non-alphanumeric from both ends.
pub fn sanitize_instance_type(offering: &str) -> String {
    LABEL_INVALID_CHARS
        .replace_all(offering, "")
        .trim_matches(|c: char| !c.is_ascii_alphanumeric())
        .to_string()
}

/// Addresses of an instance: internal IP, then host name and public IP when known
pub fn node_addresses(instance: &VirtualMachine) -> Result<Vec<NodeAddress>> {
    let nic = instance.nic.first().ok_or(ProviderError::NoInternalAddress)?;

    let mut addresses = vec![NodeAddress::new(NodeAddressType::InternalIp, &nic.ip_address)];

    if !instance.host_name.is_empty() {
        addresses.push(NodeAddress::new(NodeAddressType::Hostname, &instance.host_name));
    }

    if !instance.public_ip.is_empty() {
        addresses.push(NodeAddress::new(NodeAddressType::ExternalIp, &instance.public_ip));
    } else {
        // Without static NAT there is no way to learn the external IP
        tracing::info!(
            "Could not determine the public IP of host {} ({})",
            instance.name,
            instance.id
        );
    }

    Ok(addresses)
}

impl CsCloud {
    async fn instance_by_name(
        &self,
        name: &NodeName,
        context: &'static str,
    ) -> Result<VirtualMachine> {
        self.client()?
            .virtual_machine_by_name(name.as_str(), self.project_id())
            .await
            .map_err(|source| ProviderError::lookup(context, source))
    }

    async fn instance_by_id(
        &self,
        provider_id: &str,
        context: &'static str,
    ) -> Result<VirtualMachine> {
        self.client()?
            .virtual_machine_by_id(provider_id, self.project_id())
            .await
            .map_err(|source| ProviderError::lookup(context, source))
    }
}

/// Zero matches means the instance is gone, anything else is an error
fn existence(lookup: Result<VirtualMachine>) -> Result<bool> {
    match lookup {
        Ok(_) => Ok(true),
        Err(ProviderError::InstanceNotFound) => Ok(false),
        Err(err) => Err(err),
    }
}

#[async_trait]
impl Instances for CsCloud {
    async fn node_addresses(&self, name: &NodeName) -> Result<Vec<NodeAddress>> {
        let instance = self
            .instance_by_name(name, "error retrieving node addresses")
            .await?;
        node_addresses(&instance)
    }

    async fn node_addresses_by_provider_id(&self, provider_id: &str) -> Result<Vec<NodeAddress>> {
        let instance = self
            .instance_by_id(provider_id, "error retrieving node addresses")
            .await?;
        node_addresses(&instance)
    }

    async fn instance_id(&self, name: &NodeName) -> Result<String> {
        let instance = self
            .instance_by_name(name, "error retrieving instance ID")
            .await?;
        Ok(instance.id)
    }

    async fn instance_type(&self, name: &NodeName) -> Result<String> {
        let instance = self
            .instance_by_name(name, "error retrieving instance type")
            .await?;
        Ok(sanitize_instance_type(&instance.service_offering_name))
    }

    async fn instance_type_by_provider_id(&self, provider_id: &str) -> Result<String> {
        let instance = self
            .instance_by_id(provider_id, "error retrieving instance type")
            .await?;
        Ok(sanitize_instance_type(&instance.service_offering_name))
    }

    async fn add_ssh_key_to_all_instances(&self, _user: &str, _key_data: &[u8]) -> Result<()> {
        Err(ProviderError::NotImplemented)
    }

    async fn current_node_name(&self, hostname: &str) -> Result<NodeName> {
        Ok(NodeName(hostname.to_string()))
    }

    async fn instance_exists_by_provider_id(&self, provider_id: &str) -> Result<bool> {
        existence(self.instance_by_id(provider_id, "error retrieving instance").await)
    }

    async fn instance_shutdown_by_provider_id(&self, _provider_id: &str) -> Result<bool> {
        Err(ProviderError::NotImplemented)
    }
}

#[async_trait]
impl InstancesV2 for CsCloud {
    async fn instance_exists(&self, node: &Node) -> Result<bool> {
        existence(
            self.instance_by_name(&node.node_name(), "error retrieving instance")
                .await,
        )
    }

    async fn instance_shutdown(&self, _node: &Node) -> Result<bool> {
        Err(ProviderError::NotImplemented)
    }

    async fn instance_metadata(&self, node: &Node) -> Result<InstanceMetadata> {
        let name = node.node_name();

        let instance_type = self.instance_type(&name).await?;
        let node_addresses = self.node_addresses(&name).await?;
        let zone = self.get_zone_by_node_name(&name).await?;

        Ok(InstanceMetadata {
            // Reports the provider name, not a per-instance provider ID
            provider_id: PROVIDER_NAME.to_string(),
            instance_type,
            node_addresses,
            zone: zone.failure_domain,
            region: zone.region,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::testing::{vm, MockApi};
    use std::sync::Arc;

    fn cloud(api: &Arc<MockApi>) -> CsCloud {
        CsCloud::with_client(api.clone(), Some("proj".into()), None)
    }

    #[test]
    fn test_sanitize_instance_type() {
        assert_eq!(sanitize_instance_type("m1.small!!"), "m1.small");
        assert_eq!(sanitize_instance_type("##gpu-large"), "gpu-large");
        assert_eq!(sanitize_instance_type("Medium Instance"), "MediumInstance");
        assert_eq!(sanitize_instance_type("c2_standard-4"), "c2_standard-4");
        assert_eq!(sanitize_instance_type("-._"), "");
    }

    #[test]
    fn test_single_internal_address() {
        let addresses = node_addresses(&vm("node-1", "zone-a")).unwrap();
        assert_eq!(
            addresses,
            vec![NodeAddress::new(NodeAddressType::InternalIp, "10.0.0.5")]
        );
    }

    #[test]
    fn test_all_addresses_in_order() {
        let mut instance = vm("node-1", "zone-a");
        instance.host_name = "node1".into();
        instance.public_ip = "203.0.113.9".into();

        let addresses = node_addresses(&instance).unwrap();
        assert_eq!(
            addresses,
            vec![
                NodeAddress::new(NodeAddressType::InternalIp, "10.0.0.5"),
                NodeAddress::new(NodeAddressType::Hostname, "node1"),
                NodeAddress::new(NodeAddressType::ExternalIp, "203.0.113.9"),
            ]
        );
    }

    #[test]
    fn test_no_nic_is_an_error() {
        let mut instance = vm("node-1", "zone-a");
        instance.nic.clear();
        assert!(matches!(
            node_addresses(&instance),
            Err(ProviderError::NoInternalAddress)
        ));
    }

    #[tokio::test]
    async fn test_lookups_by_name_and_id() {
        let mut instance = vm("node-1", "zone-a");
        instance.service_offering_name = "m1.small!!".into();
        let api = Arc::new(MockApi::with_vms(vec![instance]));
        let cloud = cloud(&api);
        let name = NodeName::from("node-1");

        assert_eq!(cloud.instance_id(&name).await.unwrap(), "id-node-1");
        assert_eq!(cloud.instance_type(&name).await.unwrap(), "m1.small");
        assert_eq!(
            cloud.instance_type_by_provider_id("id-node-1").await.unwrap(),
            "m1.small"
        );
        assert_eq!(cloud.node_addresses(&name).await.unwrap().len(), 1);
        assert_eq!(
            cloud
                .node_addresses_by_provider_id("id-node-1")
                .await
                .unwrap()
                .len(),
            1
        );
        assert_eq!(api.calls(), 5);
        assert_eq!(api.last_project().as_deref(), Some("proj"));
    }

    #[tokio::test]
    async fn test_missing_instance_maps_to_instance_not_found() {
        let api = Arc::new(MockApi::default());
        let cloud = cloud(&api);

        assert!(matches!(
            cloud.instance_id(&"ghost".into()).await,
            Err(ProviderError::InstanceNotFound)
        ));
        assert!(matches!(
            cloud.node_addresses_by_provider_id("ghost").await,
            Err(ProviderError::InstanceNotFound)
        ));
    }

    #[tokio::test]
    async fn test_remote_failure_names_operation() {
        let api = Arc::new(MockApi::failing());
        let err = cloud(&api).instance_type(&"node-1".into()).await.unwrap_err();
        assert!(matches!(err, ProviderError::Remote { .. }));
        assert!(err.to_string().starts_with("error retrieving instance type: "));
    }

    #[tokio::test]
    async fn test_existence() {
        let api = Arc::new(MockApi::with_vms(vec![vm("node-1", "zone-a")]));
        let cloud = cloud(&api);

        assert!(cloud.instance_exists_by_provider_id("id-node-1").await.unwrap());
        assert!(!cloud.instance_exists_by_provider_id("ghost").await.unwrap());
        assert!(cloud.instance_exists(&Node::new("node-1")).await.unwrap());
        assert!(!cloud.instance_exists(&Node::new("ghost")).await.unwrap());
        assert_eq!(api.calls(), 4);

        let failing = Arc::new(MockApi::failing());
        let cloud = CsCloud::with_client(failing, None, None);
        assert!(cloud.instance_exists_by_provider_id("id-node-1").await.is_err());
        assert!(cloud.instance_exists(&Node::new("node-1")).await.is_err());
    }

    #[tokio::test]
    async fn test_unimplemented_operations_make_no_calls() {
        let api = Arc::new(MockApi::with_vms(vec![vm("node-1", "zone-a")]));
        let cloud = cloud(&api);

        assert!(matches!(
            cloud.add_ssh_key_to_all_instances("core", b"ssh-ed25519 AAAA").await,
            Err(ProviderError::NotImplemented)
        ));
        assert!(matches!(
            cloud.instance_shutdown_by_provider_id("id-node-1").await,
            Err(ProviderError::NotImplemented)
        ));
        assert!(matches!(
            cloud.instance_shutdown(&Node::new("node-1")).await,
            Err(ProviderError::NotImplemented)
        ));
        assert_eq!(api.calls(), 0);
    }

    #[test]
    fn test_current_node_name_is_passthrough() {
        let api = Arc::new(MockApi::default());
        let name = tokio_test::block_on(cloud(&api).current_node_name("worker-7"));
        assert_eq!(tokio_test::assert_ok!(name), NodeName::from("worker-7"));
        assert_eq!(api.calls(), 0);
    }

    #[tokio::test]
    async fn test_instance_metadata() {
        let mut instance = vm("node-1", "zone-a");
        instance.service_offering_name = "gpu.large".into();
        instance.public_ip = "203.0.113.9".into();
        let api = Arc::new(MockApi::with_vms(vec![instance]));

        let metadata = cloud(&api)
            .instance_metadata(&Node::new("node-1"))
            .await
            .unwrap();

        assert_eq!(metadata.provider_id, PROVIDER_NAME);
        assert_eq!(metadata.instance_type, "gpu.large");
        assert_eq!(metadata.node_addresses.len(), 2);
        assert_eq!(metadata.zone, "zone-a");
        assert_eq!(metadata.region, "zone-a");
        assert_eq!(api.calls(), 3);
    }

    #[tokio::test]
    async fn test_instance_metadata_aborts_on_first_failure() {
        // Type lookup fails first: nothing else is attempted
        let api = Arc::new(MockApi::default());
        let err = cloud(&api)
            .instance_metadata(&Node::new("node-1"))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::InstanceNotFound));
        assert_eq!(api.calls(), 1);

        // Type lookup succeeds, address assembly fails
        let mut instance = vm("node-1", "zone-a");
        instance.nic.clear();
        let api = Arc::new(MockApi::with_vms(vec![instance]));
        let err = cloud(&api)
            .instance_metadata(&Node::new("node-1"))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::NoInternalAddress));
        assert_eq!(api.calls(), 2);

        // Zone lookup is the last step
        let api = Arc::new(MockApi::failing_from(vec![vm("node-1", "zone-a")], 2));
        let err = cloud(&api)
            .instance_metadata(&Node::new("node-1"))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Remote { context: "error retrieving zone", .. }));
        assert_eq!(api.calls(), 3);
    }
}
