//! CloudStack cloud provider
//!
//! [`CsCloud`] answers capability queries and zone lookups. Instance queries
//! live in [`super::instances`].

use super::error::ProviderError;
use super::traits::{CloudProvider, Instances, InstancesV2, Result, Zones};
use super::types::{Capability, NodeName, Zone};
use super::PROVIDER_NAME;
use crate::cloudstack::{CloudStackClient, VirtualMachineApi};
use crate::config::Settings;
use async_trait::async_trait;
use std::io;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Source of the local host name, replaceable for tests
pub type HostnameSource = fn() -> io::Result<String>;

/// Name of the host the provider runs on
pub fn local_hostname() -> io::Result<String> {
    hostname::get()?.into_string().map_err(|_| {
        io::Error::new(io::ErrorKind::InvalidData, "hostname is not valid UTF-8")
    })
}

/// CloudStack implementation of the cloud provider interfaces
pub struct CsCloud {
    client: Option<Arc<dyn VirtualMachineApi>>,
    /// If set, all lookups are scoped to this project
    project_id: Option<String>,
    /// Configured zone, or the zone resolved from the local host. Never
    /// invalidated once set.
    zone: RwLock<String>,
    hostname: HostnameSource,
}

impl CsCloud {
    /// Build a provider from settings.
    ///
    /// Fails with [`ProviderError::NoConfig`] unless endpoint, API key and
    /// secret key are all set.
    pub fn new(settings: &Settings) -> Result<Self> {
        if !settings.has_credentials() {
            return Err(ProviderError::NoConfig);
        }

        let client = CloudStackClient::new(
            &settings.api_url,
            &settings.api_key,
            &settings.secret_key,
            !settings.ssl_no_verify,
        )
        .map_err(|source| ProviderError::Remote {
            context: "could not create CloudStack client",
            source,
        })?;

        tracing::info!(
            "CloudStack provider configured for {} (project: {:?}, zone: {:?})",
            client.endpoint(),
            settings.project_id,
            settings.zone
        );

        Ok(Self::with_client(
            Arc::new(client),
            settings.project_id.clone(),
            settings.zone.clone(),
        ))
    }

    /// Build a provider around any [`VirtualMachineApi`] implementation
    pub fn with_client(
        client: Arc<dyn VirtualMachineApi>,
        project_id: Option<String>,
        zone: Option<String>,
    ) -> Self {
        Self {
            client: Some(client),
            project_id,
            zone: RwLock::new(zone.unwrap_or_default()),
            hostname: local_hostname,
        }
    }

    /// Build a provider without a client; every capability is unsupported
    pub fn disabled(settings: &Settings) -> Self {
        Self {
            client: None,
            project_id: settings.project_id.clone(),
            zone: RwLock::new(settings.zone.clone().unwrap_or_default()),
            hostname: local_hostname,
        }
    }

    /// Replace the local host name lookup used by [`Zones::get_zone`]
    pub fn with_hostname_source(mut self, source: HostnameSource) -> Self {
        self.hostname = source;
        self
    }

    pub fn project_id(&self) -> Option<&str> {
        self.project_id.as_deref()
    }

    pub(crate) fn client(&self) -> Result<&dyn VirtualMachineApi> {
        self.client.as_deref().ok_or(ProviderError::NoConfig)
    }
}

impl CloudProvider for CsCloud {
    fn provider_name(&self) -> &str {
        PROVIDER_NAME
    }

    fn has_cluster_id(&self) -> bool {
        true
    }

    fn supports(&self, capability: Capability) -> bool {
        if self.client.is_none() {
            return false;
        }

        match capability {
            Capability::LoadBalancer
            | Capability::Instances
            | Capability::InstancesV2
            | Capability::Zones => true,
            Capability::Clusters | Capability::Routes => {
                tracing::warn!("This cloud provider doesn't support {}", capability);
                false
            }
        }
    }

    fn instances(&self) -> Option<&dyn Instances> {
        if self.supports(Capability::Instances) {
            Some(self)
        } else {
            None
        }
    }

    fn instances_v2(&self) -> Option<&dyn InstancesV2> {
        if self.supports(Capability::InstancesV2) {
            Some(self)
        } else {
            None
        }
    }

    fn zones(&self) -> Option<&dyn Zones> {
        if self.supports(Capability::Zones) {
            Some(self)
        } else {
            None
        }
    }
}

#[async_trait]
impl Zones for CsCloud {
    async fn get_zone(&self) -> Result<Zone> {
        {
            let zone = self.zone.read().await;
            if !zone.is_empty() {
                tracing::debug!("Current zone is {}", zone);
                return Ok(Zone::from_name(&zone));
            }
        }

        let hostname = (self.hostname)().map_err(ProviderError::Hostname)?;
        let instance = self
            .client()?
            .virtual_machine_by_name(&hostname, None)
            .await
            .map_err(|source| {
                if source.is_not_found() {
                    ProviderError::NotFound {
                        message: "could not find instance for retrieving the zone".to_string(),
                        source,
                    }
                } else {
                    ProviderError::Remote {
                        context: "error getting instance for retrieving the zone",
                        source,
                    }
                }
            })?;

        let mut zone = self.zone.write().await;
        if zone.is_empty() {
            *zone = instance.zone_name;
        }

        tracing::debug!("Current zone is {}", zone);
        Ok(Zone::from_name(&zone))
    }

    async fn get_zone_by_provider_id(&self, provider_id: &str) -> Result<Zone> {
        let instance = self
            .client()?
            .virtual_machine_by_id(provider_id, self.project_id())
            .await
            .map_err(|source| {
                zone_lookup_error(format!("could not find node by ID: {}", provider_id), source)
            })?;

        tracing::debug!("Zone of {} is {}", provider_id, instance.zone_name);
        Ok(Zone::from_name(&instance.zone_name))
    }

    async fn get_zone_by_node_name(&self, name: &NodeName) -> Result<Zone> {
        let instance = self
            .client()?
            .virtual_machine_by_name(name.as_str(), self.project_id())
            .await
            .map_err(|source| zone_lookup_error(format!("could not find node: {}", name), source))?;

        tracing::debug!("Zone of {} is {}", name, instance.zone_name);
        Ok(Zone::from_name(&instance.zone_name))
    }
}

fn zone_lookup_error(message: String, source: crate::cloudstack::ApiError) -> ProviderError {
    if source.is_not_found() {
        ProviderError::NotFound { message, source }
    } else {
        ProviderError::Remote {
            context: "error retrieving zone",
            source,
        }
    }
}
