//! Cloud provider interface
//!
//! The orchestrator talks to the provider through [`CloudProvider`] and asks it
//! for optional capabilities. [`CsCloud`] is the CloudStack implementation.
//!
//! # Module Structure
//!
//! - [`cloud`] - [`CsCloud`], capability negotiation and zone lookups
//! - [`instances`] - instance addressing, identity, type and existence
//! - [`registry`] - explicit name → factory registry for hosts
//! - [`traits`] - capability traits
//! - [`types`] - orchestrator-facing data shapes
//!
//! # Example
//!
//! ```ignore
//! use cloudstack_provider::provider::{self, ProviderRegistry, PROVIDER_NAME};
//!
//! async fn example(config: &mut dyn std::io::Read) -> anyhow::Result<()> {
//!     let mut registry = ProviderRegistry::new();
//!     provider::register(&mut registry)?;
//!
//!     let cloud = registry.get_cloud_provider(PROVIDER_NAME, Some(config))?.unwrap();
//!     if let Some(zones) = cloud.zones() {
//!         println!("{:?}", zones.get_zone().await?);
//!     }
//!     Ok(())
//! }
//! ```

pub mod cloud;
pub mod error;
pub mod instances;
pub mod registry;
pub mod traits;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use cloud::CsCloud;
pub use error::ProviderError;
pub use registry::{register, ProviderFactory, ProviderRegistry};
pub use traits::{CloudProvider, Instances, InstancesV2, Zones};
pub use types::{Capability, InstanceMetadata, Node, NodeAddress, NodeAddressType, NodeName, Zone};

/// Name under which the provider registers itself
pub const PROVIDER_NAME: &str = "external-cloudstack";
