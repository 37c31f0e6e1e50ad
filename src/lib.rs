//! CloudStack cloud provider
//!
//! Answers a container orchestrator's node addressing, instance identity and
//! zone queries by looking instances up through the CloudStack API.
//!
//! - [`config`] - cloud-config file parsing
//! - [`cloudstack`] - signed CloudStack API client
//! - [`provider`] - the orchestrator-facing provider and its registry

pub mod cloudstack;
pub mod config;
pub mod provider;

pub use config::Settings;
pub use provider::{CloudProvider, CsCloud, ProviderError, ProviderRegistry, PROVIDER_NAME};
