//! Provider Registry
//!
//! Hosts register provider factories explicitly at startup and look them up
//! by name when the cloud-config is known.

use super::cloud::CsCloud;
use super::error::ProviderError;
use super::traits::{CloudProvider, Result};
use super::PROVIDER_NAME;
use crate::config::Settings;
use std::collections::HashMap;
use std::io::Read;

/// Builds a provider from an optional cloud-config stream
pub type ProviderFactory = fn(Option<&mut dyn Read>) -> Result<Box<dyn CloudProvider>>;

#[derive(Default)]
pub struct ProviderRegistry {
    factories: HashMap<String, ProviderFactory>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory under `name`. Names can only be registered once.
    pub fn register(&mut self, name: &str, factory: ProviderFactory) -> Result<()> {
        if self.factories.contains_key(name) {
            return Err(ProviderError::Registry(format!(
                "cloud provider {} was registered twice",
                name
            )));
        }

        tracing::info!("Registered cloud provider {}", name);
        self.factories.insert(name.to_string(), factory);
        Ok(())
    }

    /// Build the provider registered as `name`, or `None` if there is none
    pub fn get_cloud_provider(
        &self,
        name: &str,
        config: Option<&mut dyn Read>,
    ) -> Result<Option<Box<dyn CloudProvider>>> {
        let Some(factory) = self.factories.get(name) else {
            tracing::warn!("Unknown cloud provider {}", name);
            return Ok(None);
        };

        factory(config).map(Some)
    }

    /// Registered provider names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

/// Register the CloudStack provider under [`PROVIDER_NAME`]
pub fn register(registry: &mut ProviderRegistry) -> Result<()> {
    registry.register(PROVIDER_NAME, |config| {
        let settings = Settings::from_reader(config)?;
        let provider: Box<dyn CloudProvider> = Box::new(CsCloud::new(&settings)?);
        Ok(provider)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_register_and_build() {
        let mut registry = ProviderRegistry::new();
        register(&mut registry).unwrap();
        assert_eq!(registry.names(), vec![PROVIDER_NAME]);

        let mut config = Cursor::new(concat!(
            "[global]\n",
            "api-url = https://cloud.example.com/client/api\n",
            "api-key = k\nsecret-key = s\n",
        ));
        let provider = registry
            .get_cloud_provider(PROVIDER_NAME, Some(&mut config as &mut dyn Read))
            .unwrap()
            .expect("provider should be registered");
        assert_eq!(provider.provider_name(), PROVIDER_NAME);
        assert!(provider.zones().is_some());
    }

    #[test]
    fn test_duplicate_registration_is_rejected() {
        let mut registry = ProviderRegistry::new();
        register(&mut registry).unwrap();
        assert!(matches!(
            register(&mut registry),
            Err(ProviderError::Registry(_))
        ));
    }

    #[test]
    fn test_unknown_provider() {
        let registry = ProviderRegistry::new();
        assert!(registry.get_cloud_provider("aws", None).unwrap().is_none());
    }

    #[test]
    fn test_absent_config_fails_construction() {
        let mut registry = ProviderRegistry::new();
        register(&mut registry).unwrap();
        assert!(matches!(
            registry.get_cloud_provider(PROVIDER_NAME, None),
            Err(ProviderError::NoConfig)
        ));
    }

    #[test]
    fn test_malformed_config_is_a_config_error() {
        let mut registry = ProviderRegistry::new();
        register(&mut registry).unwrap();

        let mut config = Cursor::new("[global]\nendpoint = x\n");
        let err = registry
            .get_cloud_provider(PROVIDER_NAME, Some(&mut config as &mut dyn Read))
            .err()
            .expect("config should be rejected");
        assert!(matches!(err, ProviderError::Config(_)));
        assert_eq!(
            err.to_string(),
            "could not parse cloud provider config: line 2: invalid variable: endpoint"
        );
    }
}
