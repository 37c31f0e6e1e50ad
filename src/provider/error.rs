//! Provider errors

use crate::cloudstack::ApiError;
use crate::config::ConfigError;

/// Errors returned to the orchestrator by provider operations
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// The cloud-config file could not be read or parsed
    #[error("could not parse cloud provider config: {0}")]
    Config(#[from] ConfigError),

    /// Endpoint, API key or secret key is missing
    #[error("no provider configuration given")]
    NoConfig,

    /// Standard signal for a lookup that matched no instance
    #[error("instance not found")]
    InstanceNotFound,

    #[error("{message}: {source}")]
    NotFound {
        message: String,
        #[source]
        source: ApiError,
    },

    #[error("{context}: {source}")]
    Remote {
        context: &'static str,
        #[source]
        source: ApiError,
    },

    #[error("unimplemented")]
    NotImplemented,

    #[error("instance does not have an internal IP")]
    NoInternalAddress,

    #[error("failed to get hostname for retrieving the zone: {0}")]
    Hostname(#[source] std::io::Error),

    #[error("provider registry: {0}")]
    Registry(String),
}

impl ProviderError {
    /// Map a lookup failure: zero matches become [`ProviderError::InstanceNotFound`]
    pub(crate) fn lookup(context: &'static str, source: ApiError) -> Self {
        if source.is_not_found() {
            ProviderError::InstanceNotFound
        } else {
            ProviderError::Remote { context, source }
        }
    }
}
