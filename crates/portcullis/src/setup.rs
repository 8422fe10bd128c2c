//! Assembling a pipeline from configuration.

use std::sync::Arc;

use portcullis_config::{ConfigError, PortcullisConfig};
use portcullis_core::AuthError;
use portcullis_introspect::IntrospectionClient;
use portcullis_middleware::{ClientAuthStage, Pipeline, RoleGateStage, UserAuthStage};
use portcullis_telemetry::{init_logging, TelemetryError};
use thiserror::Error;
use tracing::info;

/// Errors raised while turning configuration into a running pipeline.
#[derive(Debug, Error)]
pub enum SetupError {
    /// The configuration failed validation.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The introspection client could not be built.
    #[error("failed to build introspection client: {0}")]
    Client(#[from] AuthError),

    /// The log subscriber could not be installed.
    #[error(transparent)]
    Telemetry(#[from] TelemetryError),
}

/// Builds the pipeline described by `config`.
///
/// Disabled stages are left out. Both identity stages share one
/// introspection client and therefore one connection pool.
///
/// # Errors
///
/// Returns [`SetupError::Config`] if the configuration is invalid and
/// [`SetupError::Client`] if the HTTP client cannot be constructed.
///
/// # Example
///
/// ```
/// use portcullis::from_config;
/// use portcullis_config::PortcullisConfig;
///
/// let mut config = PortcullisConfig::default();
/// config.identity_provider.base_url = "https://sso.example.com/api/v1".to_string();
/// config.identity_provider.realm = "school".to_string();
///
/// let pipeline = from_config(&config).unwrap();
/// assert_eq!(pipeline.stage_names(), vec!["client_auth", "user_auth", "role_gate"]);
/// ```
pub fn from_config(config: &PortcullisConfig) -> Result<Pipeline, SetupError> {
    config.validate()?;

    let stages = &config.stages;
    let endpoints = &config.endpoints;
    let mut builder = Pipeline::builder();

    if stages.needs_identity_provider() {
        let introspection = config.identity_provider.to_introspection_config()?;
        let client = IntrospectionClient::new(&introspection)?;

        if stages.client_auth {
            builder = builder.client_auth(
                ClientAuthStage::new(client.clone())
                    .with_docs_endpoints(&endpoints.docs)
                    .with_public_endpoints(&endpoints.client_public),
            );
        }
        if stages.user_auth {
            builder = builder.user_auth(
                UserAuthStage::new(client)
                    .with_docs_endpoints(&endpoints.docs)
                    .with_public_endpoints(&endpoints.public),
            );
        }
    }

    if stages.role_gate {
        builder = builder.role_gate(RoleGateStage::shared(Arc::new(config.role_policy.clone())));
    }

    let pipeline = builder.build();
    info!(
        realm = %config.identity_provider.realm,
        stages = ?pipeline.stage_names(),
        policy_routes = config.role_policy.len(),
        "auth pipeline ready"
    );
    Ok(pipeline)
}

/// Installs the log subscriber described by `config.logging`.
///
/// # Errors
///
/// Returns [`SetupError::Telemetry`] if the filter is invalid or a
/// subscriber is already installed.
pub fn init_logging_from(config: &PortcullisConfig) -> Result<(), SetupError> {
    init_logging(&config.logging.to_log_config())?;
    Ok(())
}
