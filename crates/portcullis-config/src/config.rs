//! Main configuration type.
//!
//! This module provides the top-level [`PortcullisConfig`] struct, its
//! presets, and cross-section validation.

use portcullis_core::{RolePolicy, Role, WILDCARD_METHOD};
use portcullis_telemetry::LogFormat;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{ConfigError, EndpointsConfig, IdentityProviderConfig, LoggingConfig, StagesConfig};

/// Lowercase method keys accepted in a role policy besides `*`.
const POLICY_METHODS: [&str; 9] = [
    "get", "head", "post", "put", "delete", "connect", "options", "trace", "patch",
];

/// Complete Portcullis configuration.
///
/// Use [`ConfigLoader`](crate::ConfigLoader) to load it from files and
/// environment variables.
///
/// # Example
///
/// ```
/// use portcullis_config::PortcullisConfig;
///
/// let config = PortcullisConfig::default();
/// assert!(config.stages.client_auth);
/// assert_eq!(config.identity_provider.timeout_ms, 5000);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct PortcullisConfig {
    /// Identity provider connection.
    #[serde(default)]
    pub identity_provider: IdentityProviderConfig,

    /// Endpoints exempt from authentication.
    #[serde(default)]
    pub endpoints: EndpointsConfig,

    /// Enabled stages.
    #[serde(default)]
    pub stages: StagesConfig,

    /// Logging.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Route → method → roles.
    #[serde(default)]
    pub role_policy: RolePolicy,
}

impl PortcullisConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - an introspecting stage is enabled and the base URL is missing, not a
    ///   URL, or not http(s), or the realm is empty
    /// - the timeout or pool size is zero
    /// - an endpoint or policy path is empty or lacks a leading `/`
    /// - a policy method key is neither `*` nor an HTTP method
    /// - the role gate is enabled without user authentication
    ///
    /// Policy roles outside the stamped role set are allowed and only logged.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let idp = &self.identity_provider;
        if self.stages.needs_identity_provider() {
            idp.parsed_base_url()?;
            if idp.realm.trim().is_empty() {
                return Err(ConfigError::invalid_value(
                    "identity_provider.realm",
                    "must not be empty",
                ));
            }
        }
        if idp.timeout_ms == 0 {
            return Err(ConfigError::invalid_value(
                "identity_provider.timeout_ms",
                "must be greater than zero",
            ));
        }
        if idp.pool_max_idle_per_host == 0 {
            return Err(ConfigError::invalid_value(
                "identity_provider.pool_max_idle_per_host",
                "must be greater than zero",
            ));
        }

        validate_paths("endpoints.public", &self.endpoints.public)?;
        validate_paths("endpoints.client_public", &self.endpoints.client_public)?;
        validate_paths("endpoints.docs", &self.endpoints.docs)?;

        for (path, rules) in self.role_policy.iter() {
            check_path("role_policy", path)?;
            for (method, roles) in rules {
                if method != WILDCARD_METHOD && !POLICY_METHODS.contains(&method.as_str()) {
                    return Err(ConfigError::invalid_value(
                        format!("role_policy.\"{path}\""),
                        format!("'{method}' is not an HTTP method or '{WILDCARD_METHOD}'"),
                    ));
                }
                for role in roles.iter().filter(|r| r.parse::<Role>().is_err()) {
                    warn!(
                        path,
                        method = %method,
                        role = %role,
                        "policy role is never stamped on a user and will not match"
                    );
                }
            }
        }

        if self.stages.role_gate && !self.stages.user_auth {
            return Err(ConfigError::validation_error(
                "stages.role_gate requires stages.user_auth",
            ));
        }

        Ok(())
    }

    /// Development preset: pretty `debug` logs with source locations.
    ///
    /// # Example
    ///
    /// ```
    /// use portcullis_config::PortcullisConfig;
    ///
    /// let config = PortcullisConfig::development();
    /// assert_eq!(config.logging.level, "debug");
    /// ```
    #[must_use]
    pub fn development() -> Self {
        let mut config = Self::default();
        config.logging.level = "debug".to_string();
        config.logging.format = LogFormat::Pretty;
        config.logging.include_location = true;
        config
    }

    /// Production preset: JSON `info` logs.
    ///
    /// # Example
    ///
    /// ```
    /// use portcullis_config::PortcullisConfig;
    /// use portcullis_telemetry::LogFormat;
    ///
    /// let config = PortcullisConfig::production();
    /// assert_eq!(config.logging.format, LogFormat::Json);
    /// ```
    #[must_use]
    pub fn production() -> Self {
        let mut config = Self::default();
        config.logging.level = "info".to_string();
        config.logging.format = LogFormat::Json;
        config.logging.include_location = false;
        config
    }
}

fn validate_paths(field: &str, paths: &[String]) -> Result<(), ConfigError> {
    paths.iter().try_for_each(|path| check_path(field, path))
}

fn check_path(field: &str, path: &str) -> Result<(), ConfigError> {
    if path.starts_with('/') {
        Ok(())
    } else {
        Err(ConfigError::invalid_value(
            field,
            format!("path '{path}' must start with '/'"),
        ))
    }
}
