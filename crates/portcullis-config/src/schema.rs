//! Configuration schema types.
//!
//! One struct per section of the configuration file.

use std::time::Duration;

use portcullis_introspect::IntrospectionConfig;
use portcullis_middleware::DEFAULT_DOCS_ENDPOINTS;
use portcullis_telemetry::{LogConfig, LogFormat};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::ConfigError;

/// Identity provider section.
///
/// `base_url` and `realm` are required whenever a stage that calls the
/// introspection endpoints is enabled.
///
/// # Example
///
/// ```
/// use portcullis_config::IdentityProviderConfig;
///
/// let idp = IdentityProviderConfig {
///     base_url: "https://sso.example.com/api/v1".to_string(),
///     realm: "school".to_string(),
///     ..Default::default()
/// };
/// let introspection = idp.to_introspection_config().unwrap();
/// assert_eq!(introspection.realm, "school");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct IdentityProviderConfig {
    /// Base URL the realm path is appended to.
    #[serde(default)]
    pub base_url: String,

    /// Realm identifier.
    #[serde(default)]
    pub realm: String,

    /// Introspection request timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Idle connections kept per identity-provider host.
    #[serde(default = "default_pool_max_idle_per_host")]
    pub pool_max_idle_per_host: usize,
}

impl Default for IdentityProviderConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            realm: String::new(),
            timeout_ms: default_timeout_ms(),
            pool_max_idle_per_host: default_pool_max_idle_per_host(),
        }
    }
}

impl IdentityProviderConfig {
    /// Parses `base_url`, requiring an http or https scheme.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingField` when empty and
    /// `ConfigError::InvalidValue` when unparseable or not http(s).
    pub fn parsed_base_url(&self) -> Result<Url, ConfigError> {
        if self.base_url.trim().is_empty() {
            return Err(ConfigError::missing_field("identity_provider.base_url"));
        }
        let url = Url::parse(&self.base_url).map_err(|e| {
            ConfigError::invalid_value("identity_provider.base_url", e.to_string())
        })?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(ConfigError::invalid_value(
                "identity_provider.base_url",
                format!("scheme must be http or https, got '{other}'"),
            )),
        }
    }

    /// The request timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Builds the introspection client settings.
    ///
    /// # Errors
    ///
    /// Returns the same errors as [`parsed_base_url`](Self::parsed_base_url).
    pub fn to_introspection_config(&self) -> Result<IntrospectionConfig, ConfigError> {
        Ok(IntrospectionConfig::new(self.parsed_base_url()?, self.realm.clone())
            .with_timeout(self.timeout())
            .with_pool_max_idle_per_host(self.pool_max_idle_per_host))
    }
}

fn default_timeout_ms() -> u64 {
    5000
}

fn default_pool_max_idle_per_host() -> usize {
    32
}

/// Endpoint lists that bypass authentication.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct EndpointsConfig {
    /// Paths that skip user authentication.
    #[serde(default)]
    pub public: Vec<String>,

    /// Paths that skip client authentication.
    #[serde(default)]
    pub client_public: Vec<String>,

    /// Documentation paths; skip both client and user authentication.
    #[serde(default = "default_docs")]
    pub docs: Vec<String>,
}

impl Default for EndpointsConfig {
    fn default() -> Self {
        Self {
            public: Vec::new(),
            client_public: Vec::new(),
            docs: default_docs(),
        }
    }
}

fn default_docs() -> Vec<String> {
    DEFAULT_DOCS_ENDPOINTS
        .iter()
        .map(ToString::to_string)
        .collect()
}

/// Which pipeline stages run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct StagesConfig {
    /// Client authentication.
    #[serde(default = "default_true")]
    pub client_auth: bool,

    /// User authentication.
    #[serde(default = "default_true")]
    pub user_auth: bool,

    /// Role policy enforcement. Requires `user_auth`.
    #[serde(default = "default_true")]
    pub role_gate: bool,
}

impl Default for StagesConfig {
    fn default() -> Self {
        Self {
            client_auth: true,
            user_auth: true,
            role_gate: true,
        }
    }
}

impl StagesConfig {
    /// Whether any enabled stage calls the identity provider.
    #[must_use]
    pub fn needs_identity_provider(&self) -> bool {
        self.client_auth || self.user_auth
    }
}

fn default_true() -> bool {
    true
}

/// Logging section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Enable logging.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Filter directive (trace, debug, info, warn, error, or per-target).
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format.
    #[serde(default)]
    pub format: LogFormat,

    /// Include source file and line in logs.
    #[serde(default)]
    pub include_location: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: default_log_level(),
            format: LogFormat::default(),
            include_location: false,
        }
    }
}

impl LoggingConfig {
    /// Converts to the subscriber settings.
    #[must_use]
    pub fn to_log_config(&self) -> LogConfig {
        let base = match self.format {
            LogFormat::Json => LogConfig::production(),
            LogFormat::Pretty => LogConfig::development(),
        };
        LogConfig {
            enabled: self.enabled,
            file_line_info: self.include_location,
            ..base.with_level(self.level.clone())
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_provider_defaults() {
        let idp = IdentityProviderConfig::default();
        assert_eq!(idp.timeout(), Duration::from_secs(5));
        assert_eq!(idp.pool_max_idle_per_host, 32);
        assert!(matches!(
            idp.parsed_base_url(),
            Err(ConfigError::MissingField { .. })
        ));
    }

    #[test]
    fn test_base_url_scheme() {
        let mut idp = IdentityProviderConfig {
            base_url: "ftp://sso.example.com".to_string(),
            realm: "r".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            idp.parsed_base_url(),
            Err(ConfigError::InvalidValue { .. })
        ));

        idp.base_url = "not a url".to_string();
        assert!(idp.parsed_base_url().is_err());

        idp.base_url = "http://localhost:8000/api".to_string();
        let config = idp.to_introspection_config().unwrap();
        assert_eq!(config.base_url.as_str(), "http://localhost:8000/api");
        assert_eq!(config.timeout, Duration::from_millis(5000));
    }

    #[test]
    fn test_docs_default() {
        let endpoints = EndpointsConfig::default();
        assert_eq!(endpoints.docs.len(), 4);
        assert!(endpoints.docs.contains(&"/openapi.json".to_string()));
        assert!(endpoints.public.is_empty());
    }

    #[test]
    fn test_stages() {
        let stages = StagesConfig::default();
        assert!(stages.needs_identity_provider());
        let none = StagesConfig {
            client_auth: false,
            user_auth: false,
            role_gate: false,
        };
        assert!(!none.needs_identity_provider());
    }

    #[test]
    fn test_logging_to_log_config() {
        let logging = LoggingConfig {
            level: "warn".to_string(),
            format: LogFormat::Pretty,
            include_location: false,
            enabled: true,
        };
        let log = logging.to_log_config();
        assert!(!log.json_format);
        assert!(!log.file_line_info);
        assert_eq!(log.level, "warn");
    }
}
