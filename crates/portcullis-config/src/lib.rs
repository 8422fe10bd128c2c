//! Typed configuration for Portcullis.
//!
//! Configuration is layered (defaults → TOML/JSON file → environment) and
//! strict: unknown fields fail the load.
//!
//! - [`IdentityProviderConfig`] - where the introspection endpoints live
//! - [`EndpointsConfig`] - paths that skip client or user authentication
//! - [`StagesConfig`] - which pipeline stages run
//! - [`LoggingConfig`] - log level and format
//! - [`RolePolicy`](portcullis_core::RolePolicy) - route → method → roles
//!
//! # Example
//!
//! ```no_run
//! use portcullis_config::ConfigLoader;
//!
//! # fn main() -> Result<(), portcullis_config::ConfigError> {
//! let config = ConfigLoader::new()
//!     .with_file("portcullis.toml")?
//!     .with_env_prefix("PORTCULLIS")
//!     .load()?;
//!
//! println!("introspecting against realm {}", config.identity_provider.realm);
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration File Format
//!
//! ```toml
//! [identity_provider]
//! base_url = "https://sso.example.com/api/v1"
//! realm = "some-realm"
//! timeout_ms = 5000
//! pool_max_idle_per_host = 32
//!
//! [endpoints]
//! public = ["/home", "/"]
//! client_public = []
//! docs = ["/docs", "/docs/oauth2-redirect", "/redoc", "/openapi.json"]
//!
//! [stages]
//! client_auth = true
//! user_auth = true
//! role_gate = true
//!
//! [logging]
//! level = "info"
//! format = "json"
//!
//! [role_policy."/admin"]
//! "*" = ["admin"]
//!
//! [role_policy."/courses"]
//! get = ["user", "admin"]
//! post = ["admin"]
//! ```
//!
//! # Environment Variable Overrides
//!
//! Values can be overridden with `PREFIX__SECTION__KEY`:
//!
//! - `PORTCULLIS__IDENTITY_PROVIDER__BASE_URL=https://sso.internal/api/v1`
//! - `PORTCULLIS__ENDPOINTS__PUBLIC=/home,/`
//! - `PORTCULLIS__STAGES__ROLE_GATE=false`
//! - `PORTCULLIS__LOGGING__FORMAT=pretty`
//!
//! The role policy is file-only.

#![warn(missing_docs)]

mod config;
mod error;
mod loader;
mod schema;

pub use config::PortcullisConfig;
pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use schema::{EndpointsConfig, IdentityProviderConfig, LoggingConfig, StagesConfig};
