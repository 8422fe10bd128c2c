//! # Portcullis
//!
//! **Client and user authentication for HTTP services backed by token
//! introspection.**
//!
//! Portcullis sits in front of request handlers and admits a request only
//! when:
//!
//! - the calling client presents an active `Client-Authorization` bearer token
//! - the end user presents a `session_id` cookie and an active access token
//! - the user's roles satisfy the route's role policy
//!
//! Verified identities are stamped onto the request as `X-Client-*` and
//! `X-User-*` headers so handlers never talk to the identity provider.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use portcullis::prelude::*;
//!
//! let config = ConfigLoader::new()
//!     .with_file("portcullis.toml")?
//!     .with_env_prefix("PORTCULLIS")
//!     .load()?;
//! portcullis::init_logging_from(&config)?;
//! let pipeline = portcullis::from_config(&config)?;
//!
//! let response = pipeline
//!     .respond(MiddlewareContext::new(), request, |_ctx, request| {
//!         Box::pin(async move {
//!             let user = require_roles(&request, &[Role::Admin])?;
//!             Ok(http::Response::new(Full::new(Bytes::from(user.user_id.to_string()))))
//!         })
//!     })
//!     .await;
//! ```
//!
//! ## Architecture
//!
//! ```text
//! Request → ClientAuth → UserAuth → RoleGate → Handler
//!              │            │
//!              └─────┬──────┘
//!                    ▼
//!        identity provider /{realm}/oauth/introspect
//!                          /{realm}/auth/introspect
//! ```

#![doc(html_root_url = "https://docs.rs/portcullis/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod setup;

pub use setup::{from_config, init_logging_from, SetupError};

// Re-export core types
pub use portcullis_core as core;

// Re-export introspection client
pub use portcullis_introspect as introspect;

// Re-export pipeline and stages
pub use portcullis_middleware as middleware;

// Re-export configuration
pub use portcullis_config as config;

// Re-export logging setup
pub use portcullis_telemetry as telemetry;

/// Prelude module for convenient imports.
///
/// # Example
///
/// ```rust,ignore
/// use portcullis::prelude::*;
/// ```
pub mod prelude {
    pub use portcullis_core::{
        AuthError, AuthResult, ClientClaims, Role, RolePolicy, UserClaims, UserHeaders,
        UserStatus,
    };

    pub use portcullis_introspect::{IntrospectionClient, IntrospectionConfig};

    pub use portcullis_middleware::{
        context_user, current_user, require_roles, require_status, ClientAuthStage, Middleware,
        MiddlewareContext, Next, Pipeline, Request, Response, ResponseExt, RoleGateStage,
        UserAuthStage,
    };

    pub use portcullis_config::{ConfigError, ConfigLoader, PortcullisConfig};

    pub use portcullis_telemetry::{init_logging, LogConfig};

    pub use crate::{from_config, SetupError};
}
