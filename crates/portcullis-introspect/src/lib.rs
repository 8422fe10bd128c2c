//! # Portcullis Introspect
//!
//! Token introspection against the identity provider.
//!
//! | Call | Endpoint |
//! |---|---|
//! | [`IntrospectionClient::introspect_client`] | `POST {base_url}/{realm}/oauth/introspect` |
//! | [`IntrospectionClient::introspect_user`] | `POST {base_url}/{realm}/auth/introspect` |
//!
//! Both send `{"token": "<token>"}`. Status mapping:
//!
//! - 2xx: body deserialized into claims, schema failures are protocol errors
//! - 400: [`AuthError::MalformedTokenRequest`] with the body's `detail`
//! - 401: [`AuthError::Unauthenticated`] with the body's `detail`
//! - anything else, transport failures, timeouts: [`AuthError::IntrospectionProtocol`]
//!
//! [`AuthError::MalformedTokenRequest`]: portcullis_core::AuthError::MalformedTokenRequest
//! [`AuthError::Unauthenticated`]: portcullis_core::AuthError::Unauthenticated
//! [`AuthError::IntrospectionProtocol`]: portcullis_core::AuthError::IntrospectionProtocol
//!
//! ## Example
//!
//! ```rust,no_run
//! use portcullis_introspect::{IntrospectionClient, IntrospectionConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = IntrospectionConfig::new("https://sso.example.com/api/v1".parse()?, "acme");
//! let client = IntrospectionClient::new(&config)?;
//!
//! let claims = client.introspect_client("opaque-token").await?;
//! println!("active: {}", claims.claims.active);
//! # Ok(())
//! # }
//! ```

#![doc(html_root_url = "https://docs.rs/portcullis-introspect/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod client;
mod config;

pub use client::{IntrospectionClient, UNKNOWN_ERROR_DETAIL};
pub use config::{IntrospectionConfig, DEFAULT_POOL_MAX_IDLE_PER_HOST, DEFAULT_TIMEOUT};
