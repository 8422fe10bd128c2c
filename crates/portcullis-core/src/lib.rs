//! # Portcullis Core
//!
//! Shared types for the Portcullis authentication pipeline.
//!
//! - [`ClientClaims`] / [`UserClaims`] - introspection results
//! - [`Role`], [`UserStatus`], [`TokenType`] - closed vocabularies
//! - [`UserHeaders`] - the user identity carried on request headers
//! - [`RolePolicy`] - per-route, per-method role requirements
//! - [`AuthError`] - the failure taxonomy and its wire envelope
//! - [`headers`] - header and cookie names shared by all stages

#![doc(html_root_url = "https://docs.rs/portcullis-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod claims;
mod email;
mod error;
pub mod headers;
mod policy;

pub use claims::{
    join_roles, parse_roles, Claims, ClientClaims, ParseEnumError, Role, TokenType, UserClaims,
    UserStatus,
};
pub use email::{EmailAddress, InvalidEmail};
pub use error::{AuthError, AuthResult, ErrorDetail, ErrorEnvelope};
pub use headers::UserHeaders;
pub use policy::{RolePolicy, WILDCARD_METHOD};
