//! Authentication stages.
//!
//! 1. [`client_auth`] - verify the calling client
//! 2. [`user_auth`] - verify the end user's session and token
//! 3. [`role_gate`] - enforce the route role policy

pub mod client_auth;
pub mod role_gate;
pub mod user_auth;

pub use client_auth::ClientAuthStage;
pub use role_gate::RoleGateStage;
pub use user_auth::UserAuthStage;

use std::collections::HashSet;

use portcullis_core::AuthError;
use tracing::{error, warn};

use crate::context::MiddlewareContext;
use crate::pipeline::Stage;

/// Documentation endpoints every identity stage lets through.
pub const DEFAULT_DOCS_ENDPOINTS: [&str; 4] =
    ["/docs", "/docs/oauth2-redirect", "/redoc", "/openapi.json"];

/// Exact-match set of request paths.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathSet(HashSet<String>);

impl PathSet {
    /// Creates a set from paths.
    pub fn new<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(paths.into_iter().map(Into::into).collect())
    }

    /// The default documentation endpoints.
    #[must_use]
    pub fn docs() -> Self {
        Self::new(DEFAULT_DOCS_ENDPOINTS)
    }

    /// Returns `true` if `path` is in the set. No prefix matching.
    #[must_use]
    pub fn contains(&self, path: &str) -> bool {
        self.0.contains(path)
    }

    /// Number of paths.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Logs a stage rejection and hands the error back.
fn rejected(ctx: &MiddlewareContext, stage: Stage, path: &str, error: AuthError) -> AuthError {
    if error.is_client_error() {
        warn!(
            request_id = %ctx.request_id(),
            stage = stage.name(),
            http.path = path,
            error.code = error.code(),
            detail = error.detail(),
            "request rejected"
        );
    } else {
        error!(
            request_id = %ctx.request_id(),
            stage = stage.name(),
            http.path = path,
            error.code = error.code(),
            error = %error,
            "identity check failed"
        );
    }
    error
}
