//! Client authentication stage.
//!
//! Verifies the calling client (machine principal) by introspecting the
//! `Client-Authorization: Bearer <token>` header and stamps the verified
//! identity onto the request:
//!
//! | Header | Claim |
//! |---|---|
//! | `X-Client-Id` | `sub` |
//! | `X-Client-Scope` | `scope` |
//! | `X-Client-Realm` | `realm` |
//!
//! Stamped headers whose claim is absent are removed, so inbound values of
//! the same name never reach the handler.

use portcullis_core::headers::{
    bearer_token, set_or_remove, CLIENT_AUTHORIZATION, X_CLIENT_ID, X_CLIENT_REALM, X_CLIENT_SCOPE,
};
use portcullis_core::{AuthError, AuthResult};
use portcullis_introspect::IntrospectionClient;
use tracing::debug;

use super::{rejected, PathSet};
use crate::context::MiddlewareContext;
use crate::middleware::{BoxFuture, Middleware, Next};
use crate::pipeline::Stage;
use crate::types::{Request, Response};

/// Detail returned when the client credential is missing or malformed.
pub const INVALID_BEARER_TOKEN: &str = "Invalid Bearer Token";

/// Detail returned for an inactive token without a cause.
pub const TOKEN_NOT_ACTIVE: &str = "Token is not active";

/// Stage that authenticates the calling client.
///
/// # Example
///
/// ```rust,no_run
/// use portcullis_introspect::{IntrospectionClient, IntrospectionConfig};
/// use portcullis_middleware::stages::ClientAuthStage;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = IntrospectionConfig::new("https://sso.example.com/api/v1".parse()?, "acme");
/// let stage = ClientAuthStage::new(IntrospectionClient::new(&config)?)
///     .with_public_endpoints(["/health"]);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ClientAuthStage {
    client: IntrospectionClient,
    docs: PathSet,
    public: PathSet,
}

impl ClientAuthStage {
    /// Creates the stage with the default documentation endpoints.
    pub fn new(client: IntrospectionClient) -> Self {
        Self {
            client,
            docs: PathSet::docs(),
            public: PathSet::default(),
        }
    }

    /// Replaces the documentation endpoints.
    pub fn with_docs_endpoints<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.docs = PathSet::new(paths);
        self
    }

    /// Sets extra paths that need no client credential.
    pub fn with_public_endpoints<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.public = PathSet::new(paths);
        self
    }

    fn is_passthrough(&self, path: &str) -> bool {
        self.docs.contains(path) || self.public.contains(path)
    }

    async fn authenticate(
        &self,
        ctx: &mut MiddlewareContext,
        request: &mut Request,
    ) -> AuthResult<()> {
        let token = request
            .headers()
            .get(CLIENT_AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(bearer_token)
            .map(ToString::to_string)
            .ok_or_else(|| AuthError::bad_request(INVALID_BEARER_TOKEN))?;

        let claims = self.client.introspect_client(&token).await?;

        if !claims.claims.active {
            return Err(AuthError::unauthenticated(
                claims.claims.cause.as_deref().unwrap_or(TOKEN_NOT_ACTIVE),
            ));
        }

        let sub = claims
            .claims
            .sub
            .as_deref()
            .ok_or_else(|| AuthError::introspection("active client token has no subject"))?;

        let headers = request.headers_mut();
        set_or_remove(headers, X_CLIENT_ID, Some(sub))?;
        set_or_remove(headers, X_CLIENT_SCOPE, claims.scope.as_deref())?;
        set_or_remove(headers, X_CLIENT_REALM, claims.realm.as_deref())?;

        debug!(request_id = %ctx.request_id(), client_id = sub, "client authenticated");
        ctx.set_extension(claims);
        Ok(())
    }
}

impl Middleware for ClientAuthStage {
    fn name(&self) -> &'static str {
        Stage::ClientAuth.name()
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut MiddlewareContext,
        mut request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, AuthResult<Response>> {
        Box::pin(async move {
            let path = request.uri().path().to_string();
            if self.is_passthrough(&path) {
                return next.run(ctx, request).await;
            }

            if let Err(e) = self.authenticate(ctx, &mut request).await {
                return Err(rejected(ctx, Stage::ClientAuth, &path, e));
            }
            next.run(ctx, request).await
        })
    }
}
