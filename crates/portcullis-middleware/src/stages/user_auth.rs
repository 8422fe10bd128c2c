//! User authentication stage.
//!
//! Requires a `session_id` cookie and an `Authorization: Bearer <token>`
//! header, introspects the token (forwarding the caller's cookies), and
//! stamps the verified user onto the request:
//!
//! | Header | Claim |
//! |---|---|
//! | `X-User-Id` | `sub` (UUID) |
//! | `X-User-Roles` | `roles`, space-joined |
//! | `X-User-Realm` | `realm` (removed if absent) |
//! | `X-User-Status` | `status` |
//! | `X-User-Email` | `email` |
//!
//! An inactive token is rejected before its type is checked.

use http::header::{AUTHORIZATION, COOKIE};
use http::HeaderMap;
use portcullis_core::headers::{bearer_token, set_or_remove, SESSION_COOKIE, X_USER_REALM};
use portcullis_core::{AuthError, AuthResult, UserHeaders};
use portcullis_introspect::IntrospectionClient;
use tracing::debug;

use super::client_auth::TOKEN_NOT_ACTIVE;
use super::{rejected, PathSet};
use crate::context::MiddlewareContext;
use crate::middleware::{BoxFuture, Middleware, Next};
use crate::pipeline::Stage;
use crate::types::{Request, Response};

/// Detail returned when the session cookie is absent.
pub const SESSION_MISSING: &str = "Session is missing";

/// Detail returned when the user credential is missing or malformed.
pub const INVALID_AUTHORIZATION_HEADER: &str = "Invalid authorization header";

/// Detail returned for a non-access token.
pub const INVALID_TOKEN_TYPE: &str = "Invalid token type";

/// Stage that authenticates the end user.
#[derive(Debug, Clone)]
pub struct UserAuthStage {
    client: IntrospectionClient,
    docs: PathSet,
    public: PathSet,
}

impl UserAuthStage {
    /// Creates the stage with the default documentation endpoints and no
    /// public endpoints.
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

    /// Sets paths that need no user session.
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
        let cookies = cookie_header(request.headers());
        if !cookies
            .as_deref()
            .is_some_and(|raw| has_cookie(raw, SESSION_COOKIE))
        {
            return Err(AuthError::unauthenticated(SESSION_MISSING));
        }

        let token = request
            .headers()
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(bearer_token)
            .map(ToString::to_string)
            .ok_or_else(|| AuthError::unauthenticated(INVALID_AUTHORIZATION_HEADER))?;

        let claims = self
            .client
            .introspect_user(&token, cookies.as_deref())
            .await?;

        if !claims.claims.active {
            return Err(AuthError::unauthenticated(
                claims.claims.cause.as_deref().unwrap_or(TOKEN_NOT_ACTIVE),
            ));
        }
        if !claims.claims.is_access_token() {
            return Err(AuthError::malformed_token_request(INVALID_TOKEN_TYPE));
        }

        let identity = UserHeaders::from_claims(&claims)?;
        let headers = request.headers_mut();
        identity.write_to(headers)?;
        set_or_remove(headers, X_USER_REALM, claims.realm.as_deref())?;

        debug!(request_id = %ctx.request_id(), user_id = %identity.user_id, "user authenticated");
        ctx.set_extension(identity);
        ctx.set_extension(claims);
        Ok(())
    }
}

impl Middleware for UserAuthStage {
    fn name(&self) -> &'static str {
        Stage::UserAuth.name()
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
                return Err(rejected(ctx, Stage::UserAuth, &path, e));
            }
            next.run(ctx, request).await
        })
    }
}

/// Joins every `Cookie` header into one value, as forwarded upstream.
fn cookie_header(headers: &HeaderMap) -> Option<String> {
    let parts: Vec<&str> = headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("; "))
    }
}

/// Returns `true` if `raw` holds a cookie `name` with a non-empty value.
fn has_cookie(raw: &str, name: &str) -> bool {
    raw.split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .any(|(key, value)| key.trim() == name && !value.trim().trim_matches('"').is_empty())
}
