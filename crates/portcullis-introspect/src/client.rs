//! HTTP client for the identity provider's introspection endpoints.

use std::time::{Duration, Instant};

use http::header::{CONTENT_TYPE, COOKIE};
use http::StatusCode;
use portcullis_core::{AuthError, AuthResult, ClientClaims, UserClaims};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};
use url::Url;

use crate::config::IntrospectionConfig;

/// Detail used when a 400/401 body carries none.
pub const UNKNOWN_ERROR_DETAIL: &str = "Unknown error";

#[derive(Serialize)]
struct IntrospectRequest<'a> {
    token: &'a str,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    detail: Option<serde_json::Value>,
}

/// Client for token introspection.
///
/// Holds one pooled [`reqwest::Client`]; clone it freely, clones share the
/// pool.
///
/// Calls are not retried and results are not cached. Dropping the returned
/// future aborts the outbound request.
#[derive(Debug, Clone)]
pub struct IntrospectionClient {
    client: Client,
    client_url: Url,
    user_url: Url,
    realm: String,
    timeout: Duration,
}

impl IntrospectionClient {
    /// Creates a client from settings.
    pub fn new(config: &IntrospectionConfig) -> AuthResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .build()
            .map_err(|e| AuthError::introspection(format!("failed to create client: {e}")))?;

        Ok(Self {
            client,
            client_url: endpoint(&config.base_url, &config.realm, &["oauth", "introspect"])?,
            user_url: endpoint(&config.base_url, &config.realm, &["auth", "introspect"])?,
            realm: config.realm.clone(),
            timeout: config.timeout,
        })
    }

    /// Introspects a client (machine) token.
    ///
    /// Returns the claims as reported; `active` is not checked here.
    #[instrument(skip(self, token), fields(realm = %self.realm))]
    pub async fn introspect_client(&self, token: &str) -> AuthResult<ClientClaims> {
        self.introspect(&self.client_url, token, None).await
    }

    /// Introspects a user token, forwarding the caller's `Cookie` header.
    ///
    /// Returns the claims as reported; `active` is not checked here.
    #[instrument(skip(self, token, cookies), fields(realm = %self.realm))]
    pub async fn introspect_user(
        &self,
        token: &str,
        cookies: Option<&str>,
    ) -> AuthResult<UserClaims> {
        self.introspect(&self.user_url, token, cookies).await
    }

    /// Client introspection endpoint.
    pub fn client_url(&self) -> &Url {
        &self.client_url
    }

    /// User introspection endpoint.
    pub fn user_url(&self) -> &Url {
        &self.user_url
    }

    /// Configured timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn introspect<T: DeserializeOwned>(
        &self,
        url: &Url,
        token: &str,
        cookies: Option<&str>,
    ) -> AuthResult<T> {
        let started = Instant::now();

        let mut request = self
            .client
            .post(url.clone())
            .header(CONTENT_TYPE, "application/json")
            .json(&IntrospectRequest { token });
        if let Some(cookies) = cookies {
            request = request.header(COOKIE, cookies);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                AuthError::introspection(format!("introspection timed out after {:?}", self.timeout))
            } else {
                AuthError::introspection(format!("introspection request failed: {e}"))
            }
        })?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| AuthError::introspection(format!("failed to read body: {e}")))?;

        debug!(
            http.status_code = status.as_u16(),
            duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            "introspection completed"
        );

        match status {
            StatusCode::BAD_REQUEST => Err(AuthError::malformed_token_request(error_detail(&body))),
            StatusCode::UNAUTHORIZED => Err(AuthError::unauthenticated(error_detail(&body))),
            status if status.is_success() => serde_json::from_slice(&body).map_err(|e| {
                warn!(error = %e, "introspection response failed validation");
                AuthError::introspection(format!("invalid introspection response: {e}"))
            }),
            status => Err(AuthError::introspection(format!(
                "unexpected introspection status {status}"
            ))),
        }
    }
}

/// Appends `realm` and `tail` as path segments of `base`.
fn endpoint(base: &Url, realm: &str, tail: &[&str]) -> AuthResult<Url> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|()| AuthError::introspection(format!("base URL {base} cannot carry a path")))?
        .pop_if_empty()
        .push(realm)
        .extend(tail);
    Ok(url)
}

fn error_detail(body: &[u8]) -> String {
    match serde_json::from_slice::<ErrorBody>(body).ok().and_then(|b| b.detail) {
        Some(serde_json::Value::String(detail)) => detail,
        Some(serde_json::Value::Null) | None => UNKNOWN_ERROR_DETAIL.to_string(),
        Some(other) => other.to_string(),
    }
}
