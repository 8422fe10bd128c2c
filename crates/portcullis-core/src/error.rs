//! Error types for Portcullis.
//!
//! This module provides the [`AuthError`] type, the single failure taxonomy
//! shared by the introspection client, the pipeline stages and the claims
//! accessor.
//!
//! Every variant terminates the request. The host decides how to put it on
//! the wire; [`AuthError::to_envelope`] produces the standard JSON envelope.
//!
//! | Variant | Status | Code |
//! |---|---|---|
//! | `BadRequest` | 400 | `BAD_REQUEST` |
//! | `Unauthenticated` | 401 | `UNAUTHENTICATED` |
//! | `MalformedTokenRequest` | 400 | `MALFORMED_TOKEN_REQUEST` |
//! | `Forbidden` | 403 | `FORBIDDEN` |
//! | `PreconditionFailed` | 412 | `PRECONDITION_FAILED` |
//! | `IntrospectionProtocol` | 502 | `INTROSPECTION_PROTOCOL_ERROR` |
//! | `IdentityNotPresent` | 500 | `IDENTITY_NOT_PRESENT` |

use http::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias using [`AuthError`].
pub type AuthResult<T> = Result<T, AuthError>;

/// Authentication and authorization failures.
///
/// # Example
///
/// ```
/// use portcullis_core::AuthError;
/// use http::StatusCode;
///
/// let error = AuthError::unauthenticated("Session is missing");
/// assert_eq!(error.status_code(), StatusCode::UNAUTHORIZED);
/// assert_eq!(error.detail(), "Session is missing");
/// ```
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// A required credential header is missing or malformed.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Credentials are missing, invalid, or the token is inactive.
    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),

    /// The token request itself is malformed, e.g. a refresh token was
    /// presented where an access token is required.
    #[error("Malformed token request: {0}")]
    MalformedTokenRequest(String),

    /// The caller is authenticated but lacks the required roles.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// An upstream stage did not leave the state this stage depends on.
    #[error("Precondition failed: {0}")]
    PreconditionFailed(String),

    /// The identity provider answered with an unexpected status or body,
    /// or could not be reached in time.
    #[error("Introspection protocol error: {message}")]
    IntrospectionProtocol {
        /// Diagnostic message (not exposed to clients).
        message: String,
    },

    /// The claims accessor was used without a successful user-auth stage
    /// upstream.
    #[error("Identity not present: {0}")]
    IdentityNotPresent(String),
}

impl AuthError {
    /// Creates a bad request error.
    #[must_use]
    pub fn bad_request(detail: impl Into<String>) -> Self {
        Self::BadRequest(detail.into())
    }

    /// Creates an unauthenticated error.
    #[must_use]
    pub fn unauthenticated(detail: impl Into<String>) -> Self {
        Self::Unauthenticated(detail.into())
    }

    /// Creates a malformed token request error.
    #[must_use]
    pub fn malformed_token_request(detail: impl Into<String>) -> Self {
        Self::MalformedTokenRequest(detail.into())
    }

    /// Creates a forbidden error.
    #[must_use]
    pub fn forbidden(detail: impl Into<String>) -> Self {
        Self::Forbidden(detail.into())
    }

    /// Creates a precondition failed error.
    #[must_use]
    pub fn precondition_failed(detail: impl Into<String>) -> Self {
        Self::PreconditionFailed(detail.into())
    }

    /// Creates an introspection protocol error.
    #[must_use]
    pub fn introspection(message: impl Into<String>) -> Self {
        Self::IntrospectionProtocol {
            message: message.into(),
        }
    }

    /// Creates an identity-not-present error.
    #[must_use]
    pub fn identity_not_present(detail: impl Into<String>) -> Self {
        Self::IdentityNotPresent(detail.into())
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) | Self::MalformedTokenRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::PreconditionFailed(_) => StatusCode::PRECONDITION_FAILED,
            Self::IntrospectionProtocol { .. } => StatusCode::BAD_GATEWAY,
            Self::IdentityNotPresent(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns a machine-readable error code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::Unauthenticated(_) => "UNAUTHENTICATED",
            Self::MalformedTokenRequest(_) => "MALFORMED_TOKEN_REQUEST",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::PreconditionFailed(_) => "PRECONDITION_FAILED",
            Self::IntrospectionProtocol { .. } => "INTROSPECTION_PROTOCOL_ERROR",
            Self::IdentityNotPresent(_) => "IDENTITY_NOT_PRESENT",
        }
    }

    /// Returns the detail message carried by the error.
    #[must_use]
    pub fn detail(&self) -> &str {
        match self {
            Self::BadRequest(detail)
            | Self::Unauthenticated(detail)
            | Self::MalformedTokenRequest(detail)
            | Self::Forbidden(detail)
            | Self::PreconditionFailed(detail)
            | Self::IdentityNotPresent(detail) => detail,
            Self::IntrospectionProtocol { message } => message,
        }
    }

    /// Returns `true` if the caller caused this error (4xx).
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        self.status_code().is_client_error()
    }

    /// Returns the message that may be shown to the caller.
    ///
    /// Server-side failures are reported generically; their detail is only
    /// meant for logs.
    #[must_use]
    pub fn public_message(&self) -> &str {
        match self {
            Self::IntrospectionProtocol { .. } => "Identity provider introspection failed",
            Self::IdentityNotPresent(_) => "Request identity is not available",
            _ => self.detail(),
        }
    }

    /// Converts this error to a serializable error envelope.
    #[must_use]
    pub fn to_envelope(&self, request_id: Option<&str>) -> ErrorEnvelope {
        ErrorEnvelope {
            error: ErrorDetail {
                code: self.code().to_string(),
                message: self.public_message().to_string(),
            },
            request_id: request_id.map(ToString::to_string),
        }
    }
}

/// Serializable error envelope for HTTP responses.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorEnvelope {
    /// The error details.
    pub error: ErrorDetail,
    /// The request ID for correlation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

/// Error detail within an envelope.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorDetail {
    /// Machine-readable error code.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
}
