//! Introspection claims.
//!
//! These types are produced exclusively by deserializing the identity
//! provider's introspection response. They are plain data: nothing here
//! decides whether a token is acceptable, that is the job of the pipeline
//! stages.

use std::fmt;
use std::str::FromStr;

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;
use uuid::Uuid;

/// Error returned when a closed-set enum is parsed from an unknown string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} '{value}'")]
pub struct ParseEnumError {
    /// The enum being parsed ("role", "user status", "token type").
    pub kind: &'static str,
    /// The rejected input.
    pub value: String,
}

impl ParseEnumError {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

/// Kind of token reported by introspection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    /// Short-lived token that authenticates requests.
    Access,
    /// Long-lived token used only to obtain new access tokens.
    Refresh,
}

impl TokenType {
    /// Returns the wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Access => "access",
            Self::Refresh => "refresh",
        }
    }
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TokenType {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "access" => Ok(Self::Access),
            "refresh" => Ok(Self::Refresh),
            other => Err(ParseEnumError::new("token type", other)),
        }
    }
}

/// Global role of a user within a realm.
///
/// Closed and case-sensitive: `"Admin"` is not a role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Realm owner.
    Superadmin,
    /// Realm administrator.
    Admin,
    /// Regular user.
    User,
    /// Read-only visitor.
    Guest,
}

impl Role {
    /// Returns the wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Superadmin => "superadmin",
            Self::Admin => "admin",
            Self::User => "user",
            Self::Guest => "guest",
        }
    }

    /// Returns every role.
    #[must_use]
    pub const fn all() -> [Role; 4] {
        [Self::Superadmin, Self::Admin, Self::User, Self::Guest]
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "superadmin" => Ok(Self::Superadmin),
            "admin" => Ok(Self::Admin),
            "user" => Ok(Self::User),
            "guest" => Ok(Self::Guest),
            other => Err(ParseEnumError::new("role", other)),
        }
    }
}

/// Lifecycle state of a user account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserStatus {
    /// Registered, email not yet confirmed.
    Registered,
    /// Email confirmed.
    EmailVerified,
    /// Active account.
    Active,
    /// No activity for a long time.
    Inactive,
    /// Banned by an administrator.
    Banned,
    /// Soft-deleted; the record is kept.
    Deleted,
}

impl UserStatus {
    /// Returns the wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Registered => "registered",
            Self::EmailVerified => "email_verified",
            Self::Active => "active",
            Self::Inactive => "inactive",
            Self::Banned => "banned",
            Self::Deleted => "deleted",
        }
    }
}

impl fmt::Display for UserStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "registered" => Ok(Self::Registered),
            "email_verified" => Ok(Self::EmailVerified),
            "active" => Ok(Self::Active),
            "inactive" => Ok(Self::Inactive),
            "banned" => Ok(Self::Banned),
            "deleted" => Ok(Self::Deleted),
            other => Err(ParseEnumError::new("user status", other)),
        }
    }
}

/// Parses a whitespace-separated role list, preserving order.
///
/// # Example
///
/// ```
/// use portcullis_core::{parse_roles, Role};
///
/// assert_eq!(parse_roles("admin user").unwrap(), vec![Role::Admin, Role::User]);
/// assert!(parse_roles("admin moderator").is_err());
/// ```
pub fn parse_roles(joined: &str) -> Result<Vec<Role>, ParseEnumError> {
    joined.split_whitespace().map(str::parse).collect()
}

/// Joins roles with single spaces, the `X-User-Roles` wire format.
#[must_use]
pub fn join_roles(roles: &[Role]) -> String {
    roles
        .iter()
        .map(|role| role.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Assertions common to every introspected token.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// Whether the token is currently valid.
    #[serde(default)]
    pub active: bool,
    /// Why the token is not active.
    #[serde(default)]
    pub cause: Option<String>,
    /// Access or refresh.
    #[serde(default)]
    pub token_type: Option<TokenType>,
    /// Issuer.
    #[serde(default)]
    pub iss: Option<Url>,
    /// Subject.
    #[serde(default)]
    pub sub: Option<String>,
    /// Audience.
    #[serde(default)]
    pub aud: Option<String>,
    /// Expiry, seconds since the epoch.
    #[serde(default)]
    pub exp: Option<f64>,
    /// Issue time, seconds since the epoch.
    #[serde(default)]
    pub iat: Option<f64>,
    /// Token identifier.
    #[serde(default)]
    pub jti: Option<Uuid>,
}

impl Claims {
    /// Returns `true` if the token type is `access`.
    #[must_use]
    pub fn is_access_token(&self) -> bool {
        self.token_type == Some(TokenType::Access)
    }
}

/// Claims describing a machine/client principal.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClientClaims {
    /// Common token claims.
    #[serde(flatten)]
    pub claims: Claims,
    /// Realm the client belongs to.
    #[serde(default)]
    pub realm: Option<String>,
    /// Granted scope.
    #[serde(default)]
    pub scope: Option<String>,
}

/// Claims describing a human principal.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserClaims {
    /// Common token claims.
    #[serde(flatten)]
    pub claims: Claims,
    /// Email address as reported by the identity provider.
    #[serde(default)]
    pub email: Option<String>,
    /// Account status.
    #[serde(default)]
    pub status: Option<UserStatus>,
    /// Realm the user belongs to.
    #[serde(default)]
    pub realm: Option<String>,
    /// Global roles, in provider order.
    #[serde(default, deserialize_with = "deserialize_roles")]
    pub roles: Vec<Role>,
}

/// Accepts roles as a space-joined string or a JSON list.
fn deserialize_roles<'de, D>(deserializer: D) -> Result<Vec<Role>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RolesRepr {
        Joined(String),
        List(Vec<Role>),
    }

    match Option::<RolesRepr>::deserialize(deserializer)? {
        None => Ok(Vec::new()),
        Some(RolesRepr::List(roles)) => Ok(roles),
        Some(RolesRepr::Joined(joined)) => parse_roles(&joined).map_err(de::Error::custom),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_role_parse_is_case_sensitive() {
        assert_eq!("admin".parse::<Role>().unwrap(), Role::Admin);
        let err = "Admin".parse::<Role>().unwrap_err();
        assert_eq!(err.kind, "role");
        assert_eq!(err.to_string(), "unknown role 'Admin'");
    }

    #[test]
    fn test_user_status_names() {
        assert_eq!(UserStatus::EmailVerified.as_str(), "email_verified");
        assert_eq!(
            "email_verified".parse::<UserStatus>().unwrap(),
            UserStatus::EmailVerified
        );
        assert!("suspended".parse::<UserStatus>().is_err());
    }

    #[test]
    fn test_join_and_parse_roles_keep_order() {
        let roles = vec![Role::User, Role::Superadmin, Role::Guest];
        assert_eq!(join_roles(&roles), "user superadmin guest");
        assert_eq!(parse_roles(&join_roles(&roles)).unwrap(), roles);
        assert!(parse_roles("").unwrap().is_empty());
    }

    #[test]
    fn test_client_claims_from_introspection() {
        let claims: ClientClaims = serde_json::from_value(json!({
            "active": true,
            "token_type": "access",
            "iss": "https://sso.example.com/api/v1",
            "sub": "billing-service",
            "exp": 1_900_000_000,
            "iat": 1_899_999_000.5,
            "jti": "0b5e3d9c-3c55-4a0e-9a36-2e3f0fb5f1a1",
            "realm": "acme",
            "scope": "invoices:read"
        }))
        .unwrap();

        assert!(claims.claims.active);
        assert!(claims.claims.is_access_token());
        assert_eq!(claims.claims.sub.as_deref(), Some("billing-service"));
        assert_eq!(claims.claims.exp, Some(1_900_000_000.0));
        assert_eq!(claims.claims.iat, Some(1_899_999_000.5));
        assert_eq!(claims.realm.as_deref(), Some("acme"));
        assert_eq!(claims.scope.as_deref(), Some("invoices:read"));
    }

    #[test]
    fn test_inactive_response_defaults() {
        let claims: ClientClaims =
            serde_json::from_value(json!({"cause": "Token revoked"})).unwrap();
        assert!(!claims.claims.active);
        assert_eq!(claims.claims.cause.as_deref(), Some("Token revoked"));
        assert!(claims.claims.token_type.is_none());
    }

    #[test]
    fn test_user_roles_as_string() {
        let claims: UserClaims = serde_json::from_value(json!({
            "active": true,
            "roles": "admin user"
        }))
        .unwrap();
        assert_eq!(claims.roles, vec![Role::Admin, Role::User]);
    }

    #[test]
    fn test_user_roles_as_list() {
        let claims: UserClaims = serde_json::from_value(json!({
            "active": true,
            "roles": ["guest", "admin"]
        }))
        .unwrap();
        assert_eq!(claims.roles, vec![Role::Guest, Role::Admin]);
    }

    #[test]
    fn test_user_roles_absent_or_null() {
        let absent: UserClaims = serde_json::from_value(json!({"active": true})).unwrap();
        assert!(absent.roles.is_empty());

        let null: UserClaims =
            serde_json::from_value(json!({"active": true, "roles": null})).unwrap();
        assert!(null.roles.is_empty());
    }

    #[test]
    fn test_unknown_role_is_rejected() {
        let joined = serde_json::from_value::<UserClaims>(json!({"roles": "admin moderator"}));
        assert!(joined.is_err());

        let listed = serde_json::from_value::<UserClaims>(json!({"roles": ["moderator"]}));
        assert!(listed.is_err());
    }

    #[test]
    fn test_unknown_status_is_rejected() {
        let result = serde_json::from_value::<UserClaims>(json!({"status": "suspended"}));
        assert!(result.is_err());
    }

    #[test]
    fn test_refresh_token_type() {
        let claims: UserClaims =
            serde_json::from_value(json!({"active": true, "token_type": "refresh"})).unwrap();
        assert_eq!(claims.claims.token_type, Some(TokenType::Refresh));
        assert!(!claims.claims.is_access_token());
    }
}
