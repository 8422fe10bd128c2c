//! Header names and the carried user identity.
//!
//! Identity crosses stage boundaries as a flat set of string-valued headers.
//! [`UserHeaders`] is the typed view of the user half of that contract: the
//! user-auth stage writes it, the claims accessor reads it back.

use std::collections::HashSet;

use http::header::{HeaderMap, HeaderName, HeaderValue};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::claims::{join_roles, parse_roles, Role, UserClaims, UserStatus};
use crate::email::EmailAddress;
use crate::error::{AuthError, AuthResult};

/// Inbound client credential header.
pub const CLIENT_AUTHORIZATION: &str = "client-authorization";

/// Session cookie name required by the user-auth stage.
pub const SESSION_COOKIE: &str = "session_id";

/// Stamped client subject.
pub const X_CLIENT_ID: &str = "x-client-id";
/// Stamped client scope.
pub const X_CLIENT_SCOPE: &str = "x-client-scope";
/// Stamped client realm.
pub const X_CLIENT_REALM: &str = "x-client-realm";

/// Stamped user id (UUID).
pub const X_USER_ID: &str = "x-user-id";
/// Stamped user roles, space-joined.
pub const X_USER_ROLES: &str = "x-user-roles";
/// Stamped user realm.
pub const X_USER_REALM: &str = "x-user-realm";
/// Stamped user status.
pub const X_USER_STATUS: &str = "x-user-status";
/// Stamped user email.
pub const X_USER_EMAIL: &str = "x-user-email";

/// Extracts the token from a `Bearer <token>` header value.
///
/// Returns `None` for a missing prefix or an empty token.
///
/// # Example
///
/// ```
/// use portcullis_core::headers::bearer_token;
///
/// assert_eq!(bearer_token("Bearer abc.def"), Some("abc.def"));
/// assert_eq!(bearer_token("Basic abc"), None);
/// assert_eq!(bearer_token("Bearer "), None);
/// ```
#[must_use]
pub fn bearer_token(value: &str) -> Option<&str> {
    value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Sets `name` to `value`, or removes it when `value` is `None`.
///
/// Removal keeps a caller-supplied header from surviving when the verified
/// claim is absent.
pub fn set_or_remove(
    headers: &mut HeaderMap,
    name: &'static str,
    value: Option<&str>,
) -> AuthResult<()> {
    let name = HeaderName::from_static(name);
    match value {
        Some(value) => {
            let value = HeaderValue::from_str(value).map_err(|_| {
                AuthError::introspection(format!("claim for {name} is not a valid header value"))
            })?;
            headers.insert(name, value);
        }
        None => {
            headers.remove(name);
        }
    }
    Ok(())
}

/// The verified user identity carried on the request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserHeaders {
    /// User id (the token subject).
    pub user_id: Uuid,
    /// Validated email address.
    pub email: EmailAddress,
    /// Account status.
    pub status: UserStatus,
    /// Roles, in provider order.
    pub roles: Vec<Role>,
}

impl UserHeaders {
    /// Builds the carried identity from introspected user claims.
    ///
    /// A claim set that cannot be carried (non-UUID subject, missing or
    /// invalid email, missing status) means the identity provider broke its
    /// contract, so the error is [`AuthError::IntrospectionProtocol`].
    pub fn from_claims(claims: &UserClaims) -> AuthResult<Self> {
        let sub = claims
            .claims
            .sub
            .as_deref()
            .ok_or_else(|| AuthError::introspection("user claims carry no subject"))?;
        let user_id = Uuid::parse_str(sub)
            .map_err(|_| AuthError::introspection("user subject is not a UUID"))?;
        let email = claims
            .email
            .as_deref()
            .ok_or_else(|| AuthError::introspection("user claims carry no email"))?;
        let email = EmailAddress::parse(email)
            .map_err(|e| AuthError::introspection(format!("user claims: {e}")))?;
        let status = claims
            .status
            .ok_or_else(|| AuthError::introspection("user claims carry no status"))?;

        Ok(Self {
            user_id,
            email,
            status,
            roles: claims.roles.clone(),
        })
    }

    /// Parses the identity back out of request headers.
    ///
    /// Fails with [`AuthError::IdentityNotPresent`] when any header is absent
    /// or malformed.
    pub fn from_headers(headers: &HeaderMap) -> AuthResult<Self> {
        let user_id = read(headers, X_USER_ID)?;
        let user_id = Uuid::parse_str(user_id)
            .map_err(|_| AuthError::identity_not_present(format!("{X_USER_ID} is not a UUID")))?;

        let email = EmailAddress::parse(read(headers, X_USER_EMAIL)?)
            .map_err(|e| AuthError::identity_not_present(format!("{X_USER_EMAIL}: {e}")))?;

        let status = read(headers, X_USER_STATUS)?
            .parse::<UserStatus>()
            .map_err(|e| AuthError::identity_not_present(format!("{X_USER_STATUS}: {e}")))?;

        let roles = parse_roles(read(headers, X_USER_ROLES)?)
            .map_err(|e| AuthError::identity_not_present(format!("{X_USER_ROLES}: {e}")))?;

        Ok(Self {
            user_id,
            email,
            status,
            roles,
        })
    }

    /// Writes the identity into request headers, replacing prior values.
    pub fn write_to(&self, headers: &mut HeaderMap) -> AuthResult<()> {
        set_or_remove(headers, X_USER_ID, Some(&self.user_id.to_string()))?;
        set_or_remove(headers, X_USER_ROLES, Some(&join_roles(&self.roles)))?;
        set_or_remove(headers, X_USER_STATUS, Some(self.status.as_str()))?;
        set_or_remove(headers, X_USER_EMAIL, Some(self.email.as_str()))
    }

    /// Returns `true` if the user holds `role`.
    #[must_use]
    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    /// Requires at least one of `roles`.
    ///
    /// An empty requirement always passes.
    pub fn require_any_role(&self, roles: &[Role]) -> AuthResult<()> {
        if roles.is_empty() {
            return Ok(());
        }
        let held: HashSet<Role> = self.roles.iter().copied().collect();
        if roles.iter().any(|role| held.contains(role)) {
            Ok(())
        } else {
            Err(AuthError::forbidden(format!(
                "Not authorized: required roles [{}]",
                join_with_comma(roles.iter().map(|role| role.as_str()))
            )))
        }
    }

    /// Requires the account status to be one of `allowed`.
    pub fn require_status(&self, allowed: &[UserStatus]) -> AuthResult<()> {
        if allowed.contains(&self.status) {
            Ok(())
        } else {
            Err(AuthError::forbidden(format!(
                "Not authorized: user status '{}' is not one of [{}]",
                self.status,
                join_with_comma(allowed.iter().map(|status| status.as_str()))
            )))
        }
    }
}

fn join_with_comma<'a>(items: impl Iterator<Item = &'a str>) -> String {
    items.collect::<Vec<_>>().join(", ")
}

fn read<'h>(headers: &'h HeaderMap, name: &'static str) -> AuthResult<&'h str> {
    headers
        .get(name)
        .ok_or_else(|| AuthError::identity_not_present(format!("{name} header is missing")))?
        .to_str()
        .map_err(|_| AuthError::identity_not_present(format!("{name} header is not valid text")))
}
