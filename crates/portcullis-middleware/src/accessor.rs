//! Handler-side access to the verified user.
//!
//! Handlers behind a [`UserAuthStage`](crate::stages::UserAuthStage) read the
//! user back from the stamped headers. Calling these without that stage
//! upstream is a wiring mistake and fails with `IdentityNotPresent` (500).

use portcullis_core::{AuthError, AuthResult, Role, UserHeaders, UserStatus};

use crate::context::MiddlewareContext;
use crate::types::Request;

/// Returns the user stamped on `request`.
///
/// # Example
///
/// ```
/// use bytes::Bytes;
/// use http_body_util::Full;
/// use portcullis_core::{Role, UserStatus};
/// use portcullis_middleware::current_user;
///
/// let request = http::Request::builder()
///     .header("x-user-id", "0192f5d4-7c1e-7a3b-9e4d-5f6a7b8c9d0e")
///     .header("x-user-email", "alice@example.com")
///     .header("x-user-status", "active")
///     .header("x-user-roles", "admin user")
///     .body(Full::new(Bytes::new()))
///     .unwrap();
///
/// let user = current_user(&request).unwrap();
/// assert_eq!(user.status, UserStatus::Active);
/// assert_eq!(user.roles, vec![Role::Admin, Role::User]);
/// ```
pub fn current_user(request: &Request) -> AuthResult<UserHeaders> {
    UserHeaders::from_headers(request.headers())
}

/// Returns the user stored in the pipeline context by the user-auth stage.
pub fn context_user(ctx: &MiddlewareContext) -> AuthResult<&UserHeaders> {
    ctx.get_extension::<UserHeaders>().ok_or_else(|| {
        AuthError::identity_not_present("user authentication did not run for this request")
    })
}

/// Returns the user if they hold any of `roles`.
pub fn require_roles(request: &Request, roles: &[Role]) -> AuthResult<UserHeaders> {
    let user = current_user(request)?;
    user.require_any_role(roles)?;
    Ok(user)
}

/// Returns the user if their status is one of `allowed`.
pub fn require_status(request: &Request, allowed: &[UserStatus]) -> AuthResult<UserHeaders> {
    let user = current_user(request)?;
    user.require_status(allowed)?;
    Ok(user)
}
