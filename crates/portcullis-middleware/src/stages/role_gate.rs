//! Role gate stage.
//!
//! Enforces a [`RolePolicy`] against the `X-User-Roles` header stamped by the
//! user-auth stage. Paths the policy does not mention, and methods without a
//! requirement, pass untouched. A governed request arriving without the role
//! header means user auth did not run ahead of this stage; it fails with
//! `PreconditionFailed` instead of being treated as "no roles".

use std::collections::HashSet;
use std::sync::Arc;

use portcullis_core::headers::X_USER_ROLES;
use portcullis_core::{AuthError, AuthResult, RolePolicy};
use tracing::debug;

use super::rejected;
use crate::context::MiddlewareContext;
use crate::middleware::{BoxFuture, Middleware, Next};
use crate::pipeline::Stage;
use crate::types::{Request, Response};

/// Stage that checks the caller's roles against the route policy.
///
/// # Example
///
/// ```
/// use portcullis_core::RolePolicy;
/// use portcullis_middleware::stages::RoleGateStage;
///
/// let stage = RoleGateStage::new(
///     RolePolicy::new()
///         .with_rule("/admin", "*", ["admin"])
///         .with_rule("/courses", "post", ["admin"]),
/// );
/// assert_eq!(stage.policy().len(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct RoleGateStage {
    policy: Arc<RolePolicy>,
}

impl RoleGateStage {
    /// Creates the stage.
    pub fn new(policy: RolePolicy) -> Self {
        Self::shared(Arc::new(policy))
    }

    /// Creates the stage from an already shared policy.
    pub fn shared(policy: Arc<RolePolicy>) -> Self {
        Self { policy }
    }

    /// The enforced policy.
    pub fn policy(&self) -> &RolePolicy {
        &self.policy
    }

    fn check(&self, request: &Request) -> AuthResult<()> {
        let Some(required) = self
            .policy
            .required_roles(request.uri().path(), request.method())
        else {
            return Ok(());
        };
        if required.is_empty() {
            return Ok(());
        }

        let held: HashSet<&str> = request
            .headers()
            .get(X_USER_ROLES)
            .ok_or_else(|| {
                AuthError::precondition_failed(format!(
                    "{X_USER_ROLES} header is missing; user authentication must run first"
                ))
            })?
            .to_str()
            .map_err(|_| {
                AuthError::precondition_failed(format!("{X_USER_ROLES} header is not valid text"))
            })?
            .split_whitespace()
            .collect();

        if required.iter().any(|role| held.contains(role.as_str())) {
            Ok(())
        } else {
            Err(AuthError::forbidden(format!(
                "Not authorized: required roles [{}]",
                required.join(", ")
            )))
        }
    }
}

impl Middleware for RoleGateStage {
    fn name(&self) -> &'static str {
        Stage::RoleGate.name()
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut MiddlewareContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, AuthResult<Response>> {
        Box::pin(async move {
            if let Err(e) = self.check(&request) {
                return Err(rejected(ctx, Stage::RoleGate, request.uri().path(), e));
            }
            debug!(request_id = %ctx.request_id(), "role check passed");
            next.run(ctx, request).await
        })
    }
}
