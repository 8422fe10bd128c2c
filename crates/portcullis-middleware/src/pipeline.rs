//! Ordered authentication pipeline.
//!
//! ## Pipeline Stages
//!
//! The auth stages occupy fixed slots and always run in this order,
//! whichever order the builder methods are called in:
//!
//! 1. **Client auth** - introspect the `Client-Authorization` bearer token
//! 2. **User auth** - require a session and introspect the user token
//! 3. **Role gate** - enforce the route role policy
//!
//! Custom stages added with [`PipelineBuilder::add_stage`] run after the
//! auth stages, in insertion order. The first stage that fails ends the
//! request; later stages and the handler do not run.

use std::sync::Arc;

use portcullis_core::AuthResult;
use tracing::{debug, error, warn};

use crate::context::MiddlewareContext;
use crate::middleware::{BoxFuture, Middleware, Next};
use crate::stages::{ClientAuthStage, RoleGateStage, UserAuthStage};
use crate::types::{Request, Response, ResponseExt};

/// A type-erased stage that can be stored in a vector.
pub type BoxedMiddleware = Arc<dyn Middleware>;

/// The assembled pipeline.
///
/// Immutable once built and cheap to clone; share one instance across all
/// requests.
///
/// # Example
///
/// ```
/// use bytes::Bytes;
/// use http_body_util::Full;
/// use portcullis_middleware::{MiddlewareContext, Pipeline};
///
/// # #[tokio::main]
/// # async fn main() {
/// let pipeline = Pipeline::builder().build();
/// let request = http::Request::builder().uri("/").body(Full::new(Bytes::new())).unwrap();
///
/// let response = pipeline
///     .respond(MiddlewareContext::new(), request, |_ctx, _req| {
///         Box::pin(async { Ok(http::Response::new(Full::new(Bytes::from("hello")))) })
///     })
///     .await;
/// assert_eq!(response.status(), http::StatusCode::OK);
/// # }
/// ```
#[derive(Clone)]
pub struct Pipeline {
    stages: Vec<BoxedMiddleware>,
}

impl Pipeline {
    /// Creates a new pipeline builder.
    #[must_use]
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::new()
    }

    /// Runs `request` through every stage, then `handler`.
    ///
    /// Returns the first stage error unchanged.
    pub async fn process<H>(
        &self,
        mut ctx: MiddlewareContext,
        request: Request,
        handler: H,
    ) -> AuthResult<Response>
    where
        H: FnOnce(&mut MiddlewareContext, Request) -> BoxFuture<'static, AuthResult<Response>>
            + Send
            + 'static,
    {
        let next = self.build_chain(handler);
        next.run(&mut ctx, request).await
    }

    /// Like [`process`](Self::process), but renders errors as JSON envelopes.
    pub async fn respond<H>(&self, ctx: MiddlewareContext, request: Request, handler: H) -> Response
    where
        H: FnOnce(&mut MiddlewareContext, Request) -> BoxFuture<'static, AuthResult<Response>>
            + Send
            + 'static,
    {
        let request_id = ctx.request_id().to_string();
        let path = request.uri().path().to_string();

        match self.process(ctx, request, handler).await {
            Ok(response) => response,
            Err(e) => {
                if e.is_client_error() {
                    debug!(request_id = %request_id, http.path = %path, error.code = e.code(), "request rejected");
                } else {
                    error!(request_id = %request_id, http.path = %path, error.code = e.code(), error = %e, "request failed");
                }
                Response::from_auth_error(&e, Some(&request_id))
            }
        }
    }

    fn build_chain<'a, H>(&'a self, handler: H) -> Next<'a>
    where
        H: FnOnce(&mut MiddlewareContext, Request) -> BoxFuture<'static, AuthResult<Response>>
            + Send
            + 'a,
    {
        let mut next = Next::handler(handler);
        for middleware in self.stages.iter().rev() {
            next = Next::new(middleware.as_ref(), next);
        }
        next
    }

    /// Returns the names of all stages in execution order.
    #[must_use]
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|mw| mw.name()).collect()
    }

    /// Returns the number of stages.
    #[must_use]
    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("stages", &self.stage_names())
            .finish()
    }
}

/// Builder for constructing a [`Pipeline`].
#[derive(Default)]
pub struct PipelineBuilder {
    client_auth: Option<BoxedMiddleware>,
    user_auth: Option<BoxedMiddleware>,
    role_gate: Option<BoxedMiddleware>,
    custom: Vec<BoxedMiddleware>,
}

impl PipelineBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fills the client-auth slot.
    #[must_use]
    pub fn client_auth(mut self, stage: ClientAuthStage) -> Self {
        self.client_auth = Some(Arc::new(stage));
        self
    }

    /// Fills the user-auth slot.
    #[must_use]
    pub fn user_auth(mut self, stage: UserAuthStage) -> Self {
        self.user_auth = Some(Arc::new(stage));
        self
    }

    /// Fills the role-gate slot.
    #[must_use]
    pub fn role_gate(mut self, stage: RoleGateStage) -> Self {
        self.role_gate = Some(Arc::new(stage));
        self
    }

    /// Appends a custom stage that runs after the auth stages.
    #[must_use]
    pub fn add_stage<M: Middleware>(mut self, middleware: M) -> Self {
        self.custom.push(Arc::new(middleware));
        self
    }

    /// Builds the pipeline.
    #[must_use]
    pub fn build(self) -> Pipeline {
        if self.role_gate.is_some() && self.user_auth.is_none() {
            warn!(
                stage = Stage::RoleGate.name(),
                "role gate configured without user auth; governed paths will fail with 412"
            );
        }

        let stages = [self.client_auth, self.user_auth, self.role_gate]
            .into_iter()
            .flatten()
            .chain(self.custom)
            .collect();

        Pipeline { stages }
    }
}

/// The fixed auth stage slots, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Stage {
    /// Client token introspection.
    ClientAuth = 1,
    /// Session and user token introspection.
    UserAuth = 2,
    /// Route role policy.
    RoleGate = 3,
}

impl Stage {
    /// Returns the stage name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::ClientAuth => "client_auth",
            Self::UserAuth => "user_auth",
            Self::RoleGate => "role_gate",
        }
    }

    /// Returns all stages in order.
    #[must_use]
    pub const fn all() -> [Stage; 3] {
        [Self::ClientAuth, Self::UserAuth, Self::RoleGate]
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use http::StatusCode;
    use http_body_util::{BodyExt, Full};
    use portcullis_core::{AuthError, RolePolicy};
    use std::sync::Mutex;

    struct OrderTracking {
        name: &'static str,
        order: Arc<Mutex<Vec<&'static str>>>,
    }

    impl Middleware for OrderTracking {
        fn name(&self) -> &'static str {
            self.name
        }

        fn process<'a>(
            &'a self,
            ctx: &'a mut MiddlewareContext,
            request: Request,
            next: Next<'a>,
        ) -> BoxFuture<'a, AuthResult<Response>> {
            Box::pin(async move {
                self.order.lock().unwrap().push(self.name);
                next.run(ctx, request).await
            })
        }
    }

    fn request(path: &str) -> Request {
        http::Request::builder()
            .uri(path)
            .body(Full::new(Bytes::new()))
            .unwrap()
    }

    fn ok(
        _ctx: &mut MiddlewareContext,
        _req: Request,
    ) -> BoxFuture<'static, AuthResult<Response>> {
        Box::pin(async { Ok(http::Response::new(Full::new(Bytes::from("OK")))) })
    }

    #[tokio::test]
    async fn test_custom_stages_run_in_insertion_order() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let pipeline = Pipeline::builder()
            .add_stage(OrderTracking { name: "first", order: order.clone() })
            .add_stage(OrderTracking { name: "second", order: order.clone() })
            .build();

        let response = pipeline
            .process(MiddlewareContext::new(), request("/"), ok)
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(*order.lock().unwrap(), vec!["first", "second"]);
    }

    #[tokio::test]
    async fn test_empty_pipeline_calls_handler() {
        let pipeline = Pipeline::builder().build();
        assert_eq!(pipeline.stage_count(), 0);

        let response = pipeline
            .process(MiddlewareContext::new(), request("/"), ok)
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_slots_precede_custom_stages() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let pipeline = Pipeline::builder()
            .add_stage(OrderTracking { name: "audit", order })
            .role_gate(RoleGateStage::new(RolePolicy::new()))
            .build();

        assert_eq!(pipeline.stage_names(), vec!["role_gate", "audit"]);
    }

    #[tokio::test]
    async fn test_respond_renders_handler_error() {
        let pipeline = Pipeline::builder().build();
        let response = pipeline
            .respond(MiddlewareContext::new(), request("/"), |_ctx, _req| {
                Box::pin(async { Err(AuthError::forbidden("handler says no")) })
            })
            .await;

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"]["message"], "handler says no");
        assert!(json["request_id"].is_string());
    }

    #[test]
    fn test_stage_ordering() {
        assert!(Stage::ClientAuth < Stage::UserAuth);
        assert!(Stage::UserAuth < Stage::RoleGate);
        assert_eq!(Stage::all().map(Stage::name), ["client_auth", "user_auth", "role_gate"]);
    }
}
