//! Core middleware trait and types.
//!
//! Every pipeline stage implements [`Middleware`]. A stage either rejects the
//! request with an [`AuthError`](portcullis_core::AuthError) or hands it,
//! possibly with rewritten headers, to [`Next::run`].
//!
//! # Example
//!
//! ```
//! use portcullis_core::AuthResult;
//! use portcullis_middleware::{BoxFuture, Middleware, Next, Request, Response};
//! use portcullis_middleware::context::MiddlewareContext;
//!
//! struct Tagging;
//!
//! impl Middleware for Tagging {
//!     fn name(&self) -> &'static str {
//!         "tagging"
//!     }
//!
//!     fn process<'a>(
//!         &'a self,
//!         ctx: &'a mut MiddlewareContext,
//!         mut request: Request,
//!         next: Next<'a>,
//!     ) -> BoxFuture<'a, AuthResult<Response>> {
//!         Box::pin(async move {
//!             request
//!                 .headers_mut()
//!                 .insert("x-seen-by", http::HeaderValue::from_static("tagging"));
//!             next.run(ctx, request).await
//!         })
//!     }
//! }
//! ```

use std::future::Future;
use std::pin::Pin;

use portcullis_core::AuthResult;

use crate::context::MiddlewareContext;
use crate::types::{Request, Response};

/// A boxed, sendable future.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// The terminal request handler invoked after every stage forwarded.
pub type Handler<'a> =
    Box<dyn FnOnce(&mut MiddlewareContext, Request) -> BoxFuture<'static, AuthResult<Response>> + Send + 'a>;

/// A pipeline stage.
///
/// # Invariants
///
/// - A stage calls `next.run()` at most once; returning `Err` short-circuits
/// - A stage never swallows an error returned by `next.run()`
/// - A stage keeps no per-request state on `self`
pub trait Middleware: Send + Sync + 'static {
    /// Returns the unique name of this stage, used in logs.
    fn name(&self) -> &'static str;

    /// Process the request through this stage.
    fn process<'a>(
        &'a self,
        ctx: &'a mut MiddlewareContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, AuthResult<Response>>;
}

/// Callback to invoke the next stage in the chain.
///
/// Consumed by [`Next::run`], so it can be called once.
pub struct Next<'a> {
    inner: NextInner<'a>,
}

enum NextInner<'a> {
    Chain {
        middleware: &'a dyn Middleware,
        next: Box<Next<'a>>,
    },
    Handler(Handler<'a>),
}

impl<'a> Next<'a> {
    /// Creates a `Next` that invokes `middleware`, then `next`.
    pub(crate) fn new(middleware: &'a dyn Middleware, next: Next<'a>) -> Self {
        Self {
            inner: NextInner::Chain {
                middleware,
                next: Box::new(next),
            },
        }
    }

    /// Creates a terminal `Next` that invokes the handler.
    pub(crate) fn handler<F>(f: F) -> Self
    where
        F: FnOnce(&mut MiddlewareContext, Request) -> BoxFuture<'static, AuthResult<Response>>
            + Send
            + 'a,
    {
        Self {
            inner: NextInner::Handler(Box::new(f)),
        }
    }

    /// Invokes the next stage or the handler.
    pub async fn run(self, ctx: &mut MiddlewareContext, request: Request) -> AuthResult<Response> {
        match self.inner {
            NextInner::Chain { middleware, next } => middleware.process(ctx, request, *next).await,
            NextInner::Handler(handler) => handler(ctx, request).await,
        }
    }
}
