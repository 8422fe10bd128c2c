//! Middleware context types.
//!
//! The [`MiddlewareContext`] carries per-request state through the pipeline.
//! The auth stages stash the claims they verified here so later stages and
//! the handler can read them without another introspection call.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::time::{Duration, Instant};

use portcullis_core::{ClientClaims, UserClaims};
use uuid::Uuid;

/// Context that flows through the middleware pipeline.
///
/// # Example
///
/// ```
/// use portcullis_middleware::context::MiddlewareContext;
///
/// let ctx = MiddlewareContext::new();
/// assert_eq!(ctx.request_id().get_version_num(), 7);
/// assert!(ctx.client_claims().is_none());
/// ```
#[derive(Debug)]
pub struct MiddlewareContext {
    /// Unique identifier for this request (UUID v7).
    request_id: Uuid,

    /// When the request entered the pipeline.
    started_at: Instant,

    /// Type-erased extension data.
    extensions: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl MiddlewareContext {
    /// Creates a new middleware context with a fresh request ID.
    #[must_use]
    pub fn new() -> Self {
        Self::with_request_id(Uuid::now_v7())
    }

    /// Creates a context with a specific request ID.
    ///
    /// Useful when the request ID was provided by a client or upstream service.
    #[must_use]
    pub fn with_request_id(request_id: Uuid) -> Self {
        Self {
            request_id,
            started_at: Instant::now(),
            extensions: HashMap::new(),
        }
    }

    /// Returns the request ID.
    #[must_use]
    pub fn request_id(&self) -> Uuid {
        self.request_id
    }

    /// Returns when the request started processing.
    #[must_use]
    pub fn started_at(&self) -> Instant {
        self.started_at
    }

    /// Returns the elapsed time since the request started.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Claims stored by the client-auth stage, if it ran.
    #[must_use]
    pub fn client_claims(&self) -> Option<&ClientClaims> {
        self.get_extension()
    }

    /// Claims stored by the user-auth stage, if it ran.
    #[must_use]
    pub fn user_claims(&self) -> Option<&UserClaims> {
        self.get_extension()
    }

    /// Stores a typed extension value, replacing any previous value of `T`.
    ///
    /// # Example
    ///
    /// ```
    /// use portcullis_middleware::context::MiddlewareContext;
    ///
    /// #[derive(Clone)]
    /// struct Tenant(String);
    ///
    /// let mut ctx = MiddlewareContext::new();
    /// ctx.set_extension(Tenant("acme".into()));
    ///
    /// assert_eq!(ctx.get_extension::<Tenant>().unwrap().0, "acme");
    /// ```
    pub fn set_extension<T: Send + Sync + 'static>(&mut self, value: T) {
        self.extensions.insert(TypeId::of::<T>(), Box::new(value));
    }

    /// Retrieves a typed extension value.
    #[must_use]
    pub fn get_extension<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.extensions
            .get(&TypeId::of::<T>())
            .and_then(|v| v.downcast_ref())
    }

    /// Removes and returns a typed extension value.
    pub fn remove_extension<T: Send + Sync + 'static>(&mut self) -> Option<T> {
        self.extensions
            .remove(&TypeId::of::<T>())
            .and_then(|v| v.downcast().ok())
            .map(|b| *b)
    }

    /// Checks if an extension of the given type exists.
    #[must_use]
    pub fn has_extension<T: Send + Sync + 'static>(&self) -> bool {
        self.extensions.contains_key(&TypeId::of::<T>())
    }
}

impl Default for MiddlewareContext {
    fn default() -> Self {
        Self::new()
    }
}
