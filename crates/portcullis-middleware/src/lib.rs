//! # Portcullis Middleware
//!
//! The authentication pipeline: an ordered chain of stages that verify the
//! calling client, verify the end user, and enforce a route role policy
//! before a request reaches its handler.
//!
//! ## Pipeline Stages
//!
//! ```text
//! Request → ClientAuth → UserAuth → RoleGate → [custom stages] → Handler
//! ```
//!
//! | Stage | Checks | On success |
//! |-------|--------|------------|
//! | [`ClientAuthStage`] | `Client-Authorization` bearer token | stamps `X-Client-*` |
//! | [`UserAuthStage`] | `session_id` cookie, `Authorization` bearer token | stamps `X-User-*` |
//! | [`RoleGateStage`] | `X-User-Roles` against the route policy | forwards |
//!
//! Each stage is optional. A failing stage returns an
//! [`AuthError`](portcullis_core::AuthError) and nothing after it runs.
//!
//! ## Example
//!
//! ```
//! use portcullis_middleware::pipeline::Stage;
//!
//! let stages = Stage::all();
//! assert_eq!(stages.len(), 3);
//! assert_eq!(stages[0].name(), "client_auth");
//! assert_eq!(stages[2].name(), "role_gate");
//! ```

#![doc(html_root_url = "https://docs.rs/portcullis-middleware/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod accessor;
pub mod context;
pub mod middleware;
pub mod pipeline;
pub mod stages;
pub mod types;

pub use accessor::{context_user, current_user, require_roles, require_status};
pub use context::MiddlewareContext;
pub use middleware::{BoxFuture, Handler, Middleware, Next};
pub use pipeline::{Pipeline, PipelineBuilder, Stage};
pub use stages::{ClientAuthStage, PathSet, RoleGateStage, UserAuthStage, DEFAULT_DOCS_ENDPOINTS};
pub use types::{Request, Response, ResponseExt};
