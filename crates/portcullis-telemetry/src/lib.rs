//! Logging setup for Portcullis.
//!
//! Every Portcullis crate logs through `tracing`. This crate installs the
//! subscriber that turns those events into output:
//!
//! - **JSON** (production): one object per line, suitable for log shipping
//! - **Pretty** (development): multi-line, with file and line numbers
//!
//! Pipeline events share the field names in [`logging::fields`]:
//!
//! | Event | Level | Fields |
//! |-------|-------|--------|
//! | stage rejected a request (4xx) | `warn` | `request_id`, `stage`, `http.path`, `error.code` |
//! | stage rejected a request (5xx) | `error` | same |
//! | introspection call finished | `debug` | `http.status_code`, `duration_ms` |
//! | pipeline assembled | `info` | `realm` |
//!
//! # Example
//!
//! ```rust,ignore
//! use portcullis_telemetry::{init_logging, LogConfig};
//!
//! init_logging(&LogConfig::development())?;
//! ```

#![warn(missing_docs)]

pub mod error;
pub mod logging;

pub use error::TelemetryError;
pub use logging::{create_env_filter, fields, init_logging, LogConfig, LogFormat};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;
