//! Read-only diagnostics API for WordPress hosts.
//!
//! Serves four administrator-only endpoints under `/wp-json/wpdoctor/v1`
//! for monitoring clients that have no shell or database access:
//!
//! ```text
//! GET /system-info        WordPress/PHP versions and OS family
//! GET /plugins-analysis   installed plugins, active count, pending updates
//! GET /error-logs         tail of debug.log or error_log
//! GET /db-check           autoload payload size and table overhead
//! ```
//!
//! # Modules
//!
//! - [`config`]: Configuration loading from environment
//! - [`error`]: Unified error types
//! - [`auth`]: Caller identity and the administrator gate
//! - [`host`]: Read-only host collaborators (WordPress install, MySQL, mocks)
//! - [`php`]: Decoder for PHP-serialized option values
//! - [`diagnostics`]: The four reports
//! - [`api`]: HTTP routes, middleware and OpenAPI document
//! - [`client`]: Typed client for the API
//! - [`metrics`]: Prometheus metrics
//! - [`utils`]: Utility functions

pub mod api;
pub mod auth;
pub mod client;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod host;
pub mod metrics;
pub mod php;
pub mod utils;

pub use config::Config;
pub use error::{DoctorError, Result};
