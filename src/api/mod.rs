//! HTTP API: the diagnostics namespace plus health, metrics and OpenAPI.

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod openapi;
pub mod routes;

pub use error::ApiError;
pub use handlers::AppState;
pub use routes::{create_router, NAMESPACE};
