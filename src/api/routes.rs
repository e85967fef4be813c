//! HTTP API route definitions.

use axum::{middleware, routing::get, Router};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use super::handlers::{
    db_check, error_logs, health, plugins_analysis, prometheus_metrics, system_info, AppState,
};
use super::middleware::{require_admin, track_requests};
use super::openapi::ApiDoc;

/// Namespace every diagnostics route lives under.
pub const NAMESPACE: &str = "/wp-json/wpdoctor/v1";

/// Diagnostics routes, all behind the administrator gate.
fn diagnostics_router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/system-info", get(system_info))
        .route("/plugins-analysis", get(plugins_analysis))
        .route("/error-logs", get(error_logs))
        .route("/db-check", get(db_check))
        .route_layer(middleware::from_fn_with_state(state, require_admin))
        .route_layer(middleware::from_fn(track_requests))
}

/// Create the API router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health endpoints
        .route("/health", get(health))
        .route("/metrics", get(prometheus_metrics))
        // Diagnostics
        .nest(NAMESPACE, diagnostics_router(state.clone()))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
