//! HTTP API handlers.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Serialize;
use utoipa::IntoParams;

use crate::auth::{AnonymousOnly, Authenticator};
use crate::diagnostics::{
    self, DbHealthSummary, LogTail, PluginsAnalysis, StatusFilter, SystemInfo,
};
use crate::host::Host;

use super::error::{ApiError, ErrorEnvelope};

/// Application state shared with handlers.
#[derive(Clone)]
pub struct AppState {
    /// Host collaborators.
    pub host: Host,
    /// Resolves callers for the administrator gate.
    pub authenticator: Arc<dyn Authenticator>,
    /// Prometheus handle for `/metrics`, if a recorder is installed.
    pub prometheus: Option<PrometheusHandle>,
}

impl AppState {
    /// Create new app state.
    pub fn new(host: Host, authenticator: Arc<dyn Authenticator>) -> Self {
        Self {
            host,
            authenticator,
            prometheus: None,
        }
    }

    /// State that rejects every caller.
    pub fn anonymous(host: Host) -> Self {
        Self::new(host, Arc::new(AnonymousOnly))
    }

    /// Attach a Prometheus handle.
    pub fn with_prometheus(mut self, handle: PrometheusHandle) -> Self {
        self.prometheus = Some(handle);
        self
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Status: "ok".
    pub status: &'static str,
}

/// Raw query string pairs, in request order. Repeated keys are kept.
type QueryPairs = Vec<(String, String)>;

/// Last value given for `key`; a repeated parameter resolves to its final
/// occurrence.
fn last_value(pairs: &[(String, String)], key: &str) -> Option<String> {
    pairs
        .iter()
        .rev()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.clone())
}

/// Query parameters of `/plugins-analysis`.
#[derive(Debug, Default, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PluginsQuery {
    /// `active` (default) or anything else for all plugins.
    pub status: Option<String>,
}

impl PluginsQuery {
    /// Resolve from raw pairs.
    pub fn from_pairs(pairs: &[(String, String)]) -> Self {
        Self {
            status: last_value(pairs, "status"),
        }
    }
}

/// Query parameters of `/error-logs`.
#[derive(Debug, Default, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ErrorLogsQuery {
    /// Number of lines to return (default 50).
    pub lines: Option<String>,
    /// Accepted for compatibility; not applied.
    pub level: Option<String>,
}

impl ErrorLogsQuery {
    /// Resolve from raw pairs.
    pub fn from_pairs(pairs: &[(String, String)]) -> Self {
        Self {
            lines: last_value(pairs, "lines"),
            level: last_value(pairs, "level"),
        }
    }
}

/// Health check handler - always returns 200.
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse { status: "ok" })
}

/// Prometheus scrape endpoint.
pub async fn prometheus_metrics(State(state): State<AppState>) -> impl IntoResponse {
    match &state.prometheus {
        Some(handle) => (StatusCode::OK, handle.render()),
        None => (StatusCode::NOT_FOUND, "metrics recorder not installed".to_string()),
    }
}

/// Platform, runtime and OS versions.
#[utoipa::path(
    get,
    path = "/wp-json/wpdoctor/v1/system-info",
    tag = "diagnostics",
    security(("basic_auth" = [])),
    responses(
        (status = 200, description = "Platform versions", body = SystemInfo),
        (status = 401, description = "No credentials", body = ErrorEnvelope),
        (status = 403, description = "Not an administrator", body = ErrorEnvelope)
    )
)]
pub async fn system_info(State(state): State<AppState>) -> Json<SystemInfo> {
    Json(diagnostics::system_info(state.host.platform.as_ref()).await)
}

/// Installed plugins and pending updates.
#[utoipa::path(
    get,
    path = "/wp-json/wpdoctor/v1/plugins-analysis",
    tag = "diagnostics",
    params(PluginsQuery),
    security(("basic_auth" = [])),
    responses(
        (status = 200, description = "Plugin inventory", body = PluginsAnalysis),
        (status = 401, description = "No credentials", body = ErrorEnvelope),
        (status = 403, description = "Not an administrator", body = ErrorEnvelope),
        (status = 500, description = "Host failure", body = ErrorEnvelope)
    )
)]
pub async fn plugins_analysis(
    State(state): State<AppState>,
    Query(pairs): Query<QueryPairs>,
) -> Result<Json<PluginsAnalysis>, ApiError> {
    let query = PluginsQuery::from_pairs(&pairs);
    let filter = StatusFilter::from_param(query.status.as_deref());
    let analysis = diagnostics::analyze_plugins(
        state.host.plugins.as_ref(),
        state.host.updates.as_ref(),
        filter,
    )
    .await?;
    Ok(Json(analysis))
}

/// Tail of the first readable error log.
#[utoipa::path(
    get,
    path = "/wp-json/wpdoctor/v1/error-logs",
    tag = "diagnostics",
    params(ErrorLogsQuery),
    security(("basic_auth" = [])),
    responses(
        (status = 200, description = "Log tail, empty when no log exists", body = LogTail),
        (status = 401, description = "No credentials", body = ErrorEnvelope),
        (status = 403, description = "Not an administrator", body = ErrorEnvelope)
    )
)]
pub async fn error_logs(
    State(state): State<AppState>,
    Query(pairs): Query<QueryPairs>,
) -> Json<LogTail> {
    let query = ErrorLogsQuery::from_pairs(&pairs);
    // `level` is reserved; no severity filtering is applied.
    let lines = diagnostics::parse_lines(query.lines.as_deref());
    let tail = diagnostics::tail_error_log(
        state.host.files.as_ref(),
        &state.host.log_candidates,
        lines,
    )
    .await;
    Json(tail)
}

/// Autoload payload size and table overhead.
#[utoipa::path(
    get,
    path = "/wp-json/wpdoctor/v1/db-check",
    tag = "diagnostics",
    security(("basic_auth" = [])),
    responses(
        (status = 200, description = "Database aggregates", body = DbHealthSummary),
        (status = 401, description = "No credentials", body = ErrorEnvelope),
        (status = 403, description = "Not an administrator", body = ErrorEnvelope),
        (status = 500, description = "Query failed", body = ErrorEnvelope)
    )
)]
pub async fn db_check(State(state): State<AppState>) -> Result<Json<DbHealthSummary>, ApiError> {
    let summary = diagnostics::db_health(state.host.database.as_ref()).await?;
    Ok(Json(summary))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(raw: &[(&str, &str)]) -> QueryPairs {
        raw.iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn repeated_parameters_take_last_value() {
        let query = ErrorLogsQuery::from_pairs(&pairs(&[
            ("lines", "1"),
            ("level", "a"),
            ("lines", "7"),
            ("level", "b"),
        ]));
        assert_eq!(query.lines.as_deref(), Some("7"));
        assert_eq!(query.level.as_deref(), Some("b"));

        let query = PluginsQuery::from_pairs(&pairs(&[("status", "all"), ("status", "active")]));
        assert_eq!(query.status.as_deref(), Some("active"));
    }

    #[test]
    fn missing_parameters_stay_unset() {
        let query = ErrorLogsQuery::from_pairs(&pairs(&[("other", "x")]));
        assert_eq!(query.lines, None);
        assert_eq!(query.level, None);
        assert_eq!(PluginsQuery::from_pairs(&[]).status, None);
    }
}
