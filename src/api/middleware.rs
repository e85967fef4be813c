//! Request middleware for the diagnostics namespace.

use axum::{
    extract::{MatchedPath, Request, State},
    middleware::Next,
    response::Response,
};
use tracing::{debug, warn};

use crate::auth;
use crate::error::AuthError;
use crate::metrics::{self, LatencyTimer};

use super::error::ApiError;
use super::handlers::AppState;

/// Administrator gate. Runs before every diagnostics handler and
/// short-circuits with 401/403 when the caller lacks `manage_options`.
pub async fn require_admin(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let identity = state.authenticator.authenticate(request.headers()).await;

    if let Err(err) = auth::authorize(identity.as_ref()) {
        let reason = match &err {
            AuthError::Unauthenticated => "unauthenticated",
            AuthError::Forbidden { .. } => "forbidden",
        };
        warn!(path = %request.uri().path(), reason, "Rejected diagnostics request");
        metrics::inc_auth_failures(reason);
        return Err(err.into());
    }

    if let Some(identity) = &identity {
        debug!(login = %identity.login, "Authorized diagnostics request");
    }
    Ok(next.run(request).await)
}

/// Count requests and record latency per matched route.
pub async fn track_requests(request: Request, next: Next) -> Response {
    let endpoint = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| request.uri().path().to_string());

    let timer = LatencyTimer::new(endpoint.clone());
    let response = next.run(request).await;
    metrics::inc_http_requests(&endpoint, response.status().as_u16());
    debug!(
        endpoint = %endpoint,
        status = response.status().as_u16(),
        elapsed_ms = timer.elapsed_ms(),
        "Request complete"
    );

    response
}
