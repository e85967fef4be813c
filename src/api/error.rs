//! Error responses in the WordPress REST envelope.
//!
//! ```json
//! {"code": "rest_forbidden", "message": "Sorry, you are not allowed to do that.", "data": {"status": 401}}
//! ```

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::error;
use utoipa::ToSchema;

use crate::error::{AuthError, HostError};
use crate::metrics;

/// Failure returned by a diagnostics route.
#[derive(Debug)]
pub enum ApiError {
    /// Gate rejected the caller.
    Auth(AuthError),
    /// A host query failed.
    Host(HostError),
}

/// Error body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ErrorEnvelope {
    /// Machine-readable error code.
    pub code: String,
    /// Human-readable message.
    pub message: String,
    /// Extra data.
    pub data: ErrorData,
}

/// `data` member of the error body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ErrorData {
    /// HTTP status repeated in the body.
    pub status: u16,
}

impl ApiError {
    /// HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Auth(AuthError::Unauthenticated) => StatusCode::UNAUTHORIZED,
            ApiError::Auth(AuthError::Forbidden { .. }) => StatusCode::FORBIDDEN,
            ApiError::Host(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        ApiError::Auth(err)
    }
}

impl From<HostError> for ApiError {
    fn from(err: HostError) -> Self {
        ApiError::Host(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (code, message) = match &self {
            ApiError::Auth(_) => ("rest_forbidden", "Sorry, you are not allowed to do that."),
            ApiError::Host(err) => {
                error!("Host failure: {}", err);
                metrics::inc_host_errors();
                (
                    "internal_server_error",
                    "There has been a critical error on this website.",
                )
            }
        };

        let body = Json(ErrorEnvelope {
            code: code.to_string(),
            message: message.to_string(),
            data: ErrorData {
                status: status.as_u16(),
            },
        });

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_follow_error_kind() {
        assert_eq!(
            ApiError::Auth(AuthError::Unauthenticated).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::Auth(AuthError::Forbidden {
                capability: "manage_options".to_string()
            })
            .status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            ApiError::Host(HostError::NoDatabase).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
