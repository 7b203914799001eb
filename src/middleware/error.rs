use std::fmt;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

/// Rejections produced by the access guards.
#[derive(Debug)]
pub enum AuthError {
    /// No identity source matched the request
    Unauthenticated,

    /// Authenticated, but multi-factor step-up is still pending
    MfaRequired,

    /// Authenticated, but the policy denies this category
    Forbidden(String),

    /// Internal error while evaluating access
    Internal(String),
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: ErrorInfo<'a>,
}

#[derive(Debug, Serialize)]
struct ErrorInfo<'a> {
    #[serde(rename = "type")]
    error_type: &'a str,
    code: &'a str,
    message: &'a str,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, error_type, code, message) = match &self {
            AuthError::Unauthenticated => (
                StatusCode::UNAUTHORIZED,
                "authentication_error",
                "unauthenticated",
                "Authentication required",
            ),
            AuthError::MfaRequired => (
                StatusCode::FORBIDDEN,
                "permission_error",
                "mfa_required",
                "Multi-factor authentication must be completed",
            ),
            AuthError::Forbidden(msg) => (
                StatusCode::FORBIDDEN,
                "permission_error",
                "forbidden",
                msg.as_str(),
            ),
            AuthError::Internal(msg) => {
                tracing::error!(error = %msg, "Internal error during access check");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "server_error",
                    "internal_error",
                    "Internal server error",
                )
            }
        };

        let body = ErrorBody {
            error: ErrorInfo {
                error_type,
                code,
                message,
            },
        };
        (status, Json(body)).into_response()
    }
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthError::Unauthenticated => write!(f, "Authentication required"),
            AuthError::MfaRequired => write!(f, "Multi-factor authentication required"),
            AuthError::Forbidden(msg) => write!(f, "Access forbidden: {}", msg),
            AuthError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for AuthError {}
