//! Error types for the Alma service

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Fault reported by the upstream client for a failed fetch
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UpstreamFault {
    #[error("Received 400 from the Alma API")]
    BadRequest,

    #[error("Received 500 from the Alma API")]
    ServerError,

    #[error("Received {status} from the Alma API: {reason}")]
    Status { status: u16, reason: String },

    #[error("Alma API request timed out")]
    Timeout,

    #[error("Alma API unreachable: {0}")]
    Transport(String),
}

impl UpstreamFault {
    /// Classify a non-success HTTP status
    pub fn from_status(status: StatusCode) -> Self {
        match status.as_u16() {
            400 => UpstreamFault::BadRequest,
            500 => UpstreamFault::ServerError,
            code => UpstreamFault::Status {
                status: code,
                reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
            },
        }
    }

    /// Status surfaced to our own caller
    pub fn status_code(&self) -> StatusCode {
        match self {
            UpstreamFault::BadRequest => StatusCode::BAD_REQUEST,
            UpstreamFault::ServerError => StatusCode::INTERNAL_SERVER_ERROR,
            UpstreamFault::Status { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            UpstreamFault::Timeout => StatusCode::GATEWAY_TIMEOUT,
            UpstreamFault::Transport(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Schema violation: {0}")]
    SchemaViolation(String),

    #[error("Malformed upstream response: {0}")]
    MalformedUpstream(String),

    #[error(transparent)]
    Upstream(#[from] UpstreamFault),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

/// Error response body
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub status: u16,
    pub error: String,
    pub message: String,
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::SchemaViolation(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::MalformedUpstream(_) => StatusCode::BAD_GATEWAY,
            AppError::Upstream(fault) => fault.status_code(),
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match &self {
            AppError::SchemaViolation(msg) => {
                tracing::warn!("Schema violation: {}", msg);
                "JSON received is not valid.".to_string()
            }
            AppError::BadRequest(msg) => {
                tracing::warn!("Bad request: {}", msg);
                msg.clone()
            }
            AppError::MalformedUpstream(msg) => {
                tracing::error!("Malformed upstream response: {}", msg);
                msg.clone()
            }
            AppError::Upstream(fault) => {
                tracing::error!("Upstream fault: {}", fault);
                fault.to_string()
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                "Internal server error".to_string()
            }
        };

        let body = Json(ErrorResponse {
            status: status.as_u16(),
            error: status.canonical_reason().unwrap_or("Error").to_string(),
            message,
        });

        (status, body).into_response()
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;
