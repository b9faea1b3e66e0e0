//! Paygate API — error types and HTTP status mapping.
//!
//! The status code is the contract with the provider's retry machinery:
//! 4xx means "your request was wrong, fix it before retrying", 5xx means
//! "redeliver later", and 200 means "done, stop".

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use paygate_core::error::TransientFailure;
use paygate_gate::GateError;
use serde::Serialize;
use thiserror::Error;

/// Startup and runtime errors for the API server.
#[derive(Debug, Error)]
pub enum AppError {
    /// A required environment variable is missing or invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// Database connection or pool error.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Schema migration error.
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Network binding or I/O error.
    #[error("server error: {0}")]
    Server(#[from] std::io::Error),
}

/// JSON body returned for error responses.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Machine-readable error code.
    pub error: &'static str,
    /// Human-readable error message.
    pub message: String,
}

/// HTTP-layer wrapper around pipeline failures.
#[derive(Debug)]
pub enum ApiError {
    /// Rejected at the security gate; never persisted.
    Gate(GateError),
    /// The attempt could not be confirmed; the provider should redeliver.
    Transient(TransientFailure),
}

impl From<GateError> for ApiError {
    fn from(err: GateError) -> Self {
        Self::Gate(err)
    }
}

impl From<TransientFailure> for ApiError {
    fn from(err: TransientFailure) -> Self {
        Self::Transient(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message, retry_after) = match &self {
            Self::Gate(err @ GateError::RateLimited { retry_after }) => (
                StatusCode::TOO_MANY_REQUESTS,
                "rate_limited",
                err.to_string(),
                Some(retry_after.as_secs().max(1)),
            ),
            Self::Gate(err @ GateError::Signature(_)) => (
                StatusCode::UNAUTHORIZED,
                "invalid_signature",
                err.to_string(),
                None,
            ),
            Self::Gate(err @ GateError::Shape(_)) => (
                StatusCode::BAD_REQUEST,
                "malformed_event",
                err.to_string(),
                None,
            ),
            Self::Transient(err) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "transient_failure",
                err.to_string(),
                None,
            ),
        };

        let body = ErrorBody {
            error: error_code,
            message,
        };
        let mut response = (status, Json(body)).into_response();
        if let Some(seconds) = retry_after {
            if let Ok(value) = seconds.to_string().parse() {
                response.headers_mut().insert("retry-after", value);
            }
        }
        response
    }
}
