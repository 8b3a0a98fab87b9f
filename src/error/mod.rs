// Error types for framewatch
// Author: kelexine (https://github.com/kelexine)

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DetectorError {
    #[error("Rate limit exceeded. Please try again later.")]
    RateLimited,

    #[error("Gemini API key not configured: {0}")]
    Unconfigured(String),

    #[error("Gemini API error: {message}")]
    ExternalFailure {
        /// Upstream HTTP status, when the failure was an HTTP error response
        status: Option<u16>,
        message: String,
    },

    #[error("Could not parse JSON from Gemini response: {0}")]
    UnparseableResponse(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config parsing error: {0}")]
    ConfigParsing(#[from] config::ConfigError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl DetectorError {
    /// Short machine-readable kind, also used as a metrics label
    pub fn kind(&self) -> &'static str {
        match self {
            DetectorError::RateLimited => "rate_limited",
            DetectorError::Unconfigured(_) => "unconfigured",
            DetectorError::ExternalFailure { .. } => "external_failure",
            DetectorError::UnparseableResponse(_) => "unparseable_response",
            DetectorError::InvalidRequest(_) => "invalid_request",
            DetectorError::Config(_) | DetectorError::ConfigParsing(_) => "configuration_error",
            _ => "internal_error",
        }
    }

    /// HTTP status the transport layer reports for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            DetectorError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            DetectorError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            DetectorError::ExternalFailure { status: Some(code), .. } => {
                StatusCode::from_u16(*code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

// Convert DetectorError to HTTP responses for Axum
impl IntoResponse for DetectorError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let body = json!({
            "detail": self.to_string(),
            "error": self.kind(),
        });

        (status, axum::Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, DetectorError>;
