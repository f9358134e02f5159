/// Unified error handling module
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Error body returned by every failing endpoint
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Missing config")]
    ConfigMissing,
    #[error("Invalid config: {0}")]
    ConfigInvalid(String),
    #[error("Geocoding failed for location \"{query}\"")]
    Geocoding { query: String },
    #[error("{upstream} request failed: {source}")]
    Fetch {
        upstream: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("{upstream} returned an error: {detail}")]
    UpstreamStatus {
        upstream: &'static str,
        detail: String,
    },
    #[error("Derivation error: {0}")]
    Derivation(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// Errors the Freshness Cache is allowed to paper over with a stale payload.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ApiError::Fetch { .. } | ApiError::UpstreamStatus { .. } | ApiError::Derivation(_)
        )
    }

    /// Pipeline stage the error belongs to, for log context.
    pub fn stage(&self) -> &'static str {
        match self {
            ApiError::ConfigMissing | ApiError::ConfigInvalid(_) => "config",
            ApiError::Geocoding { .. } => "geocode",
            ApiError::Fetch { .. } | ApiError::UpstreamStatus { .. } => "fetch",
            ApiError::Derivation(_) => "derive",
            ApiError::Internal(_) => "internal",
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::Internal(format!("HTTP client error: {}", err))
    }
}

impl From<std::io::Error> for ApiError {
    fn from(err: std::io::Error) -> Self {
        ApiError::Internal(format!("I/O error: {}", err))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            error: self.to_string(),
        };
        (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
    }
}

/// Type alias for API results
pub type ApiResult<T> = Result<T, ApiError>;
