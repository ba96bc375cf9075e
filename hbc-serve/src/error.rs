//! Error types for hbc-serve
//!
//! Every error reaches the client as a flat JSON body: `{"error": "..."}`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Request has no `file` part, or is not multipart at all (400)
    #[error("No file uploaded")]
    NoFile,

    /// Upload could not be read, e.g. over the size limit (400)
    #[error("Failed to read upload: {0}")]
    Upload(String),

    /// Decoding, feature extraction or prediction failed (400)
    #[error("Failed to analyze audio: {0}")]
    Analysis(String),

    /// Temporary file could not be written (500)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NoFile | ApiError::Upload(_) | ApiError::Analysis(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Io(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
