use axum::Json;
use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use tracing::{error, warn};

use crate::error::Error;

/// Failure of an HTTP request, rendered as `{"error": "..."}`
#[derive(Debug)]
pub enum ApiError {
    /// The path id is not a UUID
    InvalidId,
    /// No promotion with the requested id
    NotFound,
    /// The request itself could not be understood
    BadRequest(String),
    /// The multipart body was rejected while being read
    Upload { status: StatusCode, message: String },
    /// Loading an uploaded source failed
    Load(Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidId | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Upload { status, .. } => *status,
            ApiError::Load(e) if e.is_malformed() => StatusCode::BAD_REQUEST,
            ApiError::Load(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn message(&self) -> String {
        match self {
            ApiError::InvalidId => "Invalid promotion ID".to_string(),
            ApiError::NotFound => "Promotion not found".to_string(),
            ApiError::BadRequest(msg) => msg.clone(),
            ApiError::Upload { message, .. } => message.clone(),
            ApiError::Load(e) => e.to_string(),
        }
    }
}

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        ApiError::Load(e)
    }
}

impl From<MultipartError> for ApiError {
    fn from(e: MultipartError) -> Self {
        // keeps 413 for bodies over the configured limit
        ApiError::Upload {
            status: e.status(),
            message: format!("Invalid upload: {}", e.body_text()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.message();

        if status.is_server_error() {
            error!(%status, "{}", message);
        } else if let ApiError::Load(_) | ApiError::BadRequest(_) | ApiError::Upload { .. } = self {
            warn!(%status, "{}", message);
        }

        (status, Json(json!({ "error": message }))).into_response()
    }
}
