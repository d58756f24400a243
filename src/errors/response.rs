use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        rejection::JsonRejection,
    },
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use crate::errors::AppError;

impl AppError {
    /// HTTP status and stable machine-readable code for each variant.
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::UnknownUser => (StatusCode::UNAUTHORIZED, "unknown_user"),
            AppError::WrongPassword => (StatusCode::UNAUTHORIZED, "wrong_password"),
            AppError::TokensExhausted => (StatusCode::PAYMENT_REQUIRED, "tokens_exhausted"),
            AppError::InvalidInput(_) => (StatusCode::BAD_REQUEST, "invalid_input"),
            AppError::Upstream(_) => (StatusCode::BAD_GATEWAY, "upstream_failure"),
            AppError::UpstreamTimeout(_) => (StatusCode::GATEWAY_TIMEOUT, "upstream_timeout"),
            AppError::UnauthorizedAdmin => (StatusCode::FORBIDDEN, "unauthorized_admin"),
            AppError::DuplicateUsername(_) => (StatusCode::CONFLICT, "duplicate_username"),
            AppError::Storage(_) => (StatusCode::INTERNAL_SERVER_ERROR, "storage_failure"),
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        }
    }
}

// The IntoResponse trait implementation converts AppError into a well-formed HTTP response.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let message = match &self {
            // Storage and internal details stay in the logs
            AppError::Storage(e) => {
                tracing::error!("Storage error: {}", e);
                "Storage failure, please retry later".to_string()
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {}", e);
                "Internal server error".to_string()
            }
            AppError::Upstream(e) => {
                tracing::warn!("Upstream error: {}", e);
                self.to_string()
            }
            AppError::DuplicateUsername(_) => "Username already exists".to_string(),
            other => other.to_string(),
        };

        let body = Json(json!({
            "status": status.as_u16(),
            "code": code,
            "message": message,
        }));

        (status, body).into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::InvalidInput(rejection.body_text())
    }
}

impl From<MultipartRejection> for AppError {
    fn from(rejection: MultipartRejection) -> Self {
        AppError::InvalidInput(rejection.body_text())
    }
}

impl From<MultipartError> for AppError {
    fn from(err: MultipartError) -> Self {
        AppError::InvalidInput(format!("Failed to read multipart form: {}", err))
    }
}
