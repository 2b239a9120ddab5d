//! HTTP mapping of service errors. Bodies are always `{"error": "..."}`.

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use rb_core::error::AppError;
use std::fmt;

#[derive(Debug)]
pub struct ApiError(pub AppError);

impl ApiError {
    /// The message clients see. Internal details stay in the logs.
    fn public_message(&self) -> String {
        match &self.0 {
            AppError::NotFound(kind, _) => format!("{} not found", kind),
            AppError::ValidationError(msg)
            | AppError::Unauthorized(msg)
            | AppError::Conflict(msg) => msg.clone(),
            AppError::Internal(_) => "Internal server error".to_string(),
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl From<AppError> for ApiError {
    fn from(error: AppError) -> Self {
        ApiError(error)
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self.0 {
            AppError::NotFound(..) => StatusCode::NOT_FOUND,
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if let AppError::Internal(detail) = &self.0 {
            tracing::error!(%detail, "request failed");
        }
        HttpResponse::build(self.status_code())
            .json(serde_json::json!({ "error": self.public_message() }))
    }
}
