//! Error to HTTP status mapping

use super::envelope::Envelope;
use crate::Error;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error as ThisError;

/// API error type
#[derive(Debug, ThisError)]
pub enum ApiError {
    /// Malformed identifier, body or header (400)
    #[error("{0}")]
    BadRequest(String),

    /// Handler-level missing resource (404)
    #[error("{0}")]
    NotFound(String),

    /// Error raised by an engine or the persistence layer
    #[error(transparent)]
    Service(#[from] Error),
}

/// Result type for API handlers
pub type ApiResult<T> = std::result::Result<Json<Envelope<T>>, ApiError>;

impl ApiError {
    /// Status, envelope code and details for this error
    pub fn parts(&self) -> (StatusCode, &'static str, Value) {
        match self {
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "4001", Value::Null),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "4004", Value::Null),
            ApiError::Service(err) => match err {
                Error::Validation(fields) => (
                    StatusCode::BAD_REQUEST,
                    "4001",
                    serde_json::to_value(fields).unwrap_or(Value::Null),
                ),
                Error::InvalidInput(_) => (StatusCode::BAD_REQUEST, "4001", Value::Null),
                Error::TemplateEmpty => (StatusCode::BAD_REQUEST, "TEMPLATE_EMPTY", Value::Null),
                Error::MissingTeacherForSubject(subject_id) => (
                    StatusCode::BAD_REQUEST,
                    "MISSING_TEACHER_FOR_SUBJECT",
                    json!({ "subject_id": subject_id }),
                ),
                Error::NotFound(_) => (StatusCode::NOT_FOUND, "4004", Value::Null),
                Error::ScheduleConflict { conflicts } => (
                    StatusCode::CONFLICT,
                    "SCHEDULE_CONFLICT",
                    json!({ "conflicts": conflicts }),
                ),
                Error::Conflict(_) => (StatusCode::CONFLICT, "4009", Value::Null),
                Error::AlreadyPublished => (StatusCode::CONFLICT, "ALREADY_PUBLISHED", Value::Null),
                Error::InvalidTransition(_) => (StatusCode::CONFLICT, "4009", Value::Null),
                Error::Timeout(_) => (StatusCode::GATEWAY_TIMEOUT, "6002", Value::Null),
                _ => (StatusCode::INTERNAL_SERVER_ERROR, "5001", Value::Null),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, details) = self.parts();

        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self, "request failed");
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        (status, Json(Envelope::failure(code, message, details))).into_response()
    }
}
