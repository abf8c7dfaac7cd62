//! HTTP Error Handling

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::application::{RegistryError, TtsError};

/// 统一错误响应格式
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub errno: i32,
    pub error: String,
    pub data: Option<()>,
}

impl ErrorResponse {
    pub fn new(errno: i32, error: impl Into<String>) -> Self {
        Self {
            errno,
            error: error.into(),
            data: None,
        }
    }
}

/// 错误码定义
pub mod errno {
    pub const BAD_REQUEST: i32 = 400;
    pub const NOT_FOUND: i32 = 404;
    pub const CONFLICT: i32 = 409;
    pub const INTERNAL_ERROR: i32 = 500;
    pub const SERVICE_UNAVAILABLE: i32 = 503;
}

/// API 错误
#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    BadRequest(String),
    Internal(String),
    Conflict(String),
    ServiceUnavailable(String),
}

impl ApiError {
    pub fn errno(&self) -> i32 {
        match self {
            ApiError::NotFound(_) => errno::NOT_FOUND,
            ApiError::BadRequest(_) => errno::BAD_REQUEST,
            ApiError::Internal(_) => errno::INTERNAL_ERROR,
            ApiError::Conflict(_) => errno::CONFLICT,
            ApiError::ServiceUnavailable(_) => errno::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let errno = self.errno();
        let msg = match self {
            ApiError::NotFound(msg) => {
                tracing::warn!(errno, error = %msg, "Resource not found");
                msg
            }
            ApiError::BadRequest(msg) => {
                tracing::warn!(errno, error = %msg, "Bad request");
                msg
            }
            ApiError::Conflict(msg) => {
                tracing::warn!(errno, error = %msg, "Resource conflict");
                msg
            }
            ApiError::Internal(msg) => {
                tracing::error!(errno, error = %msg, "Internal server error");
                msg
            }
            ApiError::ServiceUnavailable(msg) => {
                tracing::error!(errno, error = %msg, "Service unavailable");
                msg
            }
        };

        (StatusCode::OK, Json(ErrorResponse::new(errno, msg))).into_response()
    }
}

impl From<RegistryError> for ApiError {
    fn from(e: RegistryError) -> Self {
        match e {
            RegistryError::Validation { .. } => ApiError::BadRequest(e.to_string()),
            RegistryError::DuplicateName { .. } => ApiError::Conflict(e.to_string()),
            RegistryError::NotFound { .. } => ApiError::NotFound(e.to_string()),
            RegistryError::Storage { .. } | RegistryError::Interrupted { .. } => {
                ApiError::Internal(e.to_string())
            }
        }
    }
}

impl From<TtsError> for ApiError {
    fn from(e: TtsError) -> Self {
        ApiError::ServiceUnavailable(format!("TTS backend failed: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::Operation;

    #[test]
    fn test_registry_error_mapping() {
        let cases = [
            (
                RegistryError::validation(Operation::Register, "x", "bad"),
                errno::BAD_REQUEST,
            ),
            (
                RegistryError::duplicate(Operation::Register, "x"),
                errno::CONFLICT,
            ),
            (RegistryError::not_found(Operation::Get, "x"), errno::NOT_FOUND),
            (
                RegistryError::storage(
                    Operation::Delete,
                    Some("x".to_string()),
                    crate::application::StorageError::Serialization("boom".to_string()),
                ),
                errno::INTERNAL_ERROR,
            ),
            (
                RegistryError::Interrupted {
                    operation: Operation::Update,
                },
                errno::INTERNAL_ERROR,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(ApiError::from(err).errno(), expected);
        }
    }

    #[test]
    fn test_tts_error_is_service_unavailable() {
        let err = ApiError::from(TtsError::Timeout);
        assert_eq!(err.errno(), errno::SERVICE_UNAVAILABLE);
    }
}
