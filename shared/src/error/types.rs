//! `AppError` and the error envelope returned by every failing endpoint

use super::category::ErrorCategory;
use super::codes::ErrorCode;
use http::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;

/// Structured details; keys are sorted so the envelope renders the same way every time
pub type ErrorDetails = BTreeMap<String, Value>;

/// Error surfaced to HTTP and push clients
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct AppError {
    pub code: ErrorCode,
    pub message: String,
    /// e.g. `order_id`, `current_status`, `field`
    pub details: Option<ErrorDetails>,
}

impl AppError {
    /// Error with the code's default message
    pub fn new(code: ErrorCode) -> Self {
        Self::with_message(code, code.message())
    }

    pub fn with_message(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.details
            .get_or_insert_with(BTreeMap::new)
            .insert(key.into(), value.into());
        self
    }

    pub fn http_status(&self) -> StatusCode {
        self.code.http_status()
    }

    pub fn permission_denied(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::PermissionDenied, msg)
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::InternalError, msg)
    }

    pub fn database(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::DatabaseError, msg)
    }
}

/// Error envelope: `{code, message, details?}`
///
/// Successful responses carry the resource itself, not an envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse {
    pub code: u16,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<ErrorDetails>,
}

impl From<&AppError> for ApiResponse {
    fn from(err: &AppError) -> Self {
        Self {
            code: err.code.code(),
            message: err.message.clone(),
            details: err.details.clone(),
        }
    }
}

impl From<AppError> for ApiResponse {
    fn from(err: AppError) -> Self {
        Self {
            code: err.code.code(),
            message: err.message,
            details: err.details,
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = self.http_status();
        if self.code.category() == ErrorCategory::System {
            tracing::error!(code = %self.code, message = %self.message, "System error");
        }
        (status, axum::Json(ApiResponse::from(self))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_message() {
        let err = AppError::new(ErrorCode::SessionNotFound);
        assert_eq!(err.message, "Dining session not found");
        assert!(err.details.is_none());
        assert_eq!(err.http_status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_details_accumulate() {
        let err = AppError::with_message(ErrorCode::ValidationFailed, "quantity must be at least 1")
            .with_detail("field", "quantity")
            .with_detail("value", 0);

        let details = err.details.unwrap();
        assert_eq!(details["field"], "quantity");
        assert_eq!(details["value"], 0);
    }

    #[test]
    fn test_envelope_shape() {
        let err = AppError::new(ErrorCode::OrderStatusConflict)
            .with_detail("order_id", 42)
            .with_detail("current_status", "READY");

        let json = serde_json::to_string(&ApiResponse::from(&err)).unwrap();
        assert_eq!(
            json,
            r#"{"code":4009,"message":"Order status was changed concurrently","details":{"current_status":"READY","order_id":42}}"#
        );

        let bare = serde_json::to_value(ApiResponse::from(AppError::internal("boom"))).unwrap();
        assert_eq!(bare["code"], 9001);
        assert!(bare.get("details").is_none());
    }

    #[test]
    fn test_system_errors_map_to_500() {
        assert_eq!(
            AppError::database("io").http_status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AppError::permission_denied("kitchen only").http_status(),
            StatusCode::FORBIDDEN
        );
    }
}
