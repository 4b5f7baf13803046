//! HTTP status code mapping for error codes

use super::codes::ErrorCode;
use http::StatusCode;

impl ErrorCode {
    /// Get the appropriate HTTP status code for this error code
    pub fn http_status(&self) -> StatusCode {
        match self {
            Self::OrderNotFound
            | Self::ProductNotFound
            | Self::SessionNotFound
            | Self::TableNotActive => StatusCode::NOT_FOUND,

            Self::OrderStatusConflict
            | Self::SessionAlreadyFinished
            | Self::SessionNotFinished => StatusCode::CONFLICT,

            // the request is well formed but cannot be applied
            Self::OrderInvalidTransition | Self::ProductInvalidPrice => {
                StatusCode::UNPROCESSABLE_ENTITY
            }

            Self::PermissionDenied => StatusCode::FORBIDDEN,

            // transient, the client may retry
            Self::CatalogUnavailable => StatusCode::SERVICE_UNAVAILABLE,

            Self::InternalError | Self::DatabaseError => StatusCode::INTERNAL_SERVER_ERROR,

            Self::ValidationFailed | Self::OrderEmpty | Self::ProductUnavailable => {
                StatusCode::BAD_REQUEST
            }
        }
    }
}
