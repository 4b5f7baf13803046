//! Lifecycle engine errors
//!
//! Every engine operation returns a typed [`DiningError`]; handlers convert
//! it into the shared [`AppError`] so the wire code is stable.

use shared::error::{AppError, ErrorCode};
use shared::order::OrderStatus;
use thiserror::Error;

use crate::catalog::CatalogError;
use crate::store::StorageError;

#[derive(Debug, Error)]
pub enum DiningError {
    /// Malformed or incomplete input
    #[error("Validation failed: {message}")]
    Validation {
        field: &'static str,
        message: String,
    },

    /// No lines submitted
    #[error("Order has no items")]
    EmptyOrder,

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// Target is not the legal successor of the current status
    #[error("Cannot move order {order_id} from {from} to {to}")]
    InvalidTransition {
        order_id: i64,
        from: OrderStatus,
        to: OrderStatus,
    },

    /// Lost a compare-and-set race, or the caller's view is stale
    #[error("Order {order_id} was modified concurrently (now {current})")]
    Conflict {
        order_id: i64,
        /// Status the caller acted on, if known
        expected: Option<OrderStatus>,
        current: OrderStatus,
    },

    #[error("Order not found: {0}")]
    OrderNotFound(i64),

    #[error("Session not found: {0}")]
    SessionNotFound(i64),

    #[error("No active session for table {0}")]
    NoActiveSession(String),

    #[error("Session already finished: {0}")]
    AlreadyFinished(i64),

    #[error("Session not finished: {0}")]
    SessionNotFinished(i64),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Storage error: {0}")]
    Storage(StorageError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl DiningError {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }

}

impl From<StorageError> for DiningError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::OrderNotFound(id) => DiningError::OrderNotFound(id),
            StorageError::SessionNotFound(id) => DiningError::SessionNotFound(id),
            other => DiningError::Storage(other),
        }
    }
}

impl From<DiningError> for AppError {
    fn from(err: DiningError) -> Self {
        match err {
            DiningError::Validation { field, message } => {
                AppError::with_message(ErrorCode::ValidationFailed, message)
                    .with_detail("field", field)
            }
            DiningError::EmptyOrder => AppError::new(ErrorCode::OrderEmpty),
            DiningError::Catalog(CatalogError::NotFound(id)) => {
                AppError::with_message(ErrorCode::ProductNotFound, format!("Menu item not found: {}", id))
                    .with_detail("item_id", id)
            }
            DiningError::Catalog(CatalogError::Unavailable(id)) => AppError::with_message(
                ErrorCode::ProductUnavailable,
                format!("Menu item unavailable: {}", id),
            )
            .with_detail("item_id", id),
            DiningError::Catalog(CatalogError::InvalidPrice { item_id, price }) => {
                AppError::with_message(
                    ErrorCode::ProductInvalidPrice,
                    format!("Menu item {} has invalid price", item_id),
                )
                .with_detail("item_id", item_id)
                .with_detail("price", price)
            }
            DiningError::Catalog(CatalogError::Backend(msg)) => {
                tracing::warn!(error = %msg, "Catalog backend error");
                AppError::new(ErrorCode::CatalogUnavailable)
            }
            DiningError::InvalidTransition { order_id, from, to } => AppError::with_message(
                ErrorCode::OrderInvalidTransition,
                format!("Cannot move order from {} to {}", from, to),
            )
            .with_detail("order_id", order_id)
            .with_detail("current_status", from.as_str())
            .with_detail("requested_status", to.as_str()),
            DiningError::Conflict {
                order_id,
                expected,
                current,
            } => {
                let app = AppError::new(ErrorCode::OrderStatusConflict)
                    .with_detail("order_id", order_id)
                    .with_detail("current_status", current.as_str());
                match expected {
                    Some(expected) => app.with_detail("expected_status", expected.as_str()),
                    None => app,
                }
            }
            DiningError::OrderNotFound(id) => {
                AppError::new(ErrorCode::OrderNotFound).with_detail("order_id", id)
            }
            DiningError::SessionNotFound(id) => {
                AppError::new(ErrorCode::SessionNotFound).with_detail("session_id", id)
            }
            DiningError::NoActiveSession(table) => {
                AppError::new(ErrorCode::TableNotActive).with_detail("table_number", table)
            }
            DiningError::AlreadyFinished(id) => {
                AppError::new(ErrorCode::SessionAlreadyFinished).with_detail("session_id", id)
            }
            DiningError::SessionNotFinished(id) => {
                AppError::new(ErrorCode::SessionNotFinished).with_detail("session_id", id)
            }
            DiningError::PermissionDenied(msg) => AppError::permission_denied(msg),
            DiningError::Storage(e) => {
                tracing::error!(error = %e, "Storage error occurred");
                AppError::database(e.to_string())
            }
            DiningError::Internal(msg) => AppError::internal(msg),
        }
    }
}

impl axum::response::IntoResponse for DiningError {
    fn into_response(self) -> axum::response::Response {
        AppError::from(self).into_response()
    }
}

pub type DiningResult<T> = Result<T, DiningError>;
