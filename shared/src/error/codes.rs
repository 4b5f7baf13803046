//! Error codes for the dining engine
//!
//! Shared by the server, push clients and the frontend, grouped by range:
//! - 0xxx: Request validation
//! - 2xxx: Permission
//! - 4xxx: Order
//! - 6xxx: Catalog (menu item)
//! - 7xxx: Session
//! - 9xxx: System

use serde::{Deserialize, Serialize};
use std::fmt;

/// Wire error code, serialized as its u16 value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    /// Malformed or incomplete request field
    ValidationFailed = 2,

    /// Caller's role may not apply this change
    PermissionDenied = 2001,

    OrderNotFound = 4001,
    /// Order has no lines
    OrderEmpty = 4007,
    /// Requested status is not a legal successor
    OrderInvalidTransition = 4008,
    /// Order status changed concurrently
    OrderStatusConflict = 4009,

    /// Menu item id unknown
    ProductNotFound = 6001,
    /// Menu price outside the accepted range
    ProductInvalidPrice = 6002,
    /// Menu item is currently unavailable
    ProductUnavailable = 6003,

    SessionNotFound = 7001,
    SessionAlreadyFinished = 7002,
    /// Bill requested while the session is still active
    SessionNotFinished = 7003,
    /// No active session for the table
    TableNotActive = 7004,

    InternalError = 9001,
    DatabaseError = 9002,
    /// Catalog backend unreachable, retry later
    CatalogUnavailable = 9006,
}

impl ErrorCode {
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Default developer-facing message
    pub const fn message(&self) -> &'static str {
        match self {
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::PermissionDenied => "Permission denied",

            ErrorCode::OrderNotFound => "Order not found",
            ErrorCode::OrderEmpty => "Order is empty",
            ErrorCode::OrderInvalidTransition => "Order status transition is not allowed",
            ErrorCode::OrderStatusConflict => "Order status was changed concurrently",

            ErrorCode::ProductNotFound => "Menu item not found",
            ErrorCode::ProductInvalidPrice => "Menu item has invalid price",
            ErrorCode::ProductUnavailable => "Menu item is unavailable",

            ErrorCode::SessionNotFound => "Dining session not found",
            ErrorCode::SessionAlreadyFinished => "Dining session has already been finished",
            ErrorCode::SessionNotFinished => "Dining session is still active",
            ErrorCode::TableNotActive => "No active session for table",

            ErrorCode::InternalError => "Internal server error",
            ErrorCode::DatabaseError => "Database error",
            ErrorCode::CatalogUnavailable => "Menu catalog is unavailable",
        }
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// Error when converting from an invalid u16 to ErrorCode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        let code = match value {
            2 => ErrorCode::ValidationFailed,
            2001 => ErrorCode::PermissionDenied,
            4001 => ErrorCode::OrderNotFound,
            4007 => ErrorCode::OrderEmpty,
            4008 => ErrorCode::OrderInvalidTransition,
            4009 => ErrorCode::OrderStatusConflict,
            6001 => ErrorCode::ProductNotFound,
            6002 => ErrorCode::ProductInvalidPrice,
            6003 => ErrorCode::ProductUnavailable,
            7001 => ErrorCode::SessionNotFound,
            7002 => ErrorCode::SessionAlreadyFinished,
            7003 => ErrorCode::SessionNotFinished,
            7004 => ErrorCode::TableNotActive,
            9001 => ErrorCode::InternalError,
            9002 => ErrorCode::DatabaseError,
            9006 => ErrorCode::CatalogUnavailable,
            _ => return Err(InvalidErrorCode(value)),
        };
        Ok(code)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [ErrorCode; 16] = [
        ErrorCode::ValidationFailed,
        ErrorCode::PermissionDenied,
        ErrorCode::OrderNotFound,
        ErrorCode::OrderEmpty,
        ErrorCode::OrderInvalidTransition,
        ErrorCode::OrderStatusConflict,
        ErrorCode::ProductNotFound,
        ErrorCode::ProductInvalidPrice,
        ErrorCode::ProductUnavailable,
        ErrorCode::SessionNotFound,
        ErrorCode::SessionAlreadyFinished,
        ErrorCode::SessionNotFinished,
        ErrorCode::TableNotActive,
        ErrorCode::InternalError,
        ErrorCode::DatabaseError,
        ErrorCode::CatalogUnavailable,
    ];

    #[test]
    fn test_error_code_values() {
        assert_eq!(ErrorCode::ValidationFailed.code(), 2);
        assert_eq!(ErrorCode::PermissionDenied.code(), 2001);
        assert_eq!(ErrorCode::OrderEmpty.code(), 4007);
        assert_eq!(ErrorCode::OrderInvalidTransition.code(), 4008);
        assert_eq!(ErrorCode::OrderStatusConflict.code(), 4009);
        assert_eq!(ErrorCode::ProductInvalidPrice.code(), 6002);
        assert_eq!(ErrorCode::SessionAlreadyFinished.code(), 7002);
        assert_eq!(ErrorCode::CatalogUnavailable.code(), 9006);
    }

    #[test]
    fn test_try_from_covers_every_variant() {
        for code in ALL {
            assert_eq!(ErrorCode::try_from(code.code()), Ok(code));
        }
        assert_eq!(ErrorCode::try_from(0), Err(InvalidErrorCode(0)));
        assert_eq!(ErrorCode::try_from(9004), Err(InvalidErrorCode(9004)));
    }

    #[test]
    fn test_serialize_as_number() {
        let json = serde_json::to_string(&ErrorCode::OrderStatusConflict).unwrap();
        assert_eq!(json, "4009");

        let code: ErrorCode = serde_json::from_str("7002").unwrap();
        assert_eq!(code, ErrorCode::SessionAlreadyFinished);

        let result: Result<ErrorCode, _> = serde_json::from_str("999");
        assert!(result.is_err());
    }

    #[test]
    fn test_display_and_message() {
        assert_eq!(format!("{}", ErrorCode::OrderNotFound), "4001");
        assert_eq!(
            format!("{}", InvalidErrorCode(999)),
            "invalid error code: 999"
        );
        for code in ALL {
            assert!(!code.message().is_empty());
        }
    }
}
