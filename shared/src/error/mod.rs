//! Error codes and the wire envelope shared by server and clients
//!
//! - [`ErrorCode`]: stable numeric codes
//! - [`ErrorCategory`]: code ranges
//! - [`AppError`]: code + message + details, renders as an HTTP response
//! - [`ApiResponse`]: `{code, message, details}` body of a failed request
//!
//! # Error Code Ranges
//!
//! - 0xxx: Request validation
//! - 2xxx: Permission errors
//! - 4xxx: Order errors
//! - 6xxx: Catalog errors
//! - 7xxx: Session errors
//! - 9xxx: System errors
//!
//! # Example
//!
//! ```
//! use shared::error::{AppError, ErrorCode, ApiResponse};
//!
//! let err = AppError::new(ErrorCode::OrderStatusConflict)
//!     .with_detail("current_status", "READY");
//!
//! let body = ApiResponse::from(&err);
//! assert_eq!(body.code, 4009);
//! ```

mod category;
mod codes;
mod http;
mod types;

pub use category::ErrorCategory;
pub use codes::{ErrorCode, InvalidErrorCode};
pub use types::{ApiResponse, AppError, AppResult, ErrorDetails};
