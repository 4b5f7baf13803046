//! Shared types for the dining engine
//!
//! Wire and domain types used by the server and its clients: orders and the
//! status state machine, sessions and bills, fan-out events, the push
//! protocol, the unified error system and id/time utilities.

pub mod error;
pub mod message;
pub mod order;
pub mod session;
pub mod util;

// Re-exports
pub use axum::{Json, body};
pub use http;
pub use serde::{Deserialize, Serialize};

pub use error::{ApiResponse, AppError, AppResult, ErrorCode};
pub use message::{DiningEvent, EventEnvelope, PushMessage, Topic};
pub use order::{Order, OrderStatus, StatusTracker};
pub use session::{Bill, Session, SessionStatus, SessionSummary};
