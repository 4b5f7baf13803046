//! Order domain types
//!
//! - Status: the canonical kitchen state machine
//! - Types: order records and request payloads
//! - Events: committed status changes
//! - Tracker: idempotent client-side projection

pub mod event;
pub mod status;
pub mod tracker;
pub mod types;

// Re-exports
pub use event::StatusChange;
pub use status::{OrderStatus, UnknownStatus};
pub use tracker::{StatusTracker, TrackedStatus};
pub use types::*;
