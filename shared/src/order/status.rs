//! Canonical order status state machine
//!
//! The kitchen pipeline is linear:
//!
//! ```text
//! PENDING -> CONFIRMED -> PREPARING -> ALMOST_DONE -> READY -> SERVED
//! ```
//!
//! Any non-terminal status may also move to `CANCELLED`. `SERVED` and
//! `CANCELLED` are terminal. Display labels are derived from the status and
//! never stored.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Order status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    #[default]
    Pending,
    Confirmed,
    Preparing,
    AlmostDone,
    Ready,
    Served,
    Cancelled,
}

impl OrderStatus {
    /// The linear kitchen pipeline, in order
    pub const PIPELINE: [OrderStatus; 6] = [
        OrderStatus::Pending,
        OrderStatus::Confirmed,
        OrderStatus::Preparing,
        OrderStatus::AlmostDone,
        OrderStatus::Ready,
        OrderStatus::Served,
    ];

    /// Single legal pipeline successor, if any
    pub const fn next(self) -> Option<OrderStatus> {
        match self {
            OrderStatus::Pending => Some(OrderStatus::Confirmed),
            OrderStatus::Confirmed => Some(OrderStatus::Preparing),
            OrderStatus::Preparing => Some(OrderStatus::AlmostDone),
            OrderStatus::AlmostDone => Some(OrderStatus::Ready),
            OrderStatus::Ready => Some(OrderStatus::Served),
            OrderStatus::Served | OrderStatus::Cancelled => None,
        }
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Served | OrderStatus::Cancelled)
    }

    /// Whether `self -> target` is a legal transition
    pub fn can_transition_to(self, target: OrderStatus) -> bool {
        if self.is_terminal() {
            return false;
        }
        target == OrderStatus::Cancelled || self.next() == Some(target)
    }

    /// 1-based position in the pipeline (`None` for `CANCELLED`)
    pub fn step(self) -> Option<u8> {
        Self::PIPELINE
            .iter()
            .position(|s| *s == self)
            .map(|i| i as u8 + 1)
    }

    /// Human-facing label for tracking pages and kitchen boards
    pub const fn label(self) -> &'static str {
        match self {
            OrderStatus::Pending => "Order Placed",
            OrderStatus::Confirmed => "Confirmed",
            OrderStatus::Preparing => "Preparing",
            OrderStatus::AlmostDone => "Almost Done",
            OrderStatus::Ready => "Ready to Serve",
            OrderStatus::Served => "Served",
            OrderStatus::Cancelled => "Cancelled",
        }
    }

    /// Wire name (`SCREAMING_SNAKE_CASE`)
    pub const fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::Confirmed => "CONFIRMED",
            OrderStatus::Preparing => "PREPARING",
            OrderStatus::AlmostDone => "ALMOST_DONE",
            OrderStatus::Ready => "READY",
            OrderStatus::Served => "SERVED",
            OrderStatus::Cancelled => "CANCELLED",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for an unrecognized status name
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown order status: {0}")]
pub struct UnknownStatus(pub String);

impl FromStr for OrderStatus {
    type Err = UnknownStatus;

    /// Case-insensitive; accepts `almost_done` and `almost-done`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase().replace('-', "_");
        match normalized.as_str() {
            "PENDING" => Ok(OrderStatus::Pending),
            "CONFIRMED" => Ok(OrderStatus::Confirmed),
            "PREPARING" => Ok(OrderStatus::Preparing),
            "ALMOST_DONE" => Ok(OrderStatus::AlmostDone),
            "READY" => Ok(OrderStatus::Ready),
            "SERVED" => Ok(OrderStatus::Served),
            "CANCELLED" => Ok(OrderStatus::Cancelled),
            _ => Err(UnknownStatus(s.to_string())),
        }
    }
}
