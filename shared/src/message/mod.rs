//! Status fan-out message types
//!
//! Shared by the server hub and push clients. Every event is wrapped in an
//! [`EventEnvelope`] carrying a hub-wide sequence number; per-order ordering
//! comes from the order `version` inside status changes.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::order::{Order, StatusChange};
use crate::session::{Bill, Session};

pub mod push;
pub use push::*;

/// Events published by the lifecycle engine
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiningEvent {
    /// New order accepted (version 1)
    OrderPlaced { order: Order },
    /// Committed status transition
    OrderStatusChanged(StatusChange),
    /// Session moved to FINISHED
    SessionFinished { session: Session },
    /// Bill generated for a finished session
    BillReady { session_id: i64, bill: Bill },
}

impl DiningEvent {
    pub fn session_id(&self) -> i64 {
        match self {
            DiningEvent::OrderPlaced { order } => order.session_id,
            DiningEvent::OrderStatusChanged(change) => change.session_id,
            DiningEvent::SessionFinished { session } => session.session_id,
            DiningEvent::BillReady { session_id, .. } => *session_id,
        }
    }

    pub fn order_id(&self) -> Option<i64> {
        match self {
            DiningEvent::OrderPlaced { order } => Some(order.order_id),
            DiningEvent::OrderStatusChanged(change) => Some(change.order_id),
            _ => None,
        }
    }

    /// `(order_id, version)` for order-scoped events
    pub fn order_version(&self) -> Option<(i64, u32)> {
        match self {
            DiningEvent::OrderPlaced { order } => Some((order.order_id, order.version)),
            DiningEvent::OrderStatusChanged(change) => Some((change.order_id, change.version)),
            _ => None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            DiningEvent::OrderPlaced { .. } => "order_placed",
            DiningEvent::OrderStatusChanged(_) => "order_status_changed",
            DiningEvent::SessionFinished { .. } => "session_finished",
            DiningEvent::BillReady { .. } => "bill_ready",
        }
    }
}

/// Hub envelope
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EventEnvelope {
    /// Hub-wide delivery sequence (not an ordering promise across orders)
    pub sequence: u64,
    pub event: DiningEvent,
}

/// What an observer is interested in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "scope", content = "id", rename_all = "snake_case")]
pub enum Topic {
    /// Every event of one session (diner tracking page)
    Session(i64),
    /// Events of one order
    Order(i64),
    /// Everything (kitchen board)
    All,
}

impl Topic {
    pub fn matches(&self, event: &DiningEvent) -> bool {
        match self {
            Topic::All => true,
            Topic::Session(id) => event.session_id() == *id,
            Topic::Order(id) => match event.order_id() {
                Some(order_id) => order_id == *id,
                None => false,
            },
        }
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Topic::Session(id) => write!(f, "session:{}", id),
            Topic::Order(id) => write!(f, "order:{}", id),
            Topic::All => write!(f, "all"),
        }
    }
}
