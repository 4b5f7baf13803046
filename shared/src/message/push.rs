//! Push channel protocol
//!
//! Server → Client: [`PushMessage`]
//! Client → Server: [`PushCommand`]

use serde::{Deserialize, Serialize};

use super::EventEnvelope;
use crate::order::Order;

/// Server → Client push message
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PushMessage {
    /// Subscription established, carries the pulled snapshot
    Ready {
        orders: Vec<Order>,
        /// Interval the client should poll at if the channel drops
        poll_interval_ms: u64,
    },
    /// One fan-out event
    Event(EventEnvelope),
    /// Events were missed, replace local state with this snapshot
    Resync { orders: Vec<Order> },
}

/// Client → Server command
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PushCommand {
    /// Ask for a fresh snapshot
    Resync,
}
