//! Status change facts published after a transition commits

use super::status::OrderStatus;
use super::types::ActorRole;
use serde::{Deserialize, Serialize};

/// One committed order transition
///
/// `version` is the order version after the transition. Observers use it to
/// order events for one order and to discard duplicates.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StatusChange {
    pub order_id: i64,
    pub order_number: String,
    pub session_id: i64,
    pub table_number: String,
    pub previous_status: OrderStatus,
    pub new_status: OrderStatus,
    pub version: u32,
    pub actor: ActorRole,
    /// Server timestamp (Unix milliseconds)
    pub timestamp: i64,
}

impl StatusChange {
    /// Label of the new status for display
    pub fn label(&self) -> &'static str {
        self.new_status.label()
    }
}
