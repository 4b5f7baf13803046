//! Dining session, bill and read-model types

use crate::order::Order;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Session status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionStatus {
    #[default]
    Active,
    Finished,
}

/// One dining occupancy of a table
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Session {
    pub session_id: i64,
    pub table_number: String,
    pub status: SessionStatus,
    pub created_at: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<i64>,
}

impl Session {
    pub fn is_active(&self) -> bool {
        self.status == SessionStatus::Active
    }
}

/// Order reference inside a bill
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BillLine {
    pub order_id: i64,
    pub order_number: String,
    pub total_price: Decimal,
}

/// Immutable aggregation of a finished session
///
/// Stored as its serialized bytes; every read returns the same bytes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Bill {
    pub session_id: i64,
    pub table_number: String,
    /// Billed (non-cancelled) orders in session order
    pub orders: Vec<BillLine>,
    pub subtotal: Decimal,
    pub tax_rate: Decimal,
    pub tax: Decimal,
    pub grand_total: Decimal,
    pub generated_at: i64,
}

/// Session with its orders, running total and bill (if generated)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionSummary {
    pub session: Session,
    pub orders: Vec<Order>,
    /// Σ total_price of non-cancelled orders, computed on read
    pub running_total: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bill: Option<Bill>,
}
