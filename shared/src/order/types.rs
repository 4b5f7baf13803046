//! Order records and request payloads

use super::status::OrderStatus;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// ============================================================================
// Enums
// ============================================================================

/// Payment method selected by the diner (recorded only, never captured)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    Cash,
    Card,
    #[default]
    Upi,
    Wallet,
}

/// Role of whoever requests a status change
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActorRole {
    #[default]
    Customer,
    Kitchen,
    Staff,
}

impl ActorRole {
    pub const fn as_str(self) -> &'static str {
        match self {
            ActorRole::Customer => "CUSTOMER",
            ActorRole::Kitchen => "KITCHEN",
            ActorRole::Staff => "STAFF",
        }
    }

    /// Parse a header value, case-insensitive
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "CUSTOMER" => Some(ActorRole::Customer),
            "KITCHEN" => Some(ActorRole::Kitchen),
            "STAFF" => Some(ActorRole::Staff),
            _ => None,
        }
    }
}

impl std::fmt::Display for ActorRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Order Records
// ============================================================================

/// Diner contact details captured with each order
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Customer {
    pub name: String,
    pub phone_number: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// Order line with the catalog price snapshotted at submission
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderItem {
    /// Catalog item ID
    pub item_id: String,
    /// Item name snapshot
    pub name: String,
    /// Unit price snapshot
    pub unit_price: Decimal,
    pub quantity: u32,
    /// unit_price × quantity
    pub line_total: Decimal,
    /// Per-line kitchen note
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// One submitted cart
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Order {
    pub order_id: i64,
    /// Human-readable number derived from `order_id`
    pub order_number: String,
    pub session_id: i64,
    pub table_number: String,
    pub customer: Customer,
    pub payment_method: PaymentMethod,
    pub status: OrderStatus,
    /// 1 at creation, incremented by every transition
    pub version: u32,
    pub items: Vec<OrderItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub special_instructions: Option<String>,
    /// Σ line_total at creation, never re-derived
    pub total_price: Decimal,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Order {
    /// `ORD-` followed by the upper-case base36 id
    pub fn number_for(order_id: i64) -> String {
        format!("ORD-{}", crate::util::to_base36(order_id))
    }

    /// Whether the order counts towards totals and bills
    pub fn is_billable(&self) -> bool {
        self.status != OrderStatus::Cancelled
    }

    pub fn status_label(&self) -> &'static str {
        self.status.label()
    }
}

// ============================================================================
// Requests
// ============================================================================

/// Cart line as submitted by the diner
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItemInput {
    pub item_id: String,
    pub quantity: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Order submission
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOrderRequest {
    #[serde(default)]
    pub table_number: String,
    #[serde(default)]
    pub customer_name: String,
    #[serde(default)]
    pub phone_number: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default)]
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub items: Vec<OrderItemInput>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub special_instructions: Option<String>,
}

/// Status change request
///
/// `expected_status` turns the update into an explicit compare-and-set
/// against the status the caller last observed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: OrderStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_status: Option<OrderStatus>,
}
