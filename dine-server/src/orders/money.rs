//! Money calculation and order input validation
//!
//! All amounts are `Decimal`, rounded to 2 decimal places half away from
//! zero. Nothing in this module touches floats.

use rust_decimal::prelude::*;
use shared::order::{CreateOrderRequest, OrderItem, OrderItemInput};

use crate::catalog::{CatalogError, CatalogItem};
use crate::error::{DiningError, DiningResult};

/// Rounding precision for monetary values
const DECIMAL_PLACES: u32 = 2;

/// Maximum allowed unit price (1,000,000)
const MAX_PRICE: Decimal = Decimal::from_parts(1_000_000, 0, 0, false, 0);
/// Maximum allowed quantity per line
pub const MAX_QUANTITY: i64 = 9999;
/// Maximum number of lines per order
pub const MAX_LINES: usize = 200;

/// Text limits
pub const MAX_NAME_LEN: usize = 200;
pub const MAX_NOTE_LEN: usize = 500;
pub const MAX_SHORT_TEXT_LEN: usize = 100;
pub const MAX_EMAIL_LEN: usize = 254;

/// Round to 2 decimal places, half away from zero
#[inline]
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
}

/// Round and pin the scale to 2 places so the rendering is stable
/// (`250` and `250.0` both become `"250.00"`).
#[inline]
pub fn normalize_money(value: Decimal) -> Decimal {
    let mut rounded = round_money(value);
    rounded.rescale(DECIMAL_PLACES);
    rounded
}

/// unit_price × quantity
pub fn line_total(unit_price: Decimal, quantity: u32) -> Decimal {
    normalize_money(unit_price * Decimal::from(quantity))
}

/// Σ line_total
pub fn order_total(items: &[OrderItem]) -> Decimal {
    normalize_money(items.iter().map(|i| i.line_total).sum())
}

/// subtotal × rate, rounded
pub fn tax_for(subtotal: Decimal, rate: Decimal) -> Decimal {
    normalize_money(subtotal * rate)
}

/// Build the order line from the catalog snapshot
pub fn price_line(input: &OrderItemInput, item: &CatalogItem) -> DiningResult<OrderItem> {
    if item.unit_price < Decimal::ZERO || item.unit_price > MAX_PRICE {
        tracing::warn!(item_id = %item.item_id, price = %item.unit_price, "Menu price out of range");
        return Err(CatalogError::InvalidPrice {
            item_id: item.item_id.clone(),
            price: item.unit_price.to_string(),
        }
        .into());
    }
    // validated upfront, 1..=MAX_QUANTITY
    let quantity = u32::try_from(input.quantity)
        .map_err(|_| DiningError::validation("quantity", "quantity out of range"))?;
    let unit_price = normalize_money(item.unit_price);

    Ok(OrderItem {
        item_id: item.item_id.clone(),
        name: item.name.clone(),
        unit_price,
        quantity,
        line_total: line_total(unit_price, quantity),
        note: input
            .note
            .as_ref()
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty()),
    })
}

// ── Validation ──────────────────────────────────────────────────────

fn validate_required_text(value: &str, field: &'static str, max_len: usize) -> DiningResult<()> {
    if value.trim().is_empty() {
        return Err(DiningError::validation(
            field,
            format!("{field} must not be empty"),
        ));
    }
    if value.len() > max_len {
        return Err(DiningError::validation(
            field,
            format!("{field} is too long ({} chars, max {max_len})", value.len()),
        ));
    }
    Ok(())
}

fn validate_optional_text(
    value: Option<&str>,
    field: &'static str,
    max_len: usize,
) -> DiningResult<()> {
    match value {
        Some(v) if v.len() > max_len => Err(DiningError::validation(
            field,
            format!("{field} is too long ({} chars, max {max_len})", v.len()),
        )),
        _ => Ok(()),
    }
}

/// Loose structural email check: one `@`, non-empty local part, dotted domain
pub fn is_valid_email(email: &str) -> bool {
    let email = email.trim();
    if email.len() > MAX_EMAIL_LEN || email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
}

/// Phone numbers: digits with optional leading `+`, spaces and dashes
pub fn is_valid_phone(phone: &str) -> bool {
    let phone = phone.trim();
    let digits = phone.chars().filter(char::is_ascii_digit).count();
    let allowed = phone
        .chars()
        .enumerate()
        .all(|(i, c)| c.is_ascii_digit() || c == ' ' || c == '-' || (i == 0 && c == '+'));
    allowed && (5..=20).contains(&digits)
}

/// Validate a cart line before catalog lookup
pub fn validate_item_input(item: &OrderItemInput) -> DiningResult<()> {
    validate_required_text(&item.item_id, "item_id", MAX_SHORT_TEXT_LEN)?;
    if item.quantity < 1 {
        return Err(DiningError::validation(
            "quantity",
            format!("quantity must be at least 1, got {}", item.quantity),
        ));
    }
    if item.quantity > MAX_QUANTITY {
        return Err(DiningError::validation(
            "quantity",
            format!(
                "quantity exceeds maximum allowed ({}), got {}",
                MAX_QUANTITY, item.quantity
            ),
        ));
    }
    validate_optional_text(item.note.as_deref(), "note", MAX_NOTE_LEN)
}

/// Validate an order submission
pub fn validate_request(req: &CreateOrderRequest) -> DiningResult<()> {
    if req.items.is_empty() {
        return Err(DiningError::EmptyOrder);
    }
    if req.items.len() > MAX_LINES {
        return Err(DiningError::validation(
            "items",
            format!("too many lines ({}, max {MAX_LINES})", req.items.len()),
        ));
    }
    validate_required_text(&req.table_number, "table_number", MAX_SHORT_TEXT_LEN)?;
    validate_required_text(&req.customer_name, "customer_name", MAX_NAME_LEN)?;
    validate_required_text(&req.phone_number, "phone_number", MAX_SHORT_TEXT_LEN)?;
    if !is_valid_phone(&req.phone_number) {
        return Err(DiningError::validation(
            "phone_number",
            "phone_number is not a valid phone number",
        ));
    }
    if let Some(email) = req.email.as_deref().map(str::trim).filter(|e| !e.is_empty()) {
        if !is_valid_email(email) {
            return Err(DiningError::validation("email", "email is malformed"));
        }
    }
    validate_optional_text(
        req.special_instructions.as_deref(),
        "special_instructions",
        MAX_NOTE_LEN,
    )?;
    for item in &req.items {
        validate_item_input(item)?;
    }
    Ok(())
}
