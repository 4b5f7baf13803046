//! Bill generation
//!
//! A bill is computed once per FINISHED session and stored as its serialized
//! bytes. The store only accepts the first bill for a session, so concurrent
//! or repeated generation converges on one document and every later read
//! returns the same bytes.

use rust_decimal::Decimal;
use shared::message::DiningEvent;
use shared::order::Order;
use shared::session::{Bill, BillLine, Session};
use shared::util::now_millis;

use crate::error::{DiningError, DiningResult};
use crate::message::StatusHub;
use crate::orders::money::{normalize_money, tax_for};
use crate::store::{CasOutcome, DynStore, StorageError};

#[derive(Debug, Clone)]
pub struct BillGenerator {
    store: DynStore,
    hub: StatusHub,
    tax_rate: Decimal,
}

impl BillGenerator {
    pub fn new(store: DynStore, hub: StatusHub, tax_rate: Decimal) -> Self {
        Self {
            store,
            hub,
            tax_rate,
        }
    }

    /// Generate (or return) the session's bill
    ///
    /// Requires the session to be FINISHED. Only the call that stores the
    /// bill publishes `BillReady`.
    pub async fn generate(&self, session_id: i64) -> DiningResult<Bill> {
        let bytes = self.generate_bytes(session_id).await?;
        decode_bill(&bytes)
    }

    /// Same as [`generate`](Self::generate), returning the stored bytes
    pub async fn generate_bytes(&self, session_id: i64) -> DiningResult<Vec<u8>> {
        if let Some(bytes) = self.store.get_bill(session_id).await? {
            return Ok(bytes);
        }

        let session = self
            .store
            .get_session(session_id)
            .await?
            .ok_or(DiningError::SessionNotFound(session_id))?;
        if session.is_active() {
            return Err(DiningError::SessionNotFinished(session_id));
        }

        let orders = self.store.list_session_orders(session_id).await?;
        let bill = compute_bill(&session, &orders, self.tax_rate);
        let bytes = serde_json::to_vec(&bill).map_err(StorageError::from)?;

        match self.store.insert_bill_if_absent(session_id, bytes).await? {
            CasOutcome::Applied(bytes) => {
                tracing::info!(
                    session_id,
                    table_number = %session.table_number,
                    orders = bill.orders.len(),
                    subtotal = %bill.subtotal,
                    tax = %bill.tax,
                    grand_total = %bill.grand_total,
                    "Bill generated"
                );
                self.hub.publish(DiningEvent::BillReady { session_id, bill });
                Ok(bytes)
            }
            CasOutcome::Rejected(existing) => {
                tracing::debug!(session_id, "Bill already generated, returning stored bill");
                Ok(existing)
            }
        }
    }

    /// Stored bill, without generating one
    pub async fn get(&self, session_id: i64) -> DiningResult<Option<Bill>> {
        match self.store.get_bill(session_id).await? {
            Some(bytes) => decode_bill(&bytes).map(Some),
            None => Ok(None),
        }
    }
}

/// Aggregate the session's non-cancelled orders into a bill
///
/// Deterministic for a given session and order list: `generated_at` is the
/// session's finish time, so racing generators build identical documents.
pub fn compute_bill(session: &Session, orders: &[Order], tax_rate: Decimal) -> Bill {
    let lines: Vec<BillLine> = orders
        .iter()
        .filter(|o| o.is_billable())
        .map(|o| BillLine {
            order_id: o.order_id,
            order_number: o.order_number.clone(),
            total_price: normalize_money(o.total_price),
        })
        .collect();

    let subtotal = normalize_money(lines.iter().map(|l| l.total_price).sum());
    let tax = tax_for(subtotal, tax_rate);
    let grand_total = normalize_money(subtotal + tax);

    Bill {
        session_id: session.session_id,
        table_number: session.table_number.clone(),
        orders: lines,
        subtotal,
        tax_rate,
        tax,
        grand_total,
        generated_at: session.finished_at.unwrap_or_else(now_millis),
    }
}

pub fn decode_bill(bytes: &[u8]) -> DiningResult<Bill> {
    Ok(serde_json::from_slice(bytes).map_err(StorageError::from)?)
}
