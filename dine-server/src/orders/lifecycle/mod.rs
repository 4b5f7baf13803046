//! OrderLifecycle - order submission and the status state machine
//!
//! # Submission Flow
//!
//! ```text
//! create(request)
//!     ├─ 1. Validate the request (money::validate_request)
//!     ├─ 2. Snapshot name/price of every line from the catalog
//!     ├─ 3. Resolve the table's ACTIVE session (opened if needed)
//!     ├─ 4. Insert the PENDING order (rejected if the session finished meanwhile,
//!     │     in which case steps 3-4 run once more; an id collision draws a new id)
//!     ├─ 5. Publish OrderPlaced
//!     └─ 6. Return the order
//! ```
//!
//! # Transition Flow
//!
//! ```text
//! transition(order_id, target, actor)
//!     ├─ 1. Load the order
//!     ├─ 2. Check legality (single successor, or CANCELLED from non-terminal)
//!     ├─ 3. Check the actor may apply it
//!     ├─ 4. Compare-and-set on (status, version) in the store
//!     ├─ 5. Publish StatusChange (after commit)
//!     └─ 6. Return the updated order
//! ```

use shared::message::DiningEvent;
use shared::order::{
    ActorRole, CreateOrderRequest, Customer, Order, OrderStatus, StatusChange,
};
use shared::util::{now_millis, snowflake_id};

use super::money;
use crate::catalog::DynCatalog;
use crate::error::{DiningError, DiningResult};
use crate::message::StatusHub;
use crate::sessions::SessionAggregator;
use crate::store::{CasOutcome, DynStore, StorageError};

/// Session resolution attempts per submission
const MAX_SESSION_ATTEMPTS: usize = 2;

/// Fresh order ids drawn after a collision
const MAX_ID_ATTEMPTS: usize = 4;

#[derive(Debug, Clone)]
pub struct OrderLifecycle {
    store: DynStore,
    catalog: DynCatalog,
    sessions: SessionAggregator,
    hub: StatusHub,
}

impl OrderLifecycle {
    pub fn new(
        store: DynStore,
        catalog: DynCatalog,
        sessions: SessionAggregator,
        hub: StatusHub,
    ) -> Self {
        Self {
            store,
            catalog,
            sessions,
            hub,
        }
    }

    // ========== Submission ==========

    /// Place a new order at the request's table
    pub async fn create(&self, req: CreateOrderRequest) -> DiningResult<Order> {
        money::validate_request(&req)?;

        let mut items = Vec::with_capacity(req.items.len());
        for input in &req.items {
            let item = self.catalog.resolve(input.item_id.trim()).await?;
            items.push(money::price_line(input, &item)?);
        }
        let total_price = money::order_total(&items);

        let table_number = req.table_number.trim().to_string();
        let customer = Customer {
            name: req.customer_name.trim().to_string(),
            phone_number: req.phone_number.trim().to_string(),
            email: req
                .email
                .as_deref()
                .map(str::trim)
                .filter(|e| !e.is_empty())
                .map(str::to_string),
        };
        let special_instructions = req
            .special_instructions
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        let mut order_id = snowflake_id();
        let mut session_attempts = 0;
        let mut id_attempts = 0;

        loop {
            let session = self.sessions.resolve_active_session(&table_number).await?;
            let now = now_millis();
            let order = Order {
                order_id,
                order_number: Order::number_for(order_id),
                session_id: session.session_id,
                table_number: table_number.clone(),
                customer: customer.clone(),
                payment_method: req.payment_method,
                status: OrderStatus::Pending,
                version: 1,
                items: items.clone(),
                special_instructions: special_instructions.clone(),
                total_price,
                created_at: now,
                updated_at: now,
            };

            match self.store.insert_order(&order).await {
                Ok(CasOutcome::Applied(_)) => {
                    tracing::info!(
                        order_id,
                        order_number = %order.order_number,
                        session_id = order.session_id,
                        table_number = %order.table_number,
                        items = order.items.len(),
                        total_price = %order.total_price,
                        "Order placed"
                    );
                    self.hub.publish(DiningEvent::OrderPlaced {
                        order: order.clone(),
                    });
                    return Ok(order);
                }
                Ok(CasOutcome::Rejected(session)) => {
                    session_attempts += 1;
                    if session_attempts >= MAX_SESSION_ATTEMPTS {
                        return Err(DiningError::AlreadyFinished(session.session_id));
                    }
                    tracing::warn!(
                        session_id = session.session_id,
                        table_number = %table_number,
                        attempt = session_attempts,
                        "Session finished during submission, resolving again"
                    );
                }
                Err(StorageError::OrderIdTaken(taken)) if id_attempts < MAX_ID_ATTEMPTS => {
                    id_attempts += 1;
                    tracing::warn!(order_id = taken, "Order id collision, drawing a new id");
                    order_id = snowflake_id();
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    // ========== Transitions ==========

    /// Move the order to `target`
    pub async fn transition(
        &self,
        order_id: i64,
        target: OrderStatus,
        actor: ActorRole,
    ) -> DiningResult<Order> {
        let current = self.get(order_id).await?;
        self.apply_transition(current, target, actor).await
    }

    /// Move the order to `target` only if it is still in `expected`
    pub async fn transition_from(
        &self,
        order_id: i64,
        expected: OrderStatus,
        target: OrderStatus,
        actor: ActorRole,
    ) -> DiningResult<Order> {
        let current = self.get(order_id).await?;
        if current.status != expected {
            return Err(DiningError::Conflict {
                order_id,
                expected: Some(expected),
                current: current.status,
            });
        }
        self.apply_transition(current, target, actor).await
    }

    async fn apply_transition(
        &self,
        current: Order,
        target: OrderStatus,
        actor: ActorRole,
    ) -> DiningResult<Order> {
        let order_id = current.order_id;
        let from = current.status;

        if !from.can_transition_to(target) {
            return Err(DiningError::InvalidTransition {
                order_id,
                from,
                to: target,
            });
        }
        check_permission(actor, from, target)?;

        let mut next = current.clone();
        next.status = target;
        next.version = current.version + 1;
        next.updated_at = now_millis();

        let updated = match self
            .store
            .compare_and_swap_order(from, current.version, &next)
            .await?
        {
            CasOutcome::Applied(order) => order,
            CasOutcome::Rejected(latest) => {
                tracing::debug!(
                    order_id,
                    expected = %from,
                    current = %latest.status,
                    "Status compare-and-set lost"
                );
                return Err(DiningError::Conflict {
                    order_id,
                    expected: Some(from),
                    current: latest.status,
                });
            }
        };

        tracing::info!(
            order_id,
            session_id = updated.session_id,
            from = %from,
            to = %target,
            version = updated.version,
            actor = %actor,
            "Order status changed"
        );
        self.hub
            .publish(DiningEvent::OrderStatusChanged(StatusChange {
                order_id,
                order_number: updated.order_number.clone(),
                session_id: updated.session_id,
                table_number: updated.table_number.clone(),
                previous_status: from,
                new_status: target,
                version: updated.version,
                actor,
                timestamp: updated.updated_at,
            }));

        Ok(updated)
    }

    // ========== Queries ==========

    pub async fn get(&self, order_id: i64) -> DiningResult<Order> {
        self.store
            .get_order(order_id)
            .await?
            .ok_or(DiningError::OrderNotFound(order_id))
    }

    /// Non-terminal orders, oldest first (kitchen board)
    pub async fn list_open(&self, status: Option<OrderStatus>) -> DiningResult<Vec<Order>> {
        let mut orders = self.store.list_open_orders().await?;
        if let Some(status) = status {
            orders.retain(|o| o.status == status);
        }
        Ok(orders)
    }
}

/// Kitchen and staff drive the pipeline; a diner may only withdraw an order
/// the kitchen has not confirmed yet.
fn check_permission(actor: ActorRole, from: OrderStatus, target: OrderStatus) -> DiningResult<()> {
    match actor {
        ActorRole::Kitchen | ActorRole::Staff => Ok(()),
        ActorRole::Customer => {
            if target == OrderStatus::Cancelled && from == OrderStatus::Pending {
                Ok(())
            } else {
                Err(DiningError::PermissionDenied(format!(
                    "customers may only cancel a pending order (order is {})",
                    from
                )))
            }
        }
    }
}

#[cfg(test)]
mod tests;
