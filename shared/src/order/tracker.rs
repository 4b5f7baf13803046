//! Client-side status projection
//!
//! A disposable, never-authoritative view of order statuses built from a
//! pulled snapshot plus pushed events. Applying an event whose version is
//! already known is a no-op, so at-least-once delivery is safe.

use super::event::StatusChange;
use super::status::OrderStatus;
use super::types::Order;
use crate::message::DiningEvent;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Status of one tracked order
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct TrackedStatus {
    pub session_id: i64,
    pub status: OrderStatus,
    pub version: u32,
}

#[derive(Debug, Clone, Default)]
pub struct StatusTracker {
    orders: BTreeMap<i64, TrackedStatus>,
}

impl StatusTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed from a pulled snapshot
    pub fn from_orders<'a>(orders: impl IntoIterator<Item = &'a Order>) -> Self {
        let mut tracker = Self::new();
        for order in orders {
            tracker.observe(order);
        }
        tracker
    }

    /// Merge a pulled order. Older versions never overwrite newer ones.
    pub fn observe(&mut self, order: &Order) -> bool {
        self.merge(
            order.order_id,
            TrackedStatus {
                session_id: order.session_id,
                status: order.status,
                version: order.version,
            },
        )
    }

    /// Apply a pushed event, returns `true` if the projection changed
    pub fn apply(&mut self, event: &DiningEvent) -> bool {
        match event {
            DiningEvent::OrderPlaced { order } => self.observe(order),
            DiningEvent::OrderStatusChanged(change) => self.apply_change(change),
            DiningEvent::SessionFinished { .. } | DiningEvent::BillReady { .. } => false,
        }
    }

    pub fn apply_change(&mut self, change: &StatusChange) -> bool {
        self.merge(
            change.order_id,
            TrackedStatus {
                session_id: change.session_id,
                status: change.new_status,
                version: change.version,
            },
        )
    }

    fn merge(&mut self, order_id: i64, incoming: TrackedStatus) -> bool {
        match self.orders.get(&order_id) {
            Some(known) if known.version >= incoming.version => false,
            _ => {
                self.orders.insert(order_id, incoming);
                true
            }
        }
    }

    pub fn status(&self, order_id: i64) -> Option<OrderStatus> {
        self.orders.get(&order_id).map(|t| t.status)
    }

    pub fn get(&self, order_id: i64) -> Option<&TrackedStatus> {
        self.orders.get(&order_id)
    }

    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::ActorRole;

    fn change(order_id: i64, from: OrderStatus, to: OrderStatus, version: u32) -> DiningEvent {
        DiningEvent::OrderStatusChanged(StatusChange {
            order_id,
            order_number: Order::number_for(order_id),
            session_id: 7,
            table_number: "T4".into(),
            previous_status: from,
            new_status: to,
            version,
            actor: ActorRole::Kitchen,
            timestamp: 0,
        })
    }

    #[test]
    fn test_duplicate_event_is_noop() {
        let mut tracker = StatusTracker::new();
        let event = change(1, OrderStatus::Pending, OrderStatus::Confirmed, 2);

        assert!(tracker.apply(&event));
        assert!(!tracker.apply(&event));
        assert_eq!(tracker.status(1), Some(OrderStatus::Confirmed));
        assert_eq!(tracker.len(), 1);
    }

    #[test]
    fn test_stale_event_never_regresses() {
        let mut tracker = StatusTracker::new();
        tracker.apply(&change(1, OrderStatus::Confirmed, OrderStatus::Preparing, 3));
        assert!(!tracker.apply(&change(1, OrderStatus::Pending, OrderStatus::Confirmed, 2)));
        assert_eq!(tracker.status(1), Some(OrderStatus::Preparing));
    }

    #[test]
    fn test_session_events_leave_projection_alone() {
        let mut tracker = StatusTracker::new();
        tracker.apply(&change(1, OrderStatus::Pending, OrderStatus::Confirmed, 2));

        let finished = DiningEvent::SessionFinished {
            session: crate::session::Session {
                session_id: 7,
                table_number: "T4".into(),
                status: crate::session::SessionStatus::Finished,
                created_at: 0,
                finished_at: Some(1),
            },
        };
        assert!(!tracker.apply(&finished));
        assert_eq!(
            tracker.get(1),
            Some(&TrackedStatus {
                session_id: 7,
                status: OrderStatus::Confirmed,
                version: 2,
            })
        );
    }
}
