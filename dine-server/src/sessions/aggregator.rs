//! SessionAggregator - table sessions, running totals and the finish flow
//!
//! # Finish Flow
//!
//! ```text
//! finish_session(id)
//!     ├─ 1. CAS ACTIVE → FINISHED in the store (second caller: AlreadyFinished)
//!     ├─ 2. Publish SessionFinished
//!     ├─ 3. BillGenerator::generate (stores the bill once, publishes BillReady)
//!     └─ 4. Return the summary with the bill
//! ```

use rust_decimal::Decimal;
use shared::message::DiningEvent;
use shared::order::Order;
use shared::session::{Bill, Session, SessionSummary};
use shared::util::now_millis;

use crate::billing::BillGenerator;
use crate::error::{DiningError, DiningResult};
use crate::message::StatusHub;
use crate::orders::money::normalize_money;
use crate::store::{CasOutcome, DynStore};

#[derive(Debug, Clone)]
pub struct SessionAggregator {
    store: DynStore,
    hub: StatusHub,
    bills: BillGenerator,
}

impl SessionAggregator {
    pub fn new(store: DynStore, hub: StatusHub, bills: BillGenerator) -> Self {
        Self { store, hub, bills }
    }

    pub fn bills(&self) -> &BillGenerator {
        &self.bills
    }

    /// The table's ACTIVE session, opened if the table has none
    pub async fn resolve_active_session(&self, table_number: &str) -> DiningResult<Session> {
        let table_number = table_number.trim();
        if table_number.is_empty() {
            return Err(DiningError::validation(
                "table_number",
                "table_number must not be empty",
            ));
        }

        let resolved = self.store.resolve_active_session(table_number).await?;
        if resolved.created {
            tracing::info!(
                session_id = resolved.session.session_id,
                table_number = %table_number,
                "Session opened"
            );
        }
        Ok(resolved.session)
    }

    pub async fn get_session(&self, session_id: i64) -> DiningResult<Session> {
        self.store
            .get_session(session_id)
            .await?
            .ok_or(DiningError::SessionNotFound(session_id))
    }

    /// Orders of a session in the order they were placed
    pub async fn list_orders(&self, session_id: i64) -> DiningResult<Vec<Order>> {
        self.get_session(session_id).await?;
        Ok(self.store.list_session_orders(session_id).await?)
    }

    /// Σ total_price of the session's non-cancelled orders
    pub async fn running_total(&self, session_id: i64) -> DiningResult<Decimal> {
        let orders = self.list_orders(session_id).await?;
        Ok(running_total_of(&orders))
    }

    /// ACTIVE → FINISHED, then generate the bill
    ///
    /// A second call fails with `AlreadyFinished` and changes nothing.
    pub async fn finish_session(&self, session_id: i64) -> DiningResult<SessionSummary> {
        let session = match self.store.finish_session(session_id, now_millis()).await? {
            CasOutcome::Applied(session) => session,
            CasOutcome::Rejected(_) => return Err(DiningError::AlreadyFinished(session_id)),
        };

        tracing::info!(
            session_id,
            table_number = %session.table_number,
            "Session finished"
        );
        self.hub.publish(DiningEvent::SessionFinished {
            session: session.clone(),
        });

        let bill = self.bills.generate(session_id).await?;
        self.build_summary(session, Some(bill)).await
    }

    /// Finish the session, or return it unchanged if it is already finished
    ///
    /// Retries after a lost response land here; the bill is (re)generated
    /// idempotently so a finish whose bill step failed still converges.
    pub async fn finish_or_get(&self, session_id: i64) -> DiningResult<SessionSummary> {
        match self.finish_session(session_id).await {
            Err(DiningError::AlreadyFinished(_)) => {
                let session = self.get_session(session_id).await?;
                let bill = self.bills.generate(session_id).await?;
                self.build_summary(session, Some(bill)).await
            }
            other => other,
        }
    }

    /// Session, its orders, running total and bill (if generated)
    pub async fn summary(&self, session_id: i64) -> DiningResult<SessionSummary> {
        let session = self.get_session(session_id).await?;
        let bill = self.bills.get(session_id).await?;
        self.build_summary(session, bill).await
    }

    /// Summary of the table's ACTIVE session
    pub async fn active_summary(&self, table_number: &str) -> DiningResult<SessionSummary> {
        let table_number = table_number.trim();
        let session = self
            .store
            .active_session_for_table(table_number)
            .await?
            .ok_or_else(|| DiningError::NoActiveSession(table_number.to_string()))?;
        self.build_summary(session, None).await
    }

    /// The session's bill; generated on first request once FINISHED
    pub async fn bill(&self, session_id: i64) -> DiningResult<Bill> {
        self.bills.generate(session_id).await
    }

    async fn build_summary(
        &self,
        session: Session,
        bill: Option<Bill>,
    ) -> DiningResult<SessionSummary> {
        let orders = self.store.list_session_orders(session.session_id).await?;
        Ok(SessionSummary {
            running_total: running_total_of(&orders),
            session,
            orders,
            bill,
        })
    }
}

fn running_total_of(orders: &[Order]) -> Decimal {
    normalize_money(
        orders
            .iter()
            .filter(|o| o.is_billable())
            .map(|o| o.total_price)
            .sum(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{RedbStore, SessionStore};
    use shared::message::Topic;
    use shared::order::{Customer, OrderStatus, PaymentMethod};
    use shared::session::SessionStatus;
    use std::sync::Arc;

    fn aggregator() -> (SessionAggregator, DynStore, StatusHub) {
        let store: DynStore = Arc::new(RedbStore::open_in_memory().unwrap());
        let hub = StatusHub::new();
        let bills = BillGenerator::new(store.clone(), hub.clone(), Decimal::new(5, 2));
        (
            SessionAggregator::new(store.clone(), hub.clone(), bills),
            store,
            hub,
        )
    }

    async fn place(store: &DynStore, session: &Session, order_id: i64, total: i64) -> Order {
        let order = Order {
            order_id,
            order_number: Order::number_for(order_id),
            session_id: session.session_id,
            table_number: session.table_number.clone(),
            customer: Customer {
                name: "Ravi".into(),
                phone_number: "9000000002".into(),
                email: None,
            },
            payment_method: PaymentMethod::Cash,
            status: OrderStatus::Pending,
            version: 1,
            items: vec![],
            special_instructions: None,
            total_price: Decimal::from(total),
            created_at: 0,
            updated_at: 0,
        };
        assert!(store.insert_order(&order).await.unwrap().is_applied());
        order
    }

    #[tokio::test]
    async fn test_resolve_reuses_active_session() {
        let (sessions, _, _) = aggregator();
        let a = sessions.resolve_active_session("T4").await.unwrap();
        let b = sessions.resolve_active_session(" T4 ").await.unwrap();
        assert_eq!(a.session_id, b.session_id);

        let other = sessions.resolve_active_session("T5").await.unwrap();
        assert_ne!(a.session_id, other.session_id);

        assert!(matches!(
            sessions.resolve_active_session("  ").await,
            Err(DiningError::Validation { field: "table_number", .. })
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_resolve_returns_one_session() {
        let (sessions, _, _) = aggregator();
        let handles: Vec<_> = (0..16)
            .map(|_| {
                let sessions = sessions.clone();
                tokio::spawn(async move { sessions.resolve_active_session("T9").await.unwrap() })
            })
            .collect();

        let mut ids = Vec::new();
        for handle in handles {
            ids.push(handle.await.unwrap().session_id);
        }
        ids.dedup();
        assert_eq!(ids.len(), 1);
    }

    #[tokio::test]
    async fn test_running_total_skips_cancelled() {
        let (sessions, store, _) = aggregator();
        let session = sessions.resolve_active_session("T4").await.unwrap();
        place(&store, &session, 1, 250).await;
        let second = place(&store, &session, 2, 100).await;

        assert_eq!(
            sessions.running_total(session.session_id).await.unwrap().to_string(),
            "350.00"
        );

        let mut cancelled = second.clone();
        cancelled.status = OrderStatus::Cancelled;
        cancelled.version = 2;
        store
            .compare_and_swap_order(OrderStatus::Pending, 1, &cancelled)
            .await
            .unwrap();

        assert_eq!(
            sessions.running_total(session.session_id).await.unwrap().to_string(),
            "250.00"
        );
        let orders = sessions.list_orders(session.session_id).await.unwrap();
        assert_eq!(
            orders.iter().map(|o| o.order_id).collect::<Vec<_>>(),
            vec![1, 2]
        );
    }

    #[tokio::test]
    async fn test_unknown_session() {
        let (sessions, _, _) = aggregator();
        assert!(matches!(
            sessions.summary(77).await,
            Err(DiningError::SessionNotFound(77))
        ));
        assert!(matches!(
            sessions.list_orders(77).await,
            Err(DiningError::SessionNotFound(77))
        ));
        assert!(matches!(
            sessions.finish_session(77).await,
            Err(DiningError::SessionNotFound(77))
        ));
    }

    #[tokio::test]
    async fn test_finish_generates_bill_once() {
        let (sessions, store, hub) = aggregator();
        let session = sessions.resolve_active_session("T4").await.unwrap();
        place(&store, &session, 1, 600).await;
        place(&store, &session, 2, 400).await;
        let mut sub = hub.subscribe(Topic::Session(session.session_id));

        let summary = sessions.finish_session(session.session_id).await.unwrap();
        assert_eq!(summary.session.status, SessionStatus::Finished);
        let bill = summary.bill.clone().unwrap();
        assert_eq!(bill.tax.to_string(), "50.00");
        assert_eq!(bill.grand_total.to_string(), "1050.00");

        let first = sub.recv().await.unwrap();
        assert!(matches!(first.event, DiningEvent::SessionFinished { .. }));
        let second = sub.recv().await.unwrap();
        assert!(matches!(second.event, DiningEvent::BillReady { .. }));

        assert!(matches!(
            sessions.finish_session(session.session_id).await,
            Err(DiningError::AlreadyFinished(_))
        ));
        assert_eq!(sessions.bill(session.session_id).await.unwrap(), bill);

        // idempotent flavour returns the same summary
        let again = sessions.finish_or_get(session.session_id).await.unwrap();
        assert_eq!(again.bill, Some(bill));
        assert_eq!(again.session, summary.session);
    }

    #[tokio::test]
    async fn test_finish_opens_fresh_session_for_table() {
        let (sessions, _, _) = aggregator();
        let first = sessions.resolve_active_session("T4").await.unwrap();
        sessions.finish_session(first.session_id).await.unwrap();

        assert!(matches!(
            sessions.active_summary("T4").await,
            Err(DiningError::NoActiveSession(_))
        ));
        let next = sessions.resolve_active_session("T4").await.unwrap();
        assert_ne!(first.session_id, next.session_id);
        assert!(next.is_active());
    }

    #[tokio::test]
    async fn test_bill_before_finish() {
        let (sessions, _, _) = aggregator();
        let session = sessions.resolve_active_session("T4").await.unwrap();
        assert!(matches!(
            sessions.bill(session.session_id).await,
            Err(DiningError::SessionNotFinished(_))
        ));
        let summary = sessions.active_summary("T4").await.unwrap();
        assert_eq!(summary.session.session_id, session.session_id);
        assert!(summary.bill.is_none());
    }
}
