use super::*;
use crate::billing::BillGenerator;
use crate::catalog::{CatalogItem, StaticCatalog};
use crate::store::RedbStore;
use rust_decimal::Decimal;
use shared::message::Topic;
use shared::order::{OrderItemInput, PaymentMethod};
use std::sync::Arc;

struct Harness {
    orders: OrderLifecycle,
    sessions: SessionAggregator,
    catalog: StaticCatalog,
    hub: StatusHub,
    store: DynStore,
}

fn menu_item(item_id: &str, name: &str, price: i64) -> CatalogItem {
    CatalogItem {
        item_id: item_id.to_string(),
        name: name.to_string(),
        unit_price: Decimal::from(price),
        available: true,
    }
}

fn create_harness() -> Harness {
    let store: DynStore = Arc::new(RedbStore::open_in_memory().unwrap());
    let catalog = StaticCatalog::from_items([
        menu_item("tikka", "Paneer Tikka", 100),
        menu_item("lassi", "Mango Lassi", 50),
        menu_item("thali", "Veg Thali", 300),
    ]);
    let hub = StatusHub::new();
    let bills = BillGenerator::new(store.clone(), hub.clone(), Decimal::new(5, 2));
    let sessions = SessionAggregator::new(store.clone(), hub.clone(), bills);
    let orders = OrderLifecycle::new(
        store.clone(),
        Arc::new(catalog.clone()),
        sessions.clone(),
        hub.clone(),
    );
    Harness {
        orders,
        sessions,
        catalog,
        hub,
        store,
    }
}

fn line(item_id: &str, quantity: i64) -> OrderItemInput {
    OrderItemInput {
        item_id: item_id.to_string(),
        quantity,
        note: None,
    }
}

fn order_request(table: &str, items: Vec<OrderItemInput>) -> CreateOrderRequest {
    CreateOrderRequest {
        table_number: table.to_string(),
        customer_name: "Asha".to_string(),
        phone_number: "9000000001".to_string(),
        email: Some("asha@example.com".to_string()),
        payment_method: PaymentMethod::Upi,
        items,
        special_instructions: None,
    }
}

/// 2 × tikka + 1 × lassi = 250.00
fn t4_request() -> CreateOrderRequest {
    order_request("T4", vec![line("tikka", 2), line("lassi", 1)])
}

async fn advance_to(h: &Harness, order_id: i64, target: OrderStatus) -> Order {
    let mut order = h.orders.get(order_id).await.unwrap();
    while order.status != target {
        let next = order.status.next().expect("target not reachable");
        order = h
            .orders
            .transition(order_id, next, ActorRole::Kitchen)
            .await
            .unwrap();
    }
    order
}

mod test_core;
