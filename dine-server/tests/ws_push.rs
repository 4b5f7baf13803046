//! Push channel tests over a real listener

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use dine_server::api::build_app;
use dine_server::catalog::{CatalogItem, StaticCatalog};
use dine_server::{Config, ServerState};
use futures::{SinkExt, StreamExt};
use rust_decimal::Decimal;
use serde_json::json;
use shared::message::{DiningEvent, PushMessage};
use shared::order::{ActorRole, Order, OrderStatus, StatusTracker};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

async fn serve() -> (SocketAddr, ServerState) {
    let catalog = StaticCatalog::from_items([CatalogItem {
        item_id: "tikka".into(),
        name: "Paneer Tikka".into(),
        unit_price: Decimal::from(100),
        available: true,
    }]);
    let config = Config::from_lookup(|_| None).unwrap();
    let state = ServerState::in_memory(config, Arc::new(catalog)).unwrap();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = build_app(state.clone());
    tokio::spawn(async move { axum::serve(listener, app).await });
    (addr, state)
}

async fn place_order(state: &ServerState, table: &str) -> Order {
    let req = serde_json::from_value(json!({
        "table_number": table,
        "customer_name": "Asha",
        "phone_number": "9000000001",
        "items": [{ "item_id": "tikka", "quantity": 1 }]
    }))
    .unwrap();
    state.orders.create(req).await.unwrap()
}

async fn connect(addr: SocketAddr, query: &str) -> Client {
    let (ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}/api/ws?{query}"))
        .await
        .unwrap();
    ws
}

/// Next push frame, skipping control frames
async fn next_push(ws: &mut Client) -> PushMessage {
    loop {
        let frame = timeout(Duration::from_secs(2), ws.next())
            .await
            .expect("timed out waiting for a push frame")
            .expect("connection ended")
            .expect("websocket error");
        match frame {
            Message::Text(text) => return serde_json::from_str(text.as_str()).unwrap(),
            Message::Ping(_) | Message::Pong(_) => continue,
            other => panic!("unexpected frame: {other:?}"),
        }
    }
}

#[tokio::test]
async fn test_ready_then_forwarded_transition() {
    let (addr, state) = serve().await;
    let order = place_order(&state, "T4").await;
    let mut ws = connect(addr, &format!("session_id={}", order.session_id)).await;

    let mut tracker = match next_push(&mut ws).await {
        PushMessage::Ready {
            orders,
            poll_interval_ms,
        } => {
            assert_eq!(poll_interval_ms, 5000);
            assert_eq!(orders.len(), 1);
            assert_eq!(orders[0].order_id, order.order_id);
            assert_eq!(orders[0].status, OrderStatus::Pending);
            StatusTracker::from_orders(&orders)
        }
        other => panic!("expected ready, got {other:?}"),
    };

    state
        .orders
        .transition(order.order_id, OrderStatus::Confirmed, ActorRole::Kitchen)
        .await
        .unwrap();

    match next_push(&mut ws).await {
        PushMessage::Event(envelope) => {
            match &envelope.event {
                DiningEvent::OrderStatusChanged(change) => {
                    assert_eq!(change.order_id, order.order_id);
                    assert_eq!(change.previous_status, OrderStatus::Pending);
                    assert_eq!(change.new_status, OrderStatus::Confirmed);
                    assert_eq!(change.version, order.version + 1);
                }
                other => panic!("expected status change, got {other:?}"),
            }
            assert!(tracker.apply(&envelope.event));
            // redelivery is absorbed by the client projection
            assert!(!tracker.apply(&envelope.event));
        }
        other => panic!("expected event, got {other:?}"),
    }
    assert_eq!(tracker.status(order.order_id), Some(OrderStatus::Confirmed));
}

#[tokio::test]
async fn test_other_tables_are_not_forwarded() {
    let (addr, state) = serve().await;
    let mine = place_order(&state, "T1").await;
    let other = place_order(&state, "T2").await;
    let mut ws = connect(addr, &format!("order_id={}", mine.order_id)).await;
    assert!(matches!(next_push(&mut ws).await, PushMessage::Ready { .. }));

    state
        .orders
        .transition(other.order_id, OrderStatus::Cancelled, ActorRole::Customer)
        .await
        .unwrap();
    state
        .orders
        .transition(mine.order_id, OrderStatus::Confirmed, ActorRole::Kitchen)
        .await
        .unwrap();

    match next_push(&mut ws).await {
        PushMessage::Event(envelope) => assert_eq!(envelope.event.order_id(), Some(mine.order_id)),
        other => panic!("expected event, got {other:?}"),
    }
}

#[tokio::test]
async fn test_resync_command_returns_snapshot() {
    let (addr, state) = serve().await;
    let order = place_order(&state, "T4").await;
    let mut ws = connect(addr, "kitchen=true").await;
    assert!(matches!(next_push(&mut ws).await, PushMessage::Ready { .. }));

    ws.send(Message::Text(r#"{"type":"resync"}"#.into()))
        .await
        .unwrap();

    match next_push(&mut ws).await {
        PushMessage::Resync { orders } => {
            assert_eq!(orders.len(), 1);
            assert_eq!(orders[0].order_id, order.order_id);
        }
        other => panic!("expected resync, got {other:?}"),
    }
}

#[tokio::test]
async fn test_unknown_session_is_refused_before_upgrade() {
    let (addr, _state) = serve().await;
    let err = tokio_tungstenite::connect_async(format!("ws://{addr}/api/ws?session_id=424242"))
        .await
        .unwrap_err();
    match err {
        tungstenite::Error::Http(response) => {
            assert_eq!(response.status(), http::StatusCode::NOT_FOUND)
        }
        other => panic!("expected http error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_hub_shutdown_closes_the_channel() {
    let (addr, state) = serve().await;
    let order = place_order(&state, "T4").await;
    let mut ws = connect(addr, &format!("session_id={}", order.session_id)).await;
    assert!(matches!(next_push(&mut ws).await, PushMessage::Ready { .. }));

    state.hub.shutdown();

    let frame = timeout(Duration::from_secs(2), ws.next())
        .await
        .expect("timed out waiting for close");
    assert!(matches!(frame, Some(Ok(Message::Close(_))) | None));
}
