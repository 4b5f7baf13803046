use super::*;
use crate::catalog::CatalogError;

#[tokio::test]
async fn test_create_order() {
    let h = create_harness();
    let order = h.orders.create(t4_request()).await.unwrap();

    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.version, 1);
    assert_eq!(order.table_number, "T4");
    assert_eq!(order.total_price.to_string(), "250.00");
    assert_eq!(order.items.len(), 2);
    assert_eq!(order.items[0].name, "Paneer Tikka");
    assert_eq!(order.items[0].line_total.to_string(), "200.00");
    assert_eq!(order.order_number, Order::number_for(order.order_id));
    assert_eq!(order.customer.email.as_deref(), Some("asha@example.com"));

    let stored = h.orders.get(order.order_id).await.unwrap();
    assert_eq!(stored, order);
}

#[tokio::test]
async fn test_orders_at_one_table_share_a_session() {
    let h = create_harness();
    let first = h.orders.create(t4_request()).await.unwrap();
    let second = h
        .orders
        .create(order_request("T4", vec![line("thali", 1)]))
        .await
        .unwrap();
    let elsewhere = h
        .orders
        .create(order_request("T7", vec![line("thali", 1)]))
        .await
        .unwrap();

    assert_eq!(first.session_id, second.session_id);
    assert_ne!(first.session_id, elsewhere.session_id);

    let summary = h.sessions.summary(first.session_id).await.unwrap();
    assert_eq!(
        summary.orders.iter().map(|o| o.order_id).collect::<Vec<_>>(),
        vec![first.order_id, second.order_id]
    );
    assert_eq!(summary.running_total.to_string(), "550.00");
}

#[tokio::test]
async fn test_create_rejects_invalid_requests() {
    let h = create_harness();

    let err = h.orders.create(order_request("T4", vec![])).await.unwrap_err();
    assert!(matches!(err, DiningError::EmptyOrder));

    let err = h
        .orders
        .create(order_request("T4", vec![line("tikka", 0)]))
        .await
        .unwrap_err();
    assert!(matches!(err, DiningError::Validation { field: "quantity", .. }));

    let err = h
        .orders
        .create(order_request("", vec![line("tikka", 1)]))
        .await
        .unwrap_err();
    assert!(matches!(err, DiningError::Validation { field: "table_number", .. }));

    let mut req = t4_request();
    req.email = Some("asha@".into());
    let err = h.orders.create(req).await.unwrap_err();
    assert!(matches!(err, DiningError::Validation { field: "email", .. }));

    // nothing was opened for the rejected submissions
    assert_eq!(h.store.stats().await.unwrap().sessions, 0);
}

#[tokio::test]
async fn test_create_rejects_unknown_and_unavailable_items() {
    let h = create_harness();

    let err = h
        .orders
        .create(order_request("T4", vec![line("tikka", 1), line("dosa", 1)]))
        .await
        .unwrap_err();
    assert!(matches!(err, DiningError::Catalog(CatalogError::NotFound(ref id)) if id == "dosa"));

    h.catalog.set_available("lassi", false);
    let err = h.orders.create(t4_request()).await.unwrap_err();
    assert!(matches!(err, DiningError::Catalog(CatalogError::Unavailable(_))));

    assert_eq!(h.store.stats().await.unwrap().orders, 0);
}

#[tokio::test]
async fn test_full_pipeline() {
    let h = create_harness();
    let order = h.orders.create(t4_request()).await.unwrap();

    let mut expected_version = 1;
    for target in OrderStatus::PIPELINE.iter().skip(1) {
        let updated = h
            .orders
            .transition(order.order_id, *target, ActorRole::Kitchen)
            .await
            .unwrap();
        expected_version += 1;
        assert_eq!(updated.status, *target);
        assert_eq!(updated.version, expected_version);
    }

    let served = h.orders.get(order.order_id).await.unwrap();
    assert_eq!(served.status, OrderStatus::Served);
    assert_eq!(served.version, 6);
}

#[tokio::test]
async fn test_skipping_a_stage_is_rejected() {
    let h = create_harness();
    let order = h.orders.create(t4_request()).await.unwrap();

    let err = h
        .orders
        .transition(order.order_id, OrderStatus::Ready, ActorRole::Kitchen)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        DiningError::InvalidTransition {
            from: OrderStatus::Pending,
            to: OrderStatus::Ready,
            ..
        }
    ));

    // unchanged
    let stored = h.orders.get(order.order_id).await.unwrap();
    assert_eq!(stored.status, OrderStatus::Pending);
    assert_eq!(stored.version, 1);
}

#[tokio::test]
async fn test_no_regression_and_terminal_states() {
    let h = create_harness();
    let order = h.orders.create(t4_request()).await.unwrap();
    advance_to(&h, order.order_id, OrderStatus::Preparing).await;

    let err = h
        .orders
        .transition(order.order_id, OrderStatus::Confirmed, ActorRole::Staff)
        .await
        .unwrap_err();
    assert!(matches!(err, DiningError::InvalidTransition { .. }));

    advance_to(&h, order.order_id, OrderStatus::Served).await;
    let err = h
        .orders
        .transition(order.order_id, OrderStatus::Cancelled, ActorRole::Staff)
        .await
        .unwrap_err();
    assert!(matches!(err, DiningError::InvalidTransition { .. }));
}

#[tokio::test]
async fn test_cancel_from_any_open_state() {
    let h = create_harness();
    for stop in [
        OrderStatus::Pending,
        OrderStatus::Confirmed,
        OrderStatus::AlmostDone,
        OrderStatus::Ready,
    ] {
        let order = h.orders.create(t4_request()).await.unwrap();
        advance_to(&h, order.order_id, stop).await;
        let cancelled = h
            .orders
            .transition(order.order_id, OrderStatus::Cancelled, ActorRole::Staff)
            .await
            .unwrap();
        assert_eq!(cancelled.status, OrderStatus::Cancelled);
    }

    let err = h
        .orders
        .transition(1, OrderStatus::Cancelled, ActorRole::Staff)
        .await
        .unwrap_err();
    assert!(matches!(err, DiningError::OrderNotFound(1)));
}

#[tokio::test]
async fn test_customer_permissions() {
    let h = create_harness();
    let order = h.orders.create(t4_request()).await.unwrap();

    let err = h
        .orders
        .transition(order.order_id, OrderStatus::Confirmed, ActorRole::Customer)
        .await
        .unwrap_err();
    assert!(matches!(err, DiningError::PermissionDenied(_)));

    let cancelled = h
        .orders
        .transition(order.order_id, OrderStatus::Cancelled, ActorRole::Customer)
        .await
        .unwrap();
    assert_eq!(cancelled.status, OrderStatus::Cancelled);

    let confirmed = h.orders.create(t4_request()).await.unwrap();
    advance_to(&h, confirmed.order_id, OrderStatus::Confirmed).await;
    let err = h
        .orders
        .transition(confirmed.order_id, OrderStatus::Cancelled, ActorRole::Customer)
        .await
        .unwrap_err();
    assert!(matches!(err, DiningError::PermissionDenied(_)));
}

#[tokio::test]
async fn test_transition_from_checks_expectation() {
    let h = create_harness();
    let order = h.orders.create(t4_request()).await.unwrap();
    advance_to(&h, order.order_id, OrderStatus::Confirmed).await;

    let err = h
        .orders
        .transition_from(
            order.order_id,
            OrderStatus::Pending,
            OrderStatus::Cancelled,
            ActorRole::Staff,
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        DiningError::Conflict {
            expected: Some(OrderStatus::Pending),
            current: OrderStatus::Confirmed,
            ..
        }
    ));

    let preparing = h
        .orders
        .transition_from(
            order.order_id,
            OrderStatus::Confirmed,
            OrderStatus::Preparing,
            ActorRole::Kitchen,
        )
        .await
        .unwrap();
    assert_eq!(preparing.status, OrderStatus::Preparing);
}

#[tokio::test]
async fn test_same_status_is_an_invalid_transition() {
    let h = create_harness();
    let order = h.orders.create(t4_request()).await.unwrap();
    h.orders
        .transition(order.order_id, OrderStatus::Confirmed, ActorRole::Kitchen)
        .await
        .unwrap();

    let err = h
        .orders
        .transition(order.order_id, OrderStatus::Confirmed, ActorRole::Kitchen)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        DiningError::InvalidTransition {
            from: OrderStatus::Confirmed,
            to: OrderStatus::Confirmed,
            ..
        }
    ));

    advance_to(&h, order.order_id, OrderStatus::Served).await;
    let err = h
        .orders
        .transition(order.order_id, OrderStatus::Served, ActorRole::Staff)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        DiningError::InvalidTransition {
            from: OrderStatus::Served,
            to: OrderStatus::Served,
            ..
        }
    ));

    let stored = h.orders.get(order.order_id).await.unwrap();
    assert_eq!(stored.version, 6);
}

#[tokio::test]
async fn test_list_open_orders() {
    let h = create_harness();
    let a = h.orders.create(t4_request()).await.unwrap();
    let b = h.orders.create(order_request("T5", vec![line("thali", 2)])).await.unwrap();
    let c = h.orders.create(order_request("T6", vec![line("lassi", 1)])).await.unwrap();

    advance_to(&h, b.order_id, OrderStatus::Confirmed).await;
    h.orders
        .transition(c.order_id, OrderStatus::Cancelled, ActorRole::Staff)
        .await
        .unwrap();

    let open = h.orders.list_open(None).await.unwrap();
    assert_eq!(
        open.iter().map(|o| o.order_id).collect::<Vec<_>>(),
        vec![a.order_id, b.order_id]
    );

    let confirmed = h.orders.list_open(Some(OrderStatus::Confirmed)).await.unwrap();
    assert_eq!(confirmed.len(), 1);
    assert_eq!(confirmed[0].order_id, b.order_id);
}

#[tokio::test]
async fn test_events_are_published_after_commit() {
    let h = create_harness();
    let mut sub = h.hub.subscribe(Topic::All);

    let order = h.orders.create(t4_request()).await.unwrap();
    h.orders
        .transition(order.order_id, OrderStatus::Confirmed, ActorRole::Kitchen)
        .await
        .unwrap();

    let placed = sub.recv().await.unwrap();
    assert!(matches!(placed.event, DiningEvent::OrderPlaced { .. }));

    let changed = sub.recv().await.unwrap();
    match changed.event {
        DiningEvent::OrderStatusChanged(change) => {
            assert_eq!(change.order_id, order.order_id);
            assert_eq!(change.session_id, order.session_id);
            assert_eq!(change.previous_status, OrderStatus::Pending);
            assert_eq!(change.new_status, OrderStatus::Confirmed);
            assert_eq!(change.version, 2);
            assert_eq!(change.actor, ActorRole::Kitchen);
            // the store already reflects the event
            let stored = h.orders.get(order.order_id).await.unwrap();
            assert_eq!(stored.version, change.version);
        }
        other => panic!("unexpected event {:?}", other),
    }
}

#[tokio::test]
async fn test_failed_transition_publishes_nothing() {
    let h = create_harness();
    let order = h.orders.create(t4_request()).await.unwrap();
    let published = h.hub.stats().published;

    let _ = h
        .orders
        .transition(order.order_id, OrderStatus::Served, ActorRole::Kitchen)
        .await;
    let _ = h
        .orders
        .transition(order.order_id, OrderStatus::Confirmed, ActorRole::Customer)
        .await;

    assert_eq!(h.hub.stats().published, published);
}
