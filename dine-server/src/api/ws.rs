//! Push WebSocket endpoint: 实时订单状态推送
//!
//! GET /api/ws?session_id=<id> | ?order_id=<id> | ?kitchen=true
//!
//! 协议:
//! - Server → Client: PushMessage (Ready, Event, Resync)
//! - Client → Server: PushCommand (Resync)
//!
//! 连接时先订阅再拉取快照，快照之后到达的事件不会丢；客户端用
//! `StatusTracker` 按 version 去重。连接断开时客户端按 `poll_interval_ms`
//! 轮询 GET 接口。

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use shared::message::{PushCommand, PushMessage, Topic};
use shared::order::Order;
use tokio::time::Duration;

use crate::core::ServerState;
use crate::error::{DiningError, DiningResult};
use crate::message::SubscriptionError;

/// Ping interval
const PING_INTERVAL: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
pub struct WsQuery {
    session_id: Option<i64>,
    order_id: Option<i64>,
    #[serde(default)]
    kitchen: bool,
}

impl WsQuery {
    fn topic(&self) -> DiningResult<Topic> {
        match (self.order_id, self.session_id, self.kitchen) {
            (Some(order_id), _, _) => Ok(Topic::Order(order_id)),
            (None, Some(session_id), _) => Ok(Topic::Session(session_id)),
            (None, None, true) => Ok(Topic::All),
            (None, None, false) => Err(DiningError::validation(
                "topic",
                "one of session_id, order_id or kitchen=true is required",
            )),
        }
    }
}

/// GET /api/ws
pub async fn handle_ws(
    State(state): State<ServerState>,
    Query(query): Query<WsQuery>,
    ws: WebSocketUpgrade,
) -> DiningResult<impl IntoResponse> {
    let topic = query.topic()?;
    // 404 before upgrading
    snapshot(&state, topic).await?;

    Ok(ws.on_upgrade(move |socket| push_session(socket, state, topic)))
}

async fn push_session(socket: WebSocket, state: ServerState, topic: Topic) {
    let (mut sink, mut stream) = socket.split();
    let mut subscription = state.hub.subscribe(topic);
    let shutdown = state.hub.shutdown_token().clone();

    tracing::info!(topic = %topic, subscription_id = subscription.id(), "Push client connected");

    let ready = match snapshot(&state, topic).await {
        Ok(orders) => PushMessage::Ready {
            orders,
            poll_interval_ms: state.config.poll_interval_ms,
        },
        Err(e) => {
            tracing::warn!(topic = %topic, error = %e, "Initial snapshot failed");
            return;
        }
    };
    if send_message(&mut sink, &ready).await.is_err() {
        return;
    }

    let mut ping_interval = tokio::time::interval(PING_INTERVAL);
    ping_interval.tick().await; // skip immediate

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => {
                let _ = sink.send(Message::Close(None)).await;
                break;
            }

            _ = ping_interval.tick() => {
                if sink.send(Message::Ping(vec![].into())).await.is_err() {
                    break;
                }
            }

            event = subscription.recv() => {
                match event {
                    Ok(envelope) => {
                        if send_message(&mut sink, &PushMessage::Event(envelope)).await.is_err() {
                            break;
                        }
                    }
                    Err(SubscriptionError::Lagged(n)) => {
                        tracing::warn!(topic = %topic, lagged = n, "Push client lagged, resending snapshot");
                        if send_resync(&mut sink, &state, topic).await.is_err() {
                            break;
                        }
                    }
                    Err(SubscriptionError::Closed) | Err(SubscriptionError::Unsubscribed) => {
                        let _ = sink.send(Message::Close(None)).await;
                        break;
                    }
                }
            }

            msg = stream.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        match serde_json::from_str::<PushCommand>(&text) {
                            Ok(PushCommand::Resync) => {
                                if send_resync(&mut sink, &state, topic).await.is_err() {
                                    break;
                                }
                            }
                            Err(e) => {
                                tracing::debug!(error = %e, "Ignoring malformed push command");
                            }
                        }
                    }
                    Some(Ok(Message::Pong(_))) => {}
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(_)) => break,
                    _ => {}
                }
            }
        }
    }

    tracing::info!(topic = %topic, subscription_id = subscription.id(), "Push client disconnected");
}

/// Pull snapshot for a topic
async fn snapshot(state: &ServerState, topic: Topic) -> DiningResult<Vec<Order>> {
    match topic {
        Topic::Session(session_id) => state.sessions.list_orders(session_id).await,
        Topic::Order(order_id) => Ok(vec![state.orders.get(order_id).await?]),
        Topic::All => state.orders.list_open(None).await,
    }
}

async fn send_resync<S>(sink: &mut S, state: &ServerState, topic: Topic) -> Result<(), ()>
where
    S: futures::Sink<Message, Error = axum::Error> + Unpin,
{
    match snapshot(state, topic).await {
        Ok(orders) => send_message(sink, &PushMessage::Resync { orders }).await,
        Err(e) => {
            // keep the connection, the client still has its poll fallback
            tracing::warn!(topic = %topic, error = %e, "Resync snapshot failed");
            Ok(())
        }
    }
}

async fn send_message<S>(sink: &mut S, msg: &PushMessage) -> Result<(), ()>
where
    S: futures::Sink<Message, Error = axum::Error> + Unpin,
{
    let json = serde_json::to_string(msg).map_err(|_| ())?;
    sink.send(Message::Text(json.into())).await.map_err(|_| ())
}
