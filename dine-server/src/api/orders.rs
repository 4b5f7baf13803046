//! Order API
//!
//! | 路径 | 方法 | 说明 |
//! |------|------|------|
//! | /api/orders | POST | 下单 (201) |
//! | /api/orders/{order_id} | GET | 订单详情 (拉取兜底) |
//! | /api/orders/{order_id}/status | PUT | 状态流转 (`x-dine-role`) |

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
};
use shared::order::{CreateOrderRequest, Order, UpdateStatusRequest};

use super::extract::Actor;
use crate::core::ServerState;
use crate::error::DiningResult;

/// Order router
pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/orders", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", post(create))
        .route("/{order_id}", get(get_by_id))
        .route("/{order_id}/status", put(update_status))
}

/// Place an order
pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<CreateOrderRequest>,
) -> DiningResult<(StatusCode, Json<Order>)> {
    let order = state.orders.create(payload).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

/// Get order by id
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(order_id): Path<i64>,
) -> DiningResult<Json<Order>> {
    Ok(Json(state.orders.get(order_id).await?))
}

/// Apply a status transition
pub async fn update_status(
    State(state): State<ServerState>,
    Path(order_id): Path<i64>,
    Actor(actor): Actor,
    Json(payload): Json<UpdateStatusRequest>,
) -> DiningResult<Json<Order>> {
    let order = match payload.expected_status {
        Some(expected) => {
            state
                .orders
                .transition_from(order_id, expected, payload.status, actor)
                .await?
        }
        None => state.orders.transition(order_id, payload.status, actor).await?,
    };
    Ok(Json(order))
}
