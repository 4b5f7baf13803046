//! Kitchen board API
//!
//! GET /api/kitchen/orders?status=<STATUS> - open orders, oldest first

use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};
use serde::Deserialize;
use shared::order::{Order, OrderStatus};

use crate::core::ServerState;
use crate::error::DiningResult;

#[derive(Debug, Deserialize)]
pub struct BoardQuery {
    pub status: Option<OrderStatus>,
}

pub fn router() -> Router<ServerState> {
    Router::new().route("/api/kitchen/orders", get(list_open))
}

pub async fn list_open(
    State(state): State<ServerState>,
    Query(query): Query<BoardQuery>,
) -> DiningResult<Json<Vec<Order>>> {
    Ok(Json(state.orders.list_open(query.status).await?))
}
