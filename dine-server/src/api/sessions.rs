//! Session API
//!
//! | 路径 | 方法 | 说明 |
//! |------|------|------|
//! | /api/sessions/{session_id} | GET | 会话汇总 |
//! | /api/sessions/{session_id}/finish | POST | 结束会话并出账单 (幂等) |
//! | /api/sessions/{session_id}/bill | POST | 账单 (幂等，原始字节) |
//! | /api/tables/{table_number}/session | GET | 桌台当前会话 |

use axum::{
    Json, Router,
    extract::{Path, State},
    http::header,
    response::IntoResponse,
    routing::{get, post},
};
use shared::session::SessionSummary;

use crate::core::ServerState;
use crate::error::DiningResult;

pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/api/sessions/{session_id}", get(get_summary))
        .route("/api/sessions/{session_id}/finish", post(finish))
        .route("/api/sessions/{session_id}/bill", post(bill))
        .route("/api/tables/{table_number}/session", get(active_for_table))
}

pub async fn get_summary(
    State(state): State<ServerState>,
    Path(session_id): Path<i64>,
) -> DiningResult<Json<SessionSummary>> {
    Ok(Json(state.sessions.summary(session_id).await?))
}

/// Repeated calls return the same summary and bill
pub async fn finish(
    State(state): State<ServerState>,
    Path(session_id): Path<i64>,
) -> DiningResult<Json<SessionSummary>> {
    Ok(Json(state.sessions.finish_or_get(session_id).await?))
}

/// Serves the stored bytes unchanged
pub async fn bill(
    State(state): State<ServerState>,
    Path(session_id): Path<i64>,
) -> DiningResult<impl IntoResponse> {
    let bytes = state.sessions.bills().generate_bytes(session_id).await?;
    Ok(([(header::CONTENT_TYPE, "application/json")], bytes))
}

pub async fn active_for_table(
    State(state): State<ServerState>,
    Path(table_number): Path<String>,
) -> DiningResult<Json<SessionSummary>> {
    Ok(Json(state.sessions.active_summary(&table_number).await?))
}
