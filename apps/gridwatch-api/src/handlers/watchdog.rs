//! 心跳接收与状态查询 handlers
//!
//! - GET /hb：设备心跳上报（?secret= 鉴权），响应纯文本 "ok"
//! - GET /status：当前状态投影（公开只读）
//! - GET /health：存活探针

use api_contract::{ApiResponse, HeartbeatQuery, StatusDto};
use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use domain::now_epoch_ms;

use crate::AppState;
use crate::middleware::device_secret_matches;

pub async fn heartbeat(
    State(state): State<AppState>,
    Query(query): Query<HeartbeatQuery>,
) -> Response {
    if !device_secret_matches(query.secret.as_deref(), &state.device_secret) {
        return (
            StatusCode::FORBIDDEN,
            Json(ApiResponse::<()>::error("AUTH.FORBIDDEN", "forbidden")),
        )
            .into_response();
    }

    state.engine.record_heartbeat(now_epoch_ms()).await;
    // 设备固件只认纯文本应答
    (StatusCode::OK, "ok").into_response()
}

pub async fn status(State(state): State<AppState>) -> Response {
    let snapshot = state.engine.status(now_epoch_ms()).await;
    (
        StatusCode::OK,
        Json(StatusDto {
            state: snapshot.state,
            last_seen_at: snapshot.last_seen_at_ms,
            seconds_ago: snapshot.seconds_ago,
        }),
    )
        .into_response()
}

pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "ok": true }))
}
