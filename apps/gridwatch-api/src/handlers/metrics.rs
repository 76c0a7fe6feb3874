//! Telemetry 指标快照。
//!
//! - GET /metrics

use api_contract::{ApiResponse, MetricsDto};
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use gridwatch_telemetry::metrics;

pub async fn get_metrics() -> Response {
    let snapshot = metrics().snapshot();
    (
        StatusCode::OK,
        Json(ApiResponse::success(MetricsDto {
            heartbeats_received: snapshot.heartbeats_received,
            staleness_checks: snapshot.staleness_checks,
            transitions_to_on: snapshot.transitions_to_on,
            transitions_to_outage: snapshot.transitions_to_outage,
            notify_success: snapshot.notify_success,
            notify_failure: snapshot.notify_failure,
            store_write_failure: snapshot.store_write_failure,
        })),
    )
        .into_response()
}
