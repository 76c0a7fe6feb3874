//! 稳定的 DTO 与 API 响应契约。

use domain::DeviceState;
use serde::{Deserialize, Serialize};

/// 标准 API 响应封装。
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<ApiError>,
}

/// 失败响应的错误体。
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(ApiError {
                code: code.into(),
                message: message.into(),
            }),
        }
    }
}

/// 状态查询响应体（GET /status 的稳定契约）。
///
/// `lastSeenAt` 为 epoch 毫秒；设备从未上报过心跳时两个可选字段均为 null。
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusDto {
    pub state: DeviceState,
    pub last_seen_at: Option<i64>,
    pub seconds_ago: Option<i64>,
}

/// 心跳请求的查询参数。
#[derive(Debug, Deserialize)]
pub struct HeartbeatQuery {
    #[serde(default)]
    pub secret: Option<String>,
}

/// 运行指标响应体（GET /metrics）。
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsDto {
    pub heartbeats_received: u64,
    pub staleness_checks: u64,
    pub transitions_to_on: u64,
    pub transitions_to_outage: u64,
    pub notify_success: u64,
    pub notify_failure: u64,
    pub store_write_failure: u64,
}
