//! 路由定义
//!
//! 集中管理所有 API 路由，将路径映射到对应的 handlers。
//! 路由包括：
//! - 设备心跳：/hb（?secret= 鉴权）
//! - 状态查询：/status
//! - 健康检查：/health
//! - 运行指标：/metrics

use super::AppState;
use super::handlers::*;
use axum::{Router, routing::get};

/// 创建 API 路由
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .route("/hb", get(heartbeat))
        .route("/status", get(status))
        .route("/health", get(health))
        .route("/metrics", get(get_metrics))
}
