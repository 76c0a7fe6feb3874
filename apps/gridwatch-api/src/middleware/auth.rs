//! 请求追踪中间件与设备鉴权
//!
//! - request_context：请求上下文中间件，注入 request_id/trace_id
//! - device_secret_matches：常量时间比较设备共享密钥
//!
//! 鉴权发生在 HTTP 层：密钥不匹配的请求在到达看门狗引擎之前
//! 就被 403 拒绝。

use axum::{
    body::Body,
    extract::Request,
    http::HeaderValue,
    middleware::Next,
    response::Response,
};
use gridwatch_telemetry::new_request_ids;
use subtle::ConstantTimeEq;
use tracing::{Instrument, info_span};

/// 请求上下文中间件：注入 request_id/trace_id
pub async fn request_context(mut req: Request<Body>, next: Next) -> Response {
    let ids = new_request_ids();
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    req.extensions_mut().insert(ids.clone());

    let span = info_span!(
        "request",
        request_id = %ids.request_id,
        trace_id = %ids.trace_id,
        method = %method,
        path = %path
    );

    let mut response = next.run(req).instrument(span).await;
    response.headers_mut().insert(
        "x-request-id",
        HeaderValue::from_str(&ids.request_id).unwrap_or_else(|_| HeaderValue::from_static("")),
    );
    response.headers_mut().insert(
        "x-trace-id",
        HeaderValue::from_str(&ids.trace_id).unwrap_or_else(|_| HeaderValue::from_static("")),
    );
    response
}

/// 常量时间比较设备密钥（避免时序侧信道）。缺失密钥视为不匹配。
pub fn device_secret_matches(provided: Option<&str>, expected: &str) -> bool {
    let Some(provided) = provided else {
        return false;
    };
    provided.as_bytes().ct_eq(expected.as_bytes()).into()
}
