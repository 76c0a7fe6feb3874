//! 进程引导：配置加载、状态恢复、巡检调度与 HTTP 服务启动。
//!
//! 启动顺序是契约的一部分：先从存储恢复看门狗状态（失败即退出），
//! 再启动巡检调度器，最后才开始接收心跳。

mod handlers;
mod middleware;
mod routes;

use std::sync::Arc;
use std::time::Duration;

use axum::middleware as axum_middleware;
use domain::now_epoch_ms;
use gridwatch_config::AppConfig;
use gridwatch_notify::{TelegramConfig, TelegramNotifier};
use gridwatch_storage::PgDeviceStore;
use gridwatch_telemetry::init_tracing;
use gridwatch_watchdog::{WatchdogEngine, spawn_staleness_checker};
use tower_http::trace::TraceLayer;
use tracing::info;

/// HTTP 层共享状态。
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<WatchdogEngine>,
    pub device_secret: Arc<str>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 加载本地 .env（如存在），便于直接 cargo run 启动
    dotenvy::dotenv().ok();
    // 从环境变量加载运行配置
    let config = AppConfig::from_env()?;
    // 初始化结构化日志
    init_tracing();

    // 存储不可达时此处直接失败：不得以未定义的初始状态开始服务
    let store = Arc::new(PgDeviceStore::connect(&config.database_url).await?);
    let notifier = Arc::new(TelegramNotifier::new(TelegramConfig {
        bot_token: config.bot_token.clone(),
        chat_id: config.chat_id.clone(),
        timeout: Duration::from_millis(config.notify_timeout_ms),
    }));
    let engine = Arc::new(
        WatchdogEngine::restore(
            config.device_id.as_str(),
            config.outage_threshold_ms,
            store,
            notifier,
            now_epoch_ms(),
        )
        .await?,
    );

    // 状态已恢复，开始周期性巡检
    let checker = spawn_staleness_checker(Arc::clone(&engine), config.check_every_ms);

    let state = AppState {
        engine,
        device_secret: Arc::from(config.device_secret.as_str()),
    };
    let app = routes::create_api_router()
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        // 注入 request_id/trace_id
        .layer(axum_middleware::from_fn(middleware::request_context));

    let listener = tokio::net::TcpListener::bind(&config.http_addr).await?;
    info!(target: "gridwatch.api", addr = %config.http_addr, "listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // 先停调度器：不再发出新 tick，在途巡检允许完成
    checker.stop().await;
    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!(target: "gridwatch.api", "shutdown_signal_received");
}
