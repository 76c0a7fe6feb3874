//! 应用运行配置加载。

use std::env;

/// 配置加载错误。
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required env: {0}")]
    Missing(String),
    #[error("invalid value for {0}: {1}")]
    Invalid(String, String),
}

/// 应用运行配置。
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub http_addr: String,
    pub database_url: String,
    /// Telegram Bot API token。
    pub bot_token: String,
    /// Telegram 推送目标会话。
    pub chat_id: String,
    /// 心跳上报的共享密钥（?secret= 查询参数）。
    pub device_secret: String,
    /// 被监控设备标识（单设备部署固定一个值即可）。
    pub device_id: String,
    /// 心跳超过该毫秒数未到达即判定断电。
    pub outage_threshold_ms: u64,
    /// 看门狗轮询间隔（毫秒）。
    pub check_every_ms: u64,
    /// 通知请求超时（毫秒）。
    pub notify_timeout_ms: u64,
}

impl AppConfig {
    /// 从环境变量读取配置。
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url = env::var("GRIDWATCH_DATABASE_URL")
            .map_err(|_| ConfigError::Missing("GRIDWATCH_DATABASE_URL".to_string()))?;
        let bot_token = env::var("GRIDWATCH_BOT_TOKEN")
            .map_err(|_| ConfigError::Missing("GRIDWATCH_BOT_TOKEN".to_string()))?;
        let chat_id = env::var("GRIDWATCH_CHAT_ID")
            .map_err(|_| ConfigError::Missing("GRIDWATCH_CHAT_ID".to_string()))?;
        let device_secret = env::var("GRIDWATCH_DEVICE_SECRET")
            .map_err(|_| ConfigError::Missing("GRIDWATCH_DEVICE_SECRET".to_string()))?;
        let http_addr =
            env::var("GRIDWATCH_HTTP_ADDR").unwrap_or_else(|_| "127.0.0.1:8080".to_string());
        let device_id =
            env::var("GRIDWATCH_DEVICE_ID").unwrap_or_else(|_| "default".to_string());
        let outage_threshold_ms = read_u64_with_default("GRIDWATCH_OUTAGE_THRESHOLD_MS", 20_000)?;
        let check_every_ms = read_u64_with_default("GRIDWATCH_CHECK_EVERY_MS", 5_000)?;
        let notify_timeout_ms = read_u64_with_default("GRIDWATCH_NOTIFY_TIMEOUT_MS", 5_000)?;

        if outage_threshold_ms == 0 {
            return Err(ConfigError::Invalid(
                "GRIDWATCH_OUTAGE_THRESHOLD_MS".to_string(),
                "0".to_string(),
            ));
        }
        if check_every_ms == 0 {
            return Err(ConfigError::Invalid(
                "GRIDWATCH_CHECK_EVERY_MS".to_string(),
                "0".to_string(),
            ));
        }

        Ok(Self {
            http_addr,
            database_url,
            bot_token,
            chat_id,
            device_secret,
            device_id,
            outage_threshold_ms,
            check_every_ms,
            notify_timeout_ms,
        })
    }
}

fn read_u64_with_default(key: &str, default: u64) -> Result<u64, ConfigError> {
    let value = match env::var(key) {
        Ok(value) => value,
        Err(_) => return Ok(default),
    };
    value
        .parse::<u64>()
        .map_err(|_| ConfigError::Invalid(key.to_string(), value))
}
