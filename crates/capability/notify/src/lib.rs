//! 通知能力：状态切换消息推送（Telegram Bot API）。
//!
//! 发送失败对调用方永远是非致命的：引擎记录日志后继续，
//! 本模块不做自动重试队列。

use std::time::Duration;

use async_trait::async_trait;
use tracing::warn;

/// 通知发送错误。
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("http error: {0}")]
    Http(String),
    #[error("telegram api rejected message: status {0}")]
    Rejected(u16),
}

/// 通知推送抽象。
#[async_trait]
pub trait Notifier: Send + Sync {
    /// 推送一条消息。消息为纯文本加轻量强调标记，
    /// 渠道不支持标记时按纯文本降级展示。
    async fn send(&self, text: &str) -> Result<(), NotifyError>;
}

/// 空通知器（用于占位与测试）。
#[derive(Debug, Default)]
pub struct NoopNotifier;

#[async_trait]
impl Notifier for NoopNotifier {
    async fn send(&self, _text: &str) -> Result<(), NotifyError> {
        Ok(())
    }
}

/// Telegram 通知器配置。
#[derive(Debug, Clone)]
pub struct TelegramConfig {
    pub bot_token: String,
    pub chat_id: String,
    /// 单次请求超时，保证通知路径不会无限阻塞心跳处理。
    pub timeout: Duration,
}

/// Telegram 通知器实现（sendMessage）。
pub struct TelegramNotifier {
    client: reqwest::Client,
    url: String,
    chat_id: String,
}

impl TelegramNotifier {
    pub fn new(config: TelegramConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        let url = format!(
            "https://api.telegram.org/bot{}/sendMessage",
            config.bot_token
        );
        Self {
            client,
            url,
            chat_id: config.chat_id,
        }
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send(&self, text: &str) -> Result<(), NotifyError> {
        let body = serde_json::json!({
            "chat_id": self.chat_id,
            "text": text,
            "disable_web_page_preview": true,
            "parse_mode": "MarkdownV2",
        });
        let response = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|err| NotifyError::Http(err.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            warn!(
                target: "gridwatch.notify",
                status = status.as_u16(),
                detail = %detail,
                "telegram_send_rejected"
            );
            return Err(NotifyError::Rejected(status.as_u16()));
        }
        Ok(())
    }
}
