//! Batch notifications.

use async_trait::async_trait;
use serde_json::json;
use tracing::{debug, info};

use crate::config::TelegramSettings;
use crate::domain::{DeployError, Result};

/// Environment variable holding the Telegram bot token.
pub const TELEGRAM_TOKEN_ENV: &str = "TELEGRAM_BOT_TOKEN";

const TELEGRAM_API: &str = "https://api.telegram.org";

/// Fire-and-forget delivery of one message per batch.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, message: &str) -> Result<()>;
}

/// Posts messages to a Telegram chat through the Bot API.
#[derive(Debug, Clone)]
pub struct TelegramNotifier {
    client: reqwest::Client,
    api_base: String,
    bot_token: String,
    chat_id: String,
}

impl TelegramNotifier {
    pub fn new(bot_token: impl Into<String>, chat_id: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("autodeploy/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| DeployError::Notify(format!("failed to create HTTP client: {e}")))?;
        Ok(Self {
            client,
            api_base: TELEGRAM_API.to_string(),
            bot_token: bot_token.into(),
            chat_id: chat_id.into(),
        })
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    /// Build from settings, reading the token from `TELEGRAM_BOT_TOKEN`.
    /// Returns `Ok(None)` when no token is set.
    pub fn from_settings(settings: &TelegramSettings) -> Result<Option<Self>> {
        let token = match std::env::var(TELEGRAM_TOKEN_ENV) {
            Ok(t) if !t.trim().is_empty() => t,
            _ => return Ok(None),
        };
        let mut notifier = Self::new(token.trim(), &settings.chat_id)?;
        if let Some(base) = &settings.api_base {
            notifier = notifier.with_api_base(base);
        }
        Ok(Some(notifier))
    }

    fn send_url(&self) -> String {
        format!(
            "{}/bot{}/sendMessage",
            self.api_base.trim_end_matches('/'),
            self.bot_token
        )
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn notify(&self, message: &str) -> Result<()> {
        debug!(chat_id = %self.chat_id, "Sending Telegram notification");
        self.client
            .post(self.send_url())
            .json(&json!({ "chat_id": self.chat_id, "text": message }))
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| DeployError::Notify(e.without_url().to_string()))?;
        Ok(())
    }
}

/// Writes the message to the log only. Used when no chat is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, message: &str) -> Result<()> {
        info!(event = "notify.sent", channel = "log", "{}", message);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_send_url() {
        let notifier = TelegramNotifier::new("123:abc", "-100")
            .unwrap()
            .with_api_base("http://localhost:8081/");
        assert_eq!(
            notifier.send_url(),
            "http://localhost:8081/bot123:abc/sendMessage"
        );
    }

    #[tokio::test]
    async fn test_unreachable_api_is_an_error() {
        let notifier = TelegramNotifier::new("t", "c")
            .unwrap()
            .with_api_base("http://127.0.0.1:9");
        let err = notifier.notify("hello").await.unwrap_err();
        assert!(matches!(err, DeployError::Notify(_)));
    }

    #[tokio::test]
    async fn test_log_notifier_never_fails() {
        LogNotifier.notify("The following project(s) have been deployed: A").await.unwrap();
    }
}
