use std::time::Duration;

use anyhow::{Context, Result};
use futures_util::future::{BoxFuture, join_all};
use serde_json::json;
use tracing::{error, info};

use crate::config::{NotifyConfig, PushoverConfig, TelegramConfig};
use crate::{PUSHOVER_API_URL, TELEGRAM_API_BASE};

/// Sinks get a more generous timeout than the vendor probes; a slow
/// notification is still worth delivering.
const SINK_TIMEOUT: Duration = Duration::from_secs(10);

/// Best-effort fan-out to the configured notification sinks. Sink failures
/// are logged and swallowed; they never reach the polling loop.
pub struct Notifier {
    client: reqwest::Client,
    telegram: Option<TelegramConfig>,
    pushover: Option<PushoverConfig>,
}

impl Notifier {
    /// Notifications go out directly, not through the proxy pool.
    pub fn new(config: NotifyConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(SINK_TIMEOUT)
            .build()
            .context("failed to build notification client")?;
        Ok(Self {
            client,
            telegram: config.telegram,
            pushover: config.pushover,
        })
    }

    /// Number of configured delivery targets (chat ids + push sink).
    pub fn sink_count(&self) -> usize {
        let chats = self.telegram.as_ref().map_or(0, |t| t.chat_ids.len());
        chats + usize::from(self.pushover.is_some())
    }

    /// Deliver `text` to every sink concurrently. Each delivery is
    /// individually error-isolated: one failing sink cannot block or fail
    /// the others, and nothing propagates to the caller.
    pub async fn notify(&self, text: &str) {
        let mut deliveries: Vec<BoxFuture<'_, ()>> = Vec::new();

        if let Some(telegram) = &self.telegram {
            for chat_id in &telegram.chat_ids {
                deliveries.push(Box::pin(async move {
                    match self.send_telegram(telegram, chat_id, text).await {
                        Ok(()) => info!("Telegram message delivered to chat {chat_id}"),
                        Err(e) => error!("Telegram delivery to chat {chat_id} failed: {e}"),
                    }
                }));
            }
        }

        if let Some(pushover) = &self.pushover {
            deliveries.push(Box::pin(async move {
                match self.send_pushover(pushover, text).await {
                    Ok(()) => info!("Pushover message delivered"),
                    Err(e) => error!("Pushover delivery failed: {e}"),
                }
            }));
        }

        join_all(deliveries).await;
    }

    /// One-time boot message to the startup chat, if one is configured.
    pub async fn send_startup_probe(&self, product_name: &str) {
        let Some(telegram) = &self.telegram else {
            return;
        };
        let Some(chat_id) = &telegram.startup_chat_id else {
            return;
        };
        let text = format!("Drop watcher online, tracking {product_name}");
        match self.send_telegram(telegram, chat_id, &text).await {
            Ok(()) => info!("Startup probe delivered to chat {chat_id}"),
            Err(e) => error!("Startup probe failed: {e}"),
        }
    }

    async fn send_telegram(
        &self,
        config: &TelegramConfig,
        chat_id: &str,
        text: &str,
    ) -> Result<()> {
        let url = format!("{TELEGRAM_API_BASE}/bot{}/sendMessage", config.bot_token);
        let response = self
            .client
            .post(&url)
            .json(&json!({ "chat_id": chat_id, "text": text }))
            .send()
            .await?;
        response.error_for_status()?;
        Ok(())
    }

    async fn send_pushover(&self, config: &PushoverConfig, text: &str) -> Result<()> {
        let response = self
            .client
            .post(PUSHOVER_API_URL)
            .form(&[
                ("token", config.api_token.as_str()),
                ("user", config.user_key.as_str()),
                ("message", text),
            ])
            .send()
            .await?;
        response.error_for_status()?;
        Ok(())
    }
}

/// Availability message: locale template plus the purchase URL.
pub fn availability_message(template: &str, product_url: &str) -> String {
    format!("{template}\n{product_url}")
}

/// SKU-change message carrying both the old and the new identifier.
pub fn sku_change_message(old_sku: &str, new_sku: &str) -> String {
    format!("⚠️ SKU changed!\nOld SKU: {old_sku}\nNew SKU: {new_sku}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn telegram(chat_ids: &[&str]) -> TelegramConfig {
        TelegramConfig {
            bot_token: "token".to_string(),
            chat_ids: chat_ids.iter().map(|s| s.to_string()).collect(),
            startup_chat_id: None,
        }
    }

    #[test]
    fn availability_message_appends_url() {
        let msg = availability_message("RTX 5090 FE te koop in NEDERLAND!", "https://s/p/1");
        assert_eq!(msg, "RTX 5090 FE te koop in NEDERLAND!\nhttps://s/p/1");
    }

    #[test]
    fn sku_change_message_contains_both_values() {
        let msg = sku_change_message("OLD-123", "NEW-456");
        assert!(msg.contains("OLD-123"));
        assert!(msg.contains("NEW-456"));
    }

    #[test]
    fn sink_count_covers_all_targets() {
        let none = Notifier::new(NotifyConfig {
            telegram: None,
            pushover: None,
        })
        .unwrap();
        assert_eq!(none.sink_count(), 0);

        let full = Notifier::new(NotifyConfig {
            telegram: Some(telegram(&["1", "2"])),
            pushover: Some(PushoverConfig {
                api_token: "t".to_string(),
                user_key: "u".to_string(),
            }),
        })
        .unwrap();
        assert_eq!(full.sink_count(), 3);
    }

    #[tokio::test]
    async fn notify_with_no_sinks_is_a_no_op() {
        let notifier = Notifier::new(NotifyConfig {
            telegram: None,
            pushover: None,
        })
        .unwrap();
        notifier.notify("nothing listens").await;
    }
}
