use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Default config file path.
pub const CONFIG_PATH: &str = "config.toml";

/// Top-level application config deserialized from `config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub product: ProductConfig,
    pub proxy: ProxySettings,
    #[serde(default)]
    pub timing: TimingConfig,
    pub locales: Vec<LocaleConfig>,
}

/// The tracked product and how to find it on the search endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductConfig {
    /// Display name matched exactly (case-sensitive) against search results.
    pub name: String,
    /// Locale used for the search query itself.
    #[serde(default = "default_search_locale")]
    pub search_locale: String,
    #[serde(default = "default_category")]
    pub category: String,
    /// SKU to fall back on when resolution fails. Optional; without it a
    /// failed resolution skips the round.
    #[serde(default)]
    pub fallback_sku: Option<String>,
}

/// Egress proxy pool: a shared credential pair over a fixed list of hosts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProxySettings {
    pub username: String,
    pub password: String,
    #[serde(default = "default_proxy_port")]
    pub port: u16,
    pub hosts: Vec<String>,
}

/// Delay constants for the polling loop, in seconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimingConfig {
    /// Pause after a positive detection.
    #[serde(default = "default_found_delay")]
    pub found_delay_secs: u64,
    /// Pause after a round where nothing was purchasable.
    #[serde(default = "default_miss_delay")]
    pub miss_delay_secs: u64,
    /// Pause after a transient failure (503/timeout). Zero means retry
    /// immediately.
    #[serde(default)]
    pub transient_delay_secs: u64,
    /// Pause before restarting a round whose SKU resolution failed.
    #[serde(default = "default_resolve_retry")]
    pub resolve_retry_secs: u64,
    /// Per-request timeout for outbound vendor API calls.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

/// One storefront locale to watch, with its notification text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocaleConfig {
    pub locale: String,
    pub message: String,
}

fn default_search_locale() -> String {
    "nl-nl".to_string()
}

fn default_category() -> String {
    "GPU".to_string()
}

fn default_proxy_port() -> u16 {
    50100
}

fn default_found_delay() -> u64 {
    10
}

fn default_miss_delay() -> u64 {
    3
}

fn default_resolve_retry() -> u64 {
    1
}

fn default_request_timeout() -> u64 {
    5
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            found_delay_secs: default_found_delay(),
            miss_delay_secs: default_miss_delay(),
            transient_delay_secs: 0,
            resolve_retry_secs: default_resolve_retry(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl TimingConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl AppConfig {
    /// Load config from the given TOML file path.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let config: Self = toml::from_str(&contents)
            .with_context(|| format!("failed to parse {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.product.name.is_empty() {
            anyhow::bail!("product.name must not be empty");
        }
        if self.proxy.hosts.is_empty() {
            anyhow::bail!("proxy.hosts must list at least one host");
        }
        if self.locales.is_empty() {
            anyhow::bail!("at least one [[locales]] entry is required");
        }
        Ok(())
    }
}

/// Notification sink credentials, read from the environment (loaded via
/// dotenvy in the binaries). Absent optional values disable that sink.
#[derive(Debug, Clone)]
pub struct NotifyConfig {
    pub telegram: Option<TelegramConfig>,
    pub pushover: Option<PushoverConfig>,
}

#[derive(Debug, Clone)]
pub struct TelegramConfig {
    pub bot_token: String,
    pub chat_ids: Vec<String>,
    /// Extra chat that receives a startup probe message, if set.
    pub startup_chat_id: Option<String>,
}

#[derive(Debug, Clone)]
pub struct PushoverConfig {
    pub api_token: String,
    pub user_key: String,
}

impl NotifyConfig {
    pub fn from_env() -> Self {
        let telegram = match (
            std::env::var("TELEGRAM_BOT_TOKEN").ok(),
            std::env::var("TELEGRAM_CHAT_IDS").ok(),
        ) {
            (Some(token), Some(ids)) if !token.is_empty() => {
                let chat_ids = parse_chat_ids(&ids);
                if chat_ids.is_empty() {
                    None
                } else {
                    Some(TelegramConfig {
                        bot_token: token,
                        chat_ids,
                        startup_chat_id: std::env::var("TELEGRAM_STARTUP_CHAT_ID")
                            .ok()
                            .filter(|s| !s.is_empty()),
                    })
                }
            }
            _ => None,
        };

        let pushover = match (
            std::env::var("PUSHOVER_API_TOKEN").ok(),
            std::env::var("PUSHOVER_USER_KEY").ok(),
        ) {
            (Some(api_token), Some(user_key)) if !api_token.is_empty() && !user_key.is_empty() => {
                Some(PushoverConfig {
                    api_token,
                    user_key,
                })
            }
            _ => None,
        };

        Self { telegram, pushover }
    }
}

/// Split a comma-separated chat id list, dropping empty segments.
pub fn parse_chat_ids(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect()
}
