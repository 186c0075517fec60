pub mod api;
pub mod config;
pub mod notify;
pub mod proxy;
pub mod reporter;
pub mod types;
pub mod watcher;

/// Product search API (public partner edge, no auth required)
pub const SEARCH_API_BASE: &str = "https://api.nvidia.partners/edge/product/search";

/// Founders Edition inventory API, parameterized by `skus` and `locale`
pub const INVENTORY_API_BASE: &str = "https://api.store.nvidia.com/partner/v1/feinventory";

/// Consumer marketplace storefront — the web origin pinned in the
/// browser-impersonating request headers
pub const MARKETPLACE_BASE: &str = "https://marketplace.nvidia.com";

/// Telegram Bot API base URL
pub const TELEGRAM_API_BASE: &str = "https://api.telegram.org";

/// Pushover message endpoint
pub const PUSHOVER_API_URL: &str = "https://api.pushover.net/1/messages.json";
