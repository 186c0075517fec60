use crate::types::{WatchEvent, WatchTrigger};

/// Emit a watch event as a single JSON line to stdout. Logs go to stderr,
/// so stdout stays machine-consumable.
pub fn report_event(event: &WatchEvent) {
    if let Ok(json) = serde_json::to_string(event) {
        println!("{json}");
    }
}

pub fn availability_event(sku: &str, locale: &str, product_url: &str) -> WatchEvent {
    WatchEvent {
        timestamp: chrono::Utc::now().to_rfc3339(),
        trigger: WatchTrigger::Available,
        sku: sku.to_string(),
        previous_sku: None,
        locale: Some(locale.to_string()),
        product_url: Some(product_url.to_string()),
    }
}

pub fn sku_change_event(old_sku: &str, new_sku: &str) -> WatchEvent {
    WatchEvent {
        timestamp: chrono::Utc::now().to_rfc3339(),
        trigger: WatchTrigger::SkuChanged,
        sku: new_sku.to_string(),
        previous_sku: Some(old_sku.to_string()),
        locale: None,
        product_url: None,
    }
}
