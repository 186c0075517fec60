use std::time::Duration;

use anyhow::Result;
use reqwest::StatusCode;
use reqwest::header::{HeaderMap, HeaderValue};
use tracing::{debug, info, warn};
use url::Url;

use crate::config::ProductConfig;
use crate::proxy::ProxyEndpoint;
use crate::types::{InventoryResponse, LocaleOutcome, LocaleTarget, SearchResponse, SkuResolution};
use crate::{INVENTORY_API_BASE, MARKETPLACE_BASE, SEARCH_API_BASE};

/// Header bundle impersonating a desktop browser session on the
/// marketplace web origin. The vendor API rejects bare clients.
fn browser_headers() -> HeaderMap {
    const PAIRS: &[(&str, &str)] = &[
        ("authority", "api.nvidia.partners"),
        ("accept", "application/json, text/javascript, */*; q=0.01"),
        ("accept-language", "en-GB,en;q=0.9,en-US;q=0.8,nl;q=0.7"),
        ("content-type", "application/json"),
        ("dnt", "1"),
        ("origin", MARKETPLACE_BASE),
        ("priority", "u=1, i"),
        ("referer", "https://marketplace.nvidia.com/"),
        (
            "sec-ch-ua",
            "\"Not A(Brand\";v=\"8\", \"Chromium\";v=\"132\", \"Microsoft Edge\";v=\"132\"",
        ),
        ("sec-ch-ua-mobile", "?0"),
        ("sec-ch-ua-platform", "\"Windows\""),
        ("sec-fetch-dest", "empty"),
        ("sec-fetch-mode", "cors"),
        ("sec-fetch-site", "cross-site"),
        (
            "user-agent",
            "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) \
             Chrome/132.0.0.0 Safari/537.36 Edg/132.0.0.0",
        ),
    ];
    let mut headers = HeaderMap::new();
    for (name, value) in PAIRS {
        headers.insert(*name, HeaderValue::from_static(value));
    }
    headers
}

/// Build an HTTP client that routes all traffic through the given proxy,
/// with the pinned header bundle and a per-request timeout.
pub fn build_client(proxy: &ProxyEndpoint, timeout: Duration) -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .default_headers(browser_headers())
        .timeout(timeout)
        .proxy(reqwest::Proxy::all(proxy.url())?)
        .build()?;
    Ok(client)
}

/// Search endpoint URL with the fixed query parameters.
pub fn search_url(product: &ProductConfig) -> String {
    let url = Url::parse_with_params(
        SEARCH_API_BASE,
        [
            ("page", "1"),
            ("limit", "12"),
            ("locale", product.search_locale.as_str()),
            ("category", product.category.as_str()),
        ],
    )
    .expect("static search URL is valid");
    url.into()
}

/// Inventory endpoint URL for one SKU/locale pair.
pub fn inventory_url(sku: &str, locale: &str) -> String {
    let url = Url::parse_with_params(
        INVENTORY_API_BASE,
        [("status", "1"), ("skus", sku), ("locale", locale)],
    )
    .expect("static inventory URL is valid");
    url.into()
}

/// First search entry whose display name exactly matches the tracked
/// product name. Case-sensitive; all other entries are ignored.
pub fn match_sku(response: &SearchResponse, product_name: &str) -> Option<String> {
    response
        .searched_products
        .product_details
        .iter()
        .find(|p| p.display_name == product_name)
        .map(|p| p.product_sku.clone())
}

/// Resolve the current SKU for the tracked product via the search endpoint.
///
/// Never propagates errors: every failure path collapses into
/// [`SkuResolution::Failed`] so the loop controller decides what to do.
pub async fn resolve_sku(client: &reqwest::Client, product: &ProductConfig) -> SkuResolution {
    let url = search_url(product);
    let response = match client.get(&url).send().await {
        Ok(r) => r,
        Err(e) => {
            warn!("SKU search request failed: {e}");
            return SkuResolution::Failed;
        }
    };
    let body: SearchResponse = match response.json().await {
        Ok(b) => b,
        Err(e) => {
            warn!("SKU search response unreadable: {e}");
            return SkuResolution::Failed;
        }
    };
    match match_sku(&body, &product.name) {
        Some(sku) => {
            info!("Resolved SKU from search API: {sku}");
            SkuResolution::Resolved(sku)
        }
        None => {
            warn!("No product named {:?} in search response", product.name);
            SkuResolution::NotFound
        }
    }
}

/// Classify a parsed inventory response. A hit requires all four: success
/// flag set, non-empty list, `is_active == "true"`, non-empty product URL.
pub fn classify_inventory(response: &InventoryResponse) -> LocaleOutcome {
    if !response.success {
        return LocaleOutcome::Miss;
    }
    let Some(entry) = response.list_map.first() else {
        return LocaleOutcome::Miss;
    };
    if entry.is_active == "true" && !entry.product_url.is_empty() {
        LocaleOutcome::Hit {
            product_url: entry.product_url.clone(),
        }
    } else {
        LocaleOutcome::Miss
    }
}

/// Probe one locale's inventory endpoint.
///
/// 503 and timeouts are transient (retry immediately); any other failure
/// counts as a plain miss. Never propagates, so one locale cannot abort
/// the rest of the round.
pub async fn probe_locale(client: &reqwest::Client, target: &LocaleTarget) -> LocaleOutcome {
    let response = match client.get(&target.url).send().await {
        Ok(r) => r,
        Err(e) => {
            if e.is_timeout() {
                warn!("[{}] request timed out", target.locale);
                return LocaleOutcome::Transient;
            }
            warn!("[{}] request failed: {e}", target.locale);
            return LocaleOutcome::Miss;
        }
    };
    if response.status() == StatusCode::SERVICE_UNAVAILABLE {
        warn!("[{}] 503 from inventory API", target.locale);
        return LocaleOutcome::Transient;
    }
    let body: InventoryResponse = match response.json().await {
        Ok(b) => b,
        Err(e) => {
            // a timeout can also strike mid body read
            if e.is_timeout() {
                warn!("[{}] request timed out reading body", target.locale);
                return LocaleOutcome::Transient;
            }
            warn!("[{}] inventory response unreadable: {e}", target.locale);
            return LocaleOutcome::Miss;
        }
    };
    let outcome = classify_inventory(&body);
    debug!("[{}] inventory outcome: {outcome:?}", target.locale);
    outcome
}
