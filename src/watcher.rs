use std::time::Duration;

use futures_util::future::join_all;
use tracing::{info, warn};

use crate::api;
use crate::config::{AppConfig, TimingConfig};
use crate::notify::{self, Notifier};
use crate::proxy::ProxyPool;
use crate::reporter;
use crate::types::{LocaleOutcome, LocaleTarget, RoundOutcome, SkuResolution};

/// How a freshly resolved SKU relates to the last known one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkuTransition {
    /// First successful resolution; stored silently.
    Initial,
    Unchanged,
    Changed { old: String },
}

/// Owns everything that survives across polling rounds: the proxy cursor
/// and the last known SKU. One instance drives the whole process.
pub struct Watcher {
    config: AppConfig,
    pool: ProxyPool,
    notifier: Notifier,
    last_known_sku: Option<String>,
}

impl Watcher {
    pub fn new(config: AppConfig, notifier: Notifier) -> Self {
        let pool = ProxyPool::from_settings(&config.proxy);
        Self {
            config,
            pool,
            notifier,
            last_known_sku: None,
        }
    }

    /// Polling loop. Runs until Ctrl+C (or after one round with `once`).
    pub async fn run(&mut self, once: bool) {
        info!(
            "Watching {:?} across {} locale(s), {} proxies in rotation",
            self.config.product.name,
            self.config.locales.len(),
            self.pool.len(),
        );
        loop {
            let delay = match self.run_round().await {
                Some(outcome) => {
                    let delay = next_delay(outcome, &self.config.timing);
                    match outcome {
                        RoundOutcome::Found => {
                            info!("Product found! Checking again in {delay:?}")
                        }
                        RoundOutcome::Transient => info!("Transient error, retrying in {delay:?}"),
                        RoundOutcome::NotFound => {
                            info!("Nothing purchasable, next check in {delay:?}")
                        }
                    }
                    delay
                }
                None => {
                    let delay = Duration::from_secs(self.config.timing.resolve_retry_secs);
                    info!("SKU resolution failed, restarting round in {delay:?}");
                    delay
                }
            };

            if once {
                break;
            }
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    info!("Shutdown signal received");
                    break;
                }
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }

    /// One round: resolve, compare, probe, notify. `None` means SKU
    /// resolution failed with no fallback configured.
    pub async fn run_round(&mut self) -> Option<RoundOutcome> {
        let timeout = self.config.timing.request_timeout();

        let proxy = self.pool.next().clone();
        info!("Resolving SKU via proxy {proxy}");
        let resolved = match api::build_client(&proxy, timeout) {
            Ok(client) => api::resolve_sku(&client, &self.config.product).await,
            Err(e) => {
                warn!("Failed to build proxied client: {e}");
                SkuResolution::Failed
            }
        };
        let fell_back = !matches!(resolved, SkuResolution::Resolved(_));
        let sku = effective_sku(resolved, self.config.product.fallback_sku.as_deref())?;
        if fell_back {
            warn!("Falling back to configured SKU {sku}");
        }

        match self.observe_sku(&sku) {
            SkuTransition::Initial => info!("Current SKU: {sku}"),
            SkuTransition::Unchanged => info!("SKU unchanged: {sku}"),
            SkuTransition::Changed { old } => {
                info!("SKU changed from {old} to {sku}");
                reporter::report_event(&reporter::sku_change_event(&old, &sku));
                self.notifier
                    .notify(&notify::sku_change_message(&old, &sku))
                    .await;
            }
        }

        let targets = build_targets(&self.config, &sku);

        // All locale probes share one rotated-proxy client.
        let proxy = self.pool.next().clone();
        info!("Checking {} locale(s) via proxy {proxy}", targets.len());
        let client = match api::build_client(&proxy, timeout) {
            Ok(client) => client,
            Err(e) => {
                warn!("Failed to build proxied client: {e}");
                return Some(RoundOutcome::NotFound);
            }
        };
        let outcomes = join_all(targets.iter().map(|t| api::probe_locale(&client, t))).await;

        for (target, outcome) in targets.iter().zip(&outcomes) {
            if let LocaleOutcome::Hit { product_url } = outcome {
                info!("[{}] purchasable at {product_url}", target.locale);
                reporter::report_event(&reporter::availability_event(
                    &sku,
                    &target.locale,
                    product_url,
                ));
                self.notifier
                    .notify(&notify::availability_message(&target.message, product_url))
                    .await;
            }
        }

        Some(summarize(&outcomes))
    }

    /// Record the freshly resolved SKU and classify the transition.
    fn observe_sku(&mut self, sku: &str) -> SkuTransition {
        match self.last_known_sku.as_deref() {
            None => {
                self.last_known_sku = Some(sku.to_string());
                SkuTransition::Initial
            }
            Some(prev) if prev == sku => SkuTransition::Unchanged,
            Some(prev) => {
                let old = prev.to_string();
                self.last_known_sku = Some(sku.to_string());
                SkuTransition::Changed { old }
            }
        }
    }
}

/// SKU to use this round: the resolved one, or the configured fallback
/// when resolution came up empty. `None` skips the round.
pub fn effective_sku(resolution: SkuResolution, fallback: Option<&str>) -> Option<String> {
    match resolution {
        SkuResolution::Resolved(sku) => Some(sku),
        SkuResolution::NotFound | SkuResolution::Failed => fallback.map(str::to_string),
    }
}

/// Rebuild the per-locale probe targets from the current SKU.
pub fn build_targets(config: &AppConfig, sku: &str) -> Vec<LocaleTarget> {
    config
        .locales
        .iter()
        .map(|lc| LocaleTarget {
            locale: lc.locale.clone(),
            url: api::inventory_url(sku, &lc.locale),
            message: lc.message.clone(),
        })
        .collect()
}

/// Collapse per-locale outcomes into the round outcome: any hit wins;
/// otherwise any 503/timeout makes the round transient.
pub fn summarize(outcomes: &[LocaleOutcome]) -> RoundOutcome {
    if outcomes
        .iter()
        .any(|o| matches!(o, LocaleOutcome::Hit { .. }))
    {
        RoundOutcome::Found
    } else if outcomes.contains(&LocaleOutcome::Transient) {
        RoundOutcome::Transient
    } else {
        RoundOutcome::NotFound
    }
}

/// Delay class per round outcome, from the configured timing constants.
pub fn next_delay(outcome: RoundOutcome, timing: &TimingConfig) -> Duration {
    let secs = match outcome {
        RoundOutcome::Found => timing.found_delay_secs,
        RoundOutcome::Transient => timing.transient_delay_secs,
        RoundOutcome::NotFound => timing.miss_delay_secs,
    };
    Duration::from_secs(secs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{LocaleConfig, NotifyConfig, ProductConfig, ProxySettings};

    fn test_config() -> AppConfig {
        AppConfig {
            product: ProductConfig {
                name: "NVIDIA RTX 5090".to_string(),
                search_locale: "nl-nl".to_string(),
                category: "GPU".to_string(),
                fallback_sku: None,
            },
            proxy: ProxySettings {
                username: "u".to_string(),
                password: "p".to_string(),
                port: 50100,
                hosts: vec!["10.0.0.1".to_string()],
            },
            timing: TimingConfig::default(),
            locales: vec![
                LocaleConfig {
                    locale: "nl-nl".to_string(),
                    message: "Te koop in NEDERLAND!".to_string(),
                },
                LocaleConfig {
                    locale: "de-de".to_string(),
                    message: "Verfügbar in DEUTSCHLAND!".to_string(),
                },
            ],
        }
    }

    fn test_watcher() -> Watcher {
        let notifier = Notifier::new(NotifyConfig {
            telegram: None,
            pushover: None,
        })
        .unwrap();
        Watcher::new(test_config(), notifier)
    }

    fn hit(url: &str) -> LocaleOutcome {
        LocaleOutcome::Hit {
            product_url: url.to_string(),
        }
    }

    // ── summarize ──────────────────────────────────────────────────

    #[test]
    fn any_hit_wins_the_round() {
        let outcomes = [LocaleOutcome::Miss, hit("https://s/p/1"), LocaleOutcome::Transient];
        assert_eq!(summarize(&outcomes), RoundOutcome::Found);
    }

    #[test]
    fn transient_without_hit_marks_round_transient() {
        let outcomes = [LocaleOutcome::Miss, LocaleOutcome::Transient];
        assert_eq!(summarize(&outcomes), RoundOutcome::Transient);
        // no hit recorded, so nothing would be notified
        assert!(!outcomes.iter().any(|o| matches!(o, LocaleOutcome::Hit { .. })));
    }

    #[test]
    fn all_misses_is_not_found() {
        let outcomes = [LocaleOutcome::Miss, LocaleOutcome::Miss];
        assert_eq!(summarize(&outcomes), RoundOutcome::NotFound);
    }

    #[test]
    fn no_locales_is_not_found() {
        assert_eq!(summarize(&[]), RoundOutcome::NotFound);
    }

    // ── next_delay ─────────────────────────────────────────────────

    #[test]
    fn delay_class_per_outcome() {
        let timing = TimingConfig {
            found_delay_secs: 10,
            miss_delay_secs: 3,
            transient_delay_secs: 0,
            resolve_retry_secs: 1,
            request_timeout_secs: 5,
        };
        assert_eq!(
            next_delay(RoundOutcome::Found, &timing),
            Duration::from_secs(10)
        );
        assert_eq!(
            next_delay(RoundOutcome::NotFound, &timing),
            Duration::from_secs(3)
        );
        assert_eq!(next_delay(RoundOutcome::Transient, &timing), Duration::ZERO);
    }

    #[test]
    fn transient_pause_variant_is_respected() {
        let timing = TimingConfig {
            transient_delay_secs: 1,
            ..TimingConfig::default()
        };
        assert_eq!(
            next_delay(RoundOutcome::Transient, &timing),
            Duration::from_secs(1)
        );
    }

    // ── effective_sku ──────────────────────────────────────────────

    #[test]
    fn resolved_sku_ignores_fallback() {
        assert_eq!(
            effective_sku(SkuResolution::Resolved("SKU-A".to_string()), Some("FB")),
            Some("SKU-A".to_string())
        );
    }

    #[test]
    fn fallback_applies_on_miss_and_failure() {
        assert_eq!(
            effective_sku(SkuResolution::NotFound, Some("FB")),
            Some("FB".to_string())
        );
        assert_eq!(
            effective_sku(SkuResolution::Failed, Some("FB")),
            Some("FB".to_string())
        );
    }

    #[test]
    fn no_fallback_skips_the_round() {
        assert_eq!(effective_sku(SkuResolution::NotFound, None), None);
        assert_eq!(effective_sku(SkuResolution::Failed, None), None);
    }

    // ── observe_sku ────────────────────────────────────────────────

    #[test]
    fn first_resolution_is_stored_silently() {
        let mut watcher = test_watcher();
        assert_eq!(watcher.observe_sku("SKU-A"), SkuTransition::Initial);
        assert_eq!(watcher.last_known_sku.as_deref(), Some("SKU-A"));
    }

    #[test]
    fn unchanged_sku_does_not_transition() {
        let mut watcher = test_watcher();
        watcher.observe_sku("SKU-A");
        assert_eq!(watcher.observe_sku("SKU-A"), SkuTransition::Unchanged);
        assert_eq!(watcher.last_known_sku.as_deref(), Some("SKU-A"));
    }

    #[test]
    fn changed_sku_yields_exactly_one_transition_with_old_value() {
        let mut watcher = test_watcher();
        watcher.observe_sku("SKU-A");
        assert_eq!(
            watcher.observe_sku("SKU-B"),
            SkuTransition::Changed {
                old: "SKU-A".to_string()
            }
        );
        assert_eq!(watcher.last_known_sku.as_deref(), Some("SKU-B"));
        // next round with the same value settles back to unchanged
        assert_eq!(watcher.observe_sku("SKU-B"), SkuTransition::Unchanged);
    }

    // ── build_targets ──────────────────────────────────────────────

    #[test]
    fn targets_rebuilt_from_sku_and_locales() {
        let config = test_config();
        let targets = build_targets(&config, "PRO5090FE");
        assert_eq!(targets.len(), 2);
        assert_eq!(targets[0].locale, "nl-nl");
        assert!(targets[0].url.contains("skus=PRO5090FE"));
        assert!(targets[0].url.contains("locale=nl-nl"));
        assert_eq!(targets[0].message, "Te koop in NEDERLAND!");
        assert!(targets[1].url.contains("locale=de-de"));
    }
}
