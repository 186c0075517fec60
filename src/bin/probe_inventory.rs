//! One-shot inventory probe for a single SKU/locale pair, for manual
//! endpoint debugging. Prints the classification to stdout.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::info;

use nvidia_dropwatch::api;
use nvidia_dropwatch::config::{AppConfig, CONFIG_PATH};
use nvidia_dropwatch::proxy::ProxyPool;
use nvidia_dropwatch::types::LocaleTarget;

#[derive(Parser)]
#[command(name = "probe_inventory", about = "Single inventory-status probe")]
struct Args {
    /// Path to the config file (proxies and timing)
    #[arg(long, default_value = CONFIG_PATH)]
    config: PathBuf,

    /// SKU to query
    #[arg(long)]
    sku: String,

    /// Storefront locale, e.g. nl-nl
    #[arg(long)]
    locale: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = AppConfig::load(&args.config)?;

    let mut pool = ProxyPool::from_settings(&config.proxy);
    let proxy = pool.next().clone();
    info!("Probing via proxy {proxy}");

    let client = api::build_client(&proxy, config.timing.request_timeout())?;
    let target = LocaleTarget {
        locale: args.locale.clone(),
        url: api::inventory_url(&args.sku, &args.locale),
        message: String::new(),
    };
    let outcome = api::probe_locale(&client, &target).await;
    println!("{outcome:?}");

    Ok(())
}
