use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::{info, warn};

use nvidia_dropwatch::config::{AppConfig, CONFIG_PATH, NotifyConfig};
use nvidia_dropwatch::notify::Notifier;
use nvidia_dropwatch::watcher::Watcher;

#[derive(Parser)]
#[command(name = "dropwatch", about = "Storefront availability watcher")]
struct Args {
    /// Path to the config file
    #[arg(long, default_value = CONFIG_PATH)]
    config: PathBuf,

    /// Run a single polling round and exit (smoke test)
    #[arg(long)]
    once: bool,
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

    dotenvy::dotenv().ok();
    let args = Args::parse();

    let config = AppConfig::load(&args.config)?;
    info!("Loaded config from {}", args.config.display());

    let notifier = Notifier::new(NotifyConfig::from_env())?;
    if notifier.sink_count() == 0 {
        warn!("No notification sinks configured; detections will only be logged");
    } else {
        info!("{} notification target(s) configured", notifier.sink_count());
    }
    notifier.send_startup_probe(&config.product.name).await;

    let mut watcher = Watcher::new(config, notifier);
    watcher.run(args.once).await;

    Ok(())
}
