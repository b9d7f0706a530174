use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use promostore::config::{Config, LogConfig};
use promostore::loader::Loader;
use promostore::server::{AppState, Server, create_router};
use promostore::store::Store;

/// Command line arguments
#[derive(Parser, Debug)]
#[command(name = "promostore")]
#[command(version, about = "In-memory promotion store served over HTTP")]
struct Args {
    /// TOML configuration file
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Listening address, overrides `server.addr`
    #[arg(long, value_name = "ADDR")]
    addr: Option<String>,

    /// Promotion source file, overrides `source.path`
    #[arg(long, value_name = "PATH")]
    source: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    if let Some(addr) = args.addr {
        config.server.addr = addr;
    }
    if let Some(source) = args.source {
        config.source.path = source;
    }
    config.validate()?;

    init_tracing(&config.log)?;

    info!("Starting promostore");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let store = Arc::new(Store::new());
    let loader = Arc::new(Loader::new(Arc::clone(&store), &config.source.path));

    match loader.reload().await {
        Ok(records) => info!(records, "initial promotion load complete"),
        Err(e) if config.source.required => {
            return Err(e).context("initial promotion load failed");
        }
        Err(e) => warn!("initial promotion load failed, serving no promotions: {}", e),
    }

    let router = create_router(AppState::new(store, loader), config.server.max_upload_bytes);
    let server = Server::bind(&config.server.addr, router)
        .await
        .with_context(|| format!("failed to bind {}", config.server.addr))?;
    info!("Server listening on: {}", server.local_addr());

    server.run().await?;

    Ok(())
}

fn init_tracing(log: &LogConfig) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log.level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true);

    match &log.file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("failed to open log file {}", path.display()))?;
            builder.with_ansi(false).with_writer(Mutex::new(file)).init();
        }
        None => builder.init(),
    }

    Ok(())
}
