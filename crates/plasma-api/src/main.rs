//! # plasma-api — Operator Binary
//!
//! Loads the configuration, opens the ledger, checks it against the root
//! chain, starts the deposit watcher, and serves the HTTP API.
//!
//! The root chain here is the in-memory contract; a JSON-RPC contract client
//! plugs in through the same `RootChain` trait.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use plasma_api::config::{AppConfig, DEFAULT_CONFIG_PATH};
use plasma_api::state::AppState;
use plasma_chain::ChildChain;
use plasma_rootchain::{ensure_synchronized, DepositWatcher, MemoryRootChain, RootChain};

/// Plasma child-chain operator.
#[derive(Parser, Debug)]
#[command(name = "plasma-api", version, about, long_about = None)]
struct Cli {
    /// Path to the JSON configuration file.
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    conf: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let config = AppConfig::load(&cli.conf)
        .with_context(|| format!("loading {}", cli.conf.display()))?;
    tracing::info!(?config, "configuration loaded");

    let operator = Arc::new(config.operator()?);
    let store = config.open_store().context("opening ledger store")?;
    let chain = Arc::new(ChildChain::open(store, config.chain_config())?);
    let root_chain: Arc<dyn RootChain> = Arc::new(MemoryRootChain::new(operator.address()));

    if let Err(e) = ensure_synchronized(root_chain.as_ref(), &chain).await {
        tracing::warn!(error = %e, "child chain starts out of step with root chain");
    }

    let _watcher = DepositWatcher::new(Arc::clone(&chain), Arc::clone(&operator))
        .spawn(root_chain.as_ref())
        .await
        .context("subscribing to deposit events")?;

    let app = plasma_api::app(AppState::new(chain, Arc::clone(&operator), root_chain));

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!(%addr, operator = %operator.address(), "plasma child chain listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
