//! postrelay binary entry point.
//!
//! Usage: postrelay [--config <file>] [--base-dir <dir>] [--listen <addr>]
//!
//! Settings come from `~/.postrelay/config.json` (or `--config`), then the
//! environment, then these flags.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use post_store::PostStore;
use postrelay_core::{init_logging, Config, Paths};
use postrelay_server::{build_router, AppState};
use relay_outbox::{DiscordSender, QueueWorker, SenderConfig, WorkerConfig};
use tracing::{info, warn};

/// postrelay: stores posted notices and relays website posts to Discord.
#[derive(Parser, Debug)]
#[command(name = "postrelay")]
#[command(about = "Post ingestion gateway with rate-limit-aware channel relay")]
struct Args {
    /// Config file. Defaults to <base-dir>/config.json.
    #[arg(long, env = "POSTRELAY_CONFIG")]
    config: Option<PathBuf>,

    /// Directory for config, database and logs (default ~/.postrelay).
    #[arg(long, env = "POSTRELAY_HOME")]
    base_dir: Option<PathBuf>,

    /// Listen address, e.g. 0.0.0.0:5000.
    #[arg(long)]
    listen: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    /// Directory of static client files.
    #[arg(long)]
    static_dir: Option<PathBuf>,
}

fn load_config(args: &Args, paths: &Paths) -> anyhow::Result<Config> {
    let mut config = match &args.config {
        Some(path) => {
            let mut config = Config::load_from_file(path)
                .with_context(|| format!("failed to read config {}", path.display()))?;
            config.load_from_env();
            config
        }
        None => Config::load(paths)?,
    };

    if let Some(listen) = &args.listen {
        config.server.listen_addr = listen.clone();
    }
    if let Some(level) = &args.log_level {
        config.log_level = level.clone();
    }
    if let Some(dir) = &args.static_dir {
        config.server.static_dir = Some(dir.clone());
    }

    config.validate()?;
    Ok(config)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Received shutdown signal, exiting...");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let paths = match &args.base_dir {
        Some(dir) => Paths::with_base_dir(dir.clone()),
        None => Paths::new()?,
    };
    let config = load_config(&args, &paths)?;

    init_logging(&paths, &config.log_level)?;
    info!("postrelay starting...");

    for warning in config.warnings() {
        warn!(warning = %warning, "Relay configuration incomplete");
    }

    let database_path = config.database_path(&paths);
    let store = PostStore::open(&database_path, config.store.max_posts).await?;

    let sender = Arc::new(DiscordSender::new(SenderConfig::from_discord(&config.discord))?);
    let worker = QueueWorker::new(sender, WorkerConfig::from_queue(&config.queue));

    let state = AppState::new(store.clone(), worker.clone());
    let app = build_router(state, &config.server)?;

    let addr = config.listen_addr()?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;

    info!(
        listen = %addr,
        database = %store.path(),
        max_posts = store.max_posts(),
        channels = config.discord.channels.len(),
        max_attempts = config.queue.max_attempts,
        "Configuration loaded"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    let status = worker.status().await;
    if status.pending > 0 || status.running {
        warn!(
            pending = status.pending,
            "Exiting with posts still queued for relay; they will not be delivered"
        );
    }

    store.close().await?;
    Ok(())
}
