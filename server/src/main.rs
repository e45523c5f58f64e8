//! EAVStore HTTP server.
//!
//! Usage:
//!   eavstore-server --database data/eavstore.db --port 8080
//!
//! Every flag can also come from an `EAVSTORE_*` environment variable
//! (booleans take `true`/`false`).

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use eavstore_server::{build_router, AppState};
use eavstore_store::{EavStore, ValidationMode};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "eavstore-server")]
#[command(about = "Entity-attribute-value store over HTTP")]
struct Args {
    /// Address to bind
    #[arg(long, env = "EAVSTORE_HOST", default_value = "127.0.0.1")]
    host: String,

    /// Port to listen on
    #[arg(short, long, env = "EAVSTORE_PORT", default_value = "8080")]
    port: u16,

    /// Path to the SQLite database file
    #[arg(short, long, env = "EAVSTORE_DATABASE", default_value = "eavstore.db")]
    database: PathBuf,

    /// Keep everything in memory; nothing survives a restart
    #[arg(long, env = "EAVSTORE_IN_MEMORY")]
    in_memory: bool,

    /// Reject instance writes naming unknown properties instead of dropping them
    #[arg(long, env = "EAVSTORE_STRICT_PROPERTIES")]
    strict_properties: bool,

    /// Enable verbose debug logging
    #[arg(short, long, env = "EAVSTORE_VERBOSE")]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // RUST_LOG wins over --verbose when set.
    let default_level = if args.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();

    let store = if args.in_memory {
        warn!("using an in-memory database; data is lost on exit");
        EavStore::open_in_memory().context("failed to open in-memory database")?
    } else {
        EavStore::open(&args.database)
            .with_context(|| format!("failed to open database {}", args.database.display()))?
    };

    let mode = if args.strict_properties {
        ValidationMode::Strict
    } else {
        ValidationMode::Lenient
    };
    let app = build_router(AppState::new(store, mode));

    let addr = format!("{}:{}", args.host, args.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(%addr, ?mode, "EAVStore API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    info!("shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("failed to listen for ctrl-c: {e}");
        std::future::pending::<()>().await;
    }
}
