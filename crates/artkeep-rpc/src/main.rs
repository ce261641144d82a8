//! Artkeep RPC Server - JSON-RPC backend for the artwork manager UI.
//!
//! This binary provides a JSON-RPC 2.0 server that wraps the artkeep-core
//! library for the browser frontend.

mod handlers;
mod server;
mod wrapper;

use anyhow::{Context, Result};
use artkeep_core::config::NetworkConfig;
use artkeep_core::{ArtkeepApi, PlexProvider};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Notify;
use tracing::{info, warn, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser, Debug)]
#[command(name = "artkeep-rpc")]
#[command(about = "JSON-RPC server for Artkeep")]
struct Args {
    /// Port to listen on (0 = auto-assign)
    #[arg(short, long, default_value = "0")]
    port: u16,

    /// Host to bind to
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Directory holding backups and the operations journal
    #[arg(long, env = "ARTKEEP_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Plex `Metadata` directory (auto-detected when omitted)
    #[arg(long, env = "ARTKEEP_METADATA_ROOT")]
    metadata_root: Option<PathBuf>,

    /// Plex server URL
    #[arg(long, env = "ARTKEEP_PLEX_URL", default_value = NetworkConfig::DEFAULT_PLEX_URL)]
    plex_url: String,

    /// Plex authentication token
    #[arg(long, env = "ARTKEEP_PLEX_TOKEN", hide_env_values = true)]
    plex_token: Option<String>,

    /// Refuse to resolve or delete theme music
    #[arg(long)]
    exclude_themes: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Set up logging; RUST_LOG overrides the flag
    let log_level = if args.debug { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.as_str().to_lowercase()));
    FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .compact()
        .init();

    info!("Starting Artkeep RPC Server");

    let data_dir = match args.data_dir {
        Some(path) => path,
        None => dirs::data_dir()
            .context("No platform data directory; pass --data-dir")?
            .join("artkeep"),
    };
    info!("Data directory: {}", data_dir.display());

    let metadata_root = match args.metadata_root.or_else(detect_metadata_root) {
        Some(path) => path,
        None => anyhow::bail!("Plex metadata directory not found; pass --metadata-root"),
    };
    info!("Plex metadata root: {}", metadata_root.display());

    if args.plex_token.is_none() {
        warn!("No Plex token configured; requests may be rejected");
    }
    let provider = PlexProvider::new(&args.plex_url, args.plex_token, metadata_root)?;

    // Create the API instance
    let api = ArtkeepApi::builder(&data_dir)
        .provider(Arc::new(provider))
        .include_themes(!args.exclude_themes)
        .auto_create_dirs(true)
        .build()?;

    // Start the server
    let shutdown = Arc::new(Notify::new());
    let addr = server::start_server(api, shutdown.clone(), &args.host, args.port).await?;

    // Print port for the parent process to read (intentional stdout for IPC)
    println!("RPC_PORT={}", addr.port());

    info!("RPC server running on {}", addr);

    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            result?;
            info!("Shutdown signal received, exiting");
        }
        _ = shutdown.notified() => {
            info!("Shutdown requested over RPC, exiting");
        }
    }

    Ok(())
}

/// Default Plex `Metadata` locations for the current platform, first existing wins.
fn detect_metadata_root() -> Option<PathBuf> {
    let mut candidates = Vec::new();

    if cfg!(target_os = "windows") {
        if let Some(local) = dirs::data_local_dir() {
            candidates.push(local.join("Plex Media Server").join("Metadata"));
        }
    } else if cfg!(target_os = "macos") {
        if let Some(home) = dirs::home_dir() {
            candidates.push(
                home.join("Library")
                    .join("Application Support")
                    .join("Plex Media Server")
                    .join("Metadata"),
            );
        }
    } else {
        candidates.push(PathBuf::from(
            "/var/lib/plexmediaserver/Library/Application Support/Plex Media Server/Metadata",
        ));
        if let Some(config) = dirs::config_dir() {
            candidates.push(config.join("Plex Media Server").join("Metadata"));
        }
    }

    candidates.into_iter().find(|path| path.is_dir())
}
