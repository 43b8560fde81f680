//! netsweep Daemon - Main entry point
//!
//! Serves subnet sweeps as event streams, or runs a single sweep from the
//! command line.

mod api;
mod config;
mod server;
mod state;

use anyhow::Result;
use clap::Parser;
use futures_util::StreamExt;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser, Debug)]
#[command(name = "netsweep")]
#[command(about = "Discover live hosts on the local /24 subnet")]
#[command(version)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "netsweep.toml")]
    config: PathBuf,

    /// Bind address for web server
    #[arg(short, long)]
    bind: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Run a single sweep, print one line per host, and exit
    #[arg(long)]
    scan_once: bool,

    /// Write a default configuration file to --config and exit
    #[arg(long)]
    init_config: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // RUST_LOG takes precedence over --log-level
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(args.log_level.to_lowercase()));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    info!("netsweep v{}", env!("CARGO_PKG_VERSION"));

    if args.init_config {
        config::save_default_config(&args.config)?;
        info!(path = %args.config.display(), "Wrote default configuration");
        return Ok(());
    }

    let mut config = config::load_config(&args.config)?;

    if let Some(bind) = args.bind {
        config.daemon.bind = bind;
    }

    let scanner_config = config.to_scanner_config();
    info!(
        base = ?scanner_config.base_address,
        platform = ?scanner_config.platform,
        concurrency = scanner_config.concurrency,
        "Configuration loaded"
    );

    let state = state::AppState::new(config.clone());

    if args.scan_once {
        scan_once(&state).await
    } else {
        server::run(state, &config.daemon.bind).await
    }
}

/// Print every discovered host until the sweep ends or Ctrl-C is pressed
async fn scan_once(state: &state::AppState) -> Result<()> {
    let cancel = CancellationToken::new();
    let mut records = state.scanner.scan_with_cancel(cancel.clone());

    let interrupted = tokio::signal::ctrl_c();
    tokio::pin!(interrupted);

    loop {
        tokio::select! {
            record = records.next() => match record {
                Some(record) => println!("{}", record),
                None => break,
            },
            _ = &mut interrupted => {
                warn!("Interrupted, cancelling sweep");
                cancel.cancel();
                break;
            }
        }
    }

    Ok(())
}
