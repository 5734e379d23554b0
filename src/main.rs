//! dropsweep binary: flags, logging, credential bootstrap and the shutdown
//! path around the sweep loop.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{ensure, Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use dropsweep_remote::DropboxFilesClient;
use dropsweep_sweeper::{SweepConfig, Sweeper};

mod auth;

/// Grace period before the first live-mode sweep, giving the operator a
/// chance to abort.
const ABORT_GRACE: Duration = Duration::from_secs(15);

/// Scheduled Dropbox folder janitor
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Dropbox folder to observe and clean, e.g. '/Apps/Netatmo/Your Name'
    #[arg(long, value_name = "FOLDER")]
    path: String,

    /// How often a cleaning pass runs (e.g. '24h', '90m')
    #[arg(long, default_value = "24h", value_parser = humantime::parse_duration)]
    interval: Duration,

    /// Files modified longer ago than this are deleted ('168h' = 7 days)
    #[arg(long, default_value = "168h", value_parser = humantime::parse_duration)]
    file_age: Duration,

    /// Report the files a pass would delete without deleting anything
    #[arg(long)]
    dry: bool,

    /// File where the OAuth token is persisted
    #[arg(long, value_name = "FILE")]
    token_storage: Option<PathBuf>,

    /// Log level
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level)?;

    info!("Starting dropsweep v{}", env!("CARGO_PKG_VERSION"));

    match run(cli).await {
        Ok(()) => Ok(()),
        Err(err) => {
            error!("dropsweep failed: {:#}", err);
            std::process::exit(1);
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    ensure!(!cli.interval.is_zero(), "--interval must be greater than zero");
    ensure!(!cli.file_age.is_zero(), "--file-age must be greater than zero");

    let token_path = match cli.token_storage {
        Some(path) => path,
        None => auth::default_token_path()?,
    };
    let token = auth::obtain_access_token(&token_path)
        .await
        .context("could not obtain a Dropbox access token")?;
    let client = DropboxFilesClient::new(token).context("failed to build the Dropbox client")?;

    let config = SweepConfig {
        folder_path: cli.path,
        max_age: cli.file_age,
        dry_run: cli.dry,
    };

    info!(
        path = %config.folder_path,
        interval = %humantime::format_duration(cli.interval),
        file_age = %humantime::format_duration(cli.file_age),
        "settings"
    );
    if config.dry_run {
        info!("dry run: matching files are reported, nothing is deleted");
    } else {
        warn!(
            "live mode: files will be deleted; waiting {}s before the first sweep (Ctrl-C aborts)",
            ABORT_GRACE.as_secs()
        );
        tokio::select! {
            _ = tokio::time::sleep(ABORT_GRACE) => {}
            signal = shutdown_signal() => {
                let signal = signal?;
                info!(signal, "aborted during the grace period");
                return Ok(());
            }
        }
    }

    let handle = Sweeper::new(Arc::new(client), config).spawn(cli.interval);

    let signal = shutdown_signal().await?;
    info!(signal, "shutting down");
    handle
        .shutdown()
        .await
        .map_err(|err| anyhow::anyhow!("sweep task failed during shutdown: {err}"))?;
    info!("shutdown complete");
    Ok(())
}

/// Resolve when SIGINT or SIGTERM arrives, naming the signal.
async fn shutdown_signal() -> Result<&'static str> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal as unix_signal, SignalKind};

        let mut term =
            unix_signal(SignalKind::terminate()).context("failed to install the SIGTERM handler")?;
        tokio::select! {
            result = signal::ctrl_c() => {
                result.context("failed to listen for SIGINT")?;
                Ok("SIGINT")
            }
            _ = term.recv() => Ok("SIGTERM"),
        }
    }
    #[cfg(not(unix))]
    {
        signal::ctrl_c()
            .await
            .context("failed to listen for Ctrl-C")?;
        Ok("interrupt")
    }
}

fn init_logging(level: &str) -> Result<()> {
    let level: tracing::Level = level.parse().context("Invalid log level")?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level.to_string())),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    Ok(())
}
