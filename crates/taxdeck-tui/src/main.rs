//! `taxdeck` — terminal front-end for a remote tax-record service.
//!
//! Loads the tax collection on startup, renders it as a table, and lets the
//! user edit one record at a time through a modal form backed by a
//! read-modify-write save cycle (see `taxdeck-core`).
//!
//! Logs are written to a file (default `/tmp/taxdeck.log`) to avoid
//! corrupting the terminal UI.

mod action;
mod app;
mod component;
mod editor;
mod event;
mod screens;
mod theme;
mod tui;

use std::path::PathBuf;

use clap::Parser;
use color_eyre::eyre::{Result, WrapErr};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use taxdeck_api::{ApiClient, TransportConfig};

use crate::app::App;

/// The service origin the application is deployed against.
const DEFAULT_SERVICE_URL: &str = "https://685013d7e7c42cfd17974a33.mockapi.io";

/// Terminal UI for browsing and editing tax records.
#[derive(Parser, Debug)]
#[command(name = "taxdeck", version, about)]
struct Cli {
    /// Base URL of the tax record service
    #[arg(short = 'u', long, env = "TAXDECK_URL", default_value = DEFAULT_SERVICE_URL)]
    url: String,

    /// Log file path
    #[arg(long, default_value = "/tmp/taxdeck.log")]
    log_file: PathBuf,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// Set up file-based tracing. We MUST NOT log to stdout/stderr — that would
/// corrupt the TUI output. Returns a guard that must be held for the
/// lifetime of the application to ensure logs are flushed.
fn setup_tracing(cli: &Cli) -> WorkerGuard {
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("taxdeck={log_level}")));

    let log_dir = cli
        .log_file
        .parent()
        .unwrap_or(std::path::Path::new("/tmp"));
    let log_filename = cli
        .log_file
        .file_name()
        .unwrap_or(std::ffi::OsStr::new("taxdeck.log"));

    let file_appender = tracing_appender::rolling::never(log_dir, log_filename);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_target(true),
        )
        .init();

    guard
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Install panic/error hooks BEFORE entering the terminal
    tui::install_hooks()?;

    // Tracing to file — hold the guard so logs flush on exit
    let _log_guard = setup_tracing(&cli);

    info!(url = %cli.url, "starting taxdeck");

    let client = ApiClient::new(&cli.url, &TransportConfig::default())
        .wrap_err_with(|| format!("invalid service URL: {}", cli.url))?;

    let mut app = App::new(client);
    app.run().await?;

    Ok(())
}
