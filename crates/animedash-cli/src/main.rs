//! Animedash - a terminal admin console for the anime catalog backend.
//!
//! Logs in with a bearer token (or in demo mode), then manages catalog
//! entries and webhooks and shows health and request analytics.

mod app;
mod cli;
mod ui;
mod utils;

use std::io;
use std::path::Path;
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use animedash_core::ApiError;

use app::App;
use cli::{Cli, Command};

/// Exit code when the backend rejected the stored credential
const EXIT_SESSION_EXPIRED: u8 = 2;

/// Initialize the tracing subscriber for logging.
///
/// Logs go to stderr unless a directory is given, in which case they are
/// written to daily files there. The returned guard flushes the file writer
/// and must live until exit.
fn init_tracing(log_dir: Option<&Path>) -> Option<WorkerGuard> {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "animedash.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::registry()
                .with(fmt::layer().with_writer(writer).with_ansi(false))
                .with(filter)
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::registry()
                .with(fmt::layer().with_writer(io::stderr))
                .with(filter)
                .init();
            None
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let _guard = init_tracing(cli.log_file.as_deref());
    info!("Animedash starting");

    match run(&cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => report(&e),
    }
}

async fn run(cli: &Cli) -> Result<()> {
    let mut app = App::new(cli)?;

    match &cli.command {
        Command::Login(args) => app.login(args).await,
        Command::Logout => app.logout().await,
        Command::Status => app.status(),
        Command::Whoami => app.whoami().await,
        Command::Anime(cmd) => app.anime(cmd).await,
        Command::Webhooks(cmd) => app.webhooks(cmd).await,
        Command::Health { watch } => app.health(*watch).await,
        Command::Analytics => app.analytics().await,
    }
}

/// Print a failed command and pick the exit code.
fn report(err: &anyhow::Error) -> ExitCode {
    match err.downcast_ref::<ApiError>() {
        Some(ApiError::SessionExpired) => {
            eprintln!("Your session has expired or you are not logged in.");
            eprintln!("Run `animedash login` to sign in again.");
            ExitCode::from(EXIT_SESSION_EXPIRED)
        }
        Some(ApiError::Validation { message, errors, .. }) => {
            eprintln!("Error: {}", message);
            if let Some(fields) = errors.as_object() {
                for (field, problems) in fields {
                    eprintln!("  {}: {}", field, problems);
                }
            }
            ExitCode::FAILURE
        }
        _ => {
            error!(error = %err, "Command failed");
            eprintln!("Error: {:#}", err);
            ExitCode::FAILURE
        }
    }
}
