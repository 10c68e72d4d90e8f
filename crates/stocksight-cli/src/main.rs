//! Stocksight CLI - terminal shell for the inventory dashboard.
//!
//! Drives the session core the way the web dashboard does: recover the
//! stored session at startup, then log in, log out, or read dashboard data
//! through the authenticated gateway.

mod commands;
mod navigator;

use std::io;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use stocksight_core::{Config, CredentialStore, Role, SessionContext, SessionController};

use commands::Command;
use navigator::TerminalNavigator;

/// Log file name inside the cache directory
const LOG_FILE: &str = "stocksight.log";

/// Initialize the tracing subscriber for logging.
///
/// Returns the appender guard when logging to a file; it must stay alive
/// until exit so buffered lines are flushed.
fn init_tracing(log_dir: Option<&Path>) -> Option<WorkerGuard> {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::never(dir, LOG_FILE);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::registry()
                .with(fmt::layer().with_writer(io::stderr))
                .with(fmt::layer().with_ansi(false).with_writer(writer))
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

fn print_usage() {
    eprintln!("Usage: stocksight [--log-file] <command>");
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  status                               Show who is logged in (default)");
    eprintln!("  login [username]                     Log in with username and password");
    eprintln!("  register <username> <email> <name>   Create an account and log in");
    eprintln!("  demo <{}>          Log into a demo account", role_names());
    eprintln!("  logout                               End the session");
    eprintln!("  dashboard                            Overview, sales trends, stock status and alerts");
    eprintln!("  alerts                               Stock and demand alerts");
    eprintln!("  health                               API and ERP connectivity");
}

fn role_names() -> String {
    Role::ALL
        .iter()
        .map(|r| r.as_str())
        .collect::<Vec<_>>()
        .join("|")
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let mut args: Vec<String> = std::env::args().skip(1).collect();
    let log_to_file = match args.iter().position(|a| a == "--log-file") {
        Some(i) => {
            args.remove(i);
            true
        }
        None => false,
    };

    let command = match Command::parse(&args) {
        Ok(command) => command,
        Err(e) => {
            eprintln!("Error: {}\n", e);
            print_usage();
            std::process::exit(2);
        }
    };
    if matches!(command, Command::Help) {
        print_usage();
        return Ok(());
    }

    let mut config = Config::load().context("Failed to load config")?;
    let cache_dir = config.cache_dir()?;

    let guard = if log_to_file {
        std::fs::create_dir_all(&cache_dir).context("Failed to create cache directory")?;
        init_tracing(Some(&cache_dir))
    } else {
        init_tracing(None)
    };
    info!(api = %config.api_base_url, "Stocksight starting");

    let credentials = Arc::new(CredentialStore::open(config.token_storage()?));
    let navigator = Arc::new(TerminalNavigator::new());
    let controller = SessionController::from_config(&config, credentials, navigator)
        .context("Failed to create API client")?;

    let context = SessionContext::new();
    context.provide(Arc::new(controller))?;

    // Nothing identity-dependent runs before recovery settles
    let session = context.session()?;
    session.recover().await;

    let result = commands::run(&context, &mut config, command).await;

    info!("Stocksight shutting down");
    if let Err(e) = result {
        eprintln!("Error: {}", e);
        drop(guard);
        std::process::exit(1);
    }
    drop(guard);
    Ok(())
}
