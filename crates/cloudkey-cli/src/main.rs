//! cloudkey - create, log in to, and log out of a cloud account.
//!
//! The session token is kept in the user's config directory so other
//! commands of the tool run authenticated.

mod prompt;

use std::io;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use cloudkey_core::update::{refresh_update_info, update_notice, CURRENT_VERSION};
use cloudkey_core::{
    api, AccountError, AccountSession, AuthClient, Command, Config, Dispatcher, Updater,
    DEFAULT_LOG_FILTER,
};
use tracing::{debug, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use prompt::TerminalPrompt;

// ============================================================================
// Constants
// ============================================================================

/// Upper bound on the startup update check
const UPDATE_CHECK_TIMEOUT_SECS: u64 = 5;

/// Exit status for an unrecognised command line
const USAGE_EXIT_CODE: u8 = 2;

/// Initialize the tracing subscriber for logging
fn init_tracing() {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    init_tracing();

    match run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<ExitCode> {
    let args: Vec<String> = std::env::args().skip(1).collect();

    // Parsed before anything is loaded or sent
    let command = match Command::from_args(&args) {
        Ok(command) => command,
        Err(e) => {
            eprintln!("{}", e);
            return Ok(ExitCode::from(USAGE_EXIT_CODE));
        }
    };

    let mut config = Config::load().context("Failed to load cloudkey configuration")?;
    let http = api::http_client().context("Failed to build HTTP client")?;

    announce_update(&http, &mut config).await;

    info!(command = %command, "cloudkey starting");
    let session = AccountSession::new(config, AuthClient::new(http));
    let mut dispatcher = Dispatcher::new(session, TerminalPrompt);

    match dispatcher.dispatch(command).await {
        Ok(outcome) => {
            println!("{}", outcome);
            Ok(ExitCode::SUCCESS)
        }
        Err(e @ AccountError::AlreadyAuthenticated(_)) => {
            eprintln!("{}", e);
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => Err(e.into()),
    }
}

/// Print an upgrade notice when a newer release is known. Never fails.
async fn announce_update(http: &reqwest::Client, config: &mut Config) {
    let updater = Updater::new(http.clone(), config);
    let check = refresh_update_info(&updater, config, Utc::now());

    match tokio::time::timeout(Duration::from_secs(UPDATE_CHECK_TIMEOUT_SECS), check).await {
        Ok(Some(info)) => eprintln!("{}", update_notice(CURRENT_VERSION, &info)),
        Ok(None) => {}
        Err(_) => debug!("Update check timed out"),
    }
}
