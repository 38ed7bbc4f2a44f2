//! Folio CLI - Main entry point.
//!
//! Exit codes:
//! - 0: Success
//! - 1: General error
//! - 2: Invalid arguments
//! - 3: Configuration error
//! - 4: Service failure

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use folio_core::{ConfigError, Failure};

mod commands;
mod error;
mod terminal;

use commands::{Cli, Commands};
use error::CliError;

/// CI-friendly exit codes
pub struct ExitCodes;

impl ExitCodes {
    pub const SUCCESS: u8 = 0;
    pub const GENERAL_ERROR: u8 = 1;
    pub const INVALID_ARGS: u8 = 2;
    pub const CONFIG_ERROR: u8 = 3;
    pub const SERVICE_FAILURE: u8 = 4;
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Logs go to stderr so they never interleave with the transcript
    let default_filter = if cli.verbose { "folio=debug,warn" } else { "folio=info,warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .try_init();

    let result = match cli.client_config() {
        Ok(config) => match cli.command {
            Commands::Ingest(args) => commands::ingest::execute(args, config).await,
            Commands::Chat(args) => commands::chat::execute(args, config).await,
            Commands::Ping(args) => commands::ping::execute(args, config).await,
        },
        Err(e) => Err(e),
    };

    match result {
        Ok(()) => ExitCode::from(ExitCodes::SUCCESS),
        Err(e) => {
            let exit_code = categorize_error(&e);
            eprintln!("{}", error_message(&e));
            ExitCode::from(exit_code)
        }
    }
}

/// The single line printed for an error that ends the command.
fn error_message(e: &anyhow::Error) -> String {
    match e.downcast_ref::<Failure>() {
        Some(failure) => format!("❌ {}", failure.summary()),
        None => format!("❌ Error: {:#}", e),
    }
}

/// Categorize error to determine exit code
fn categorize_error(e: &anyhow::Error) -> u8 {
    if e.downcast_ref::<ConfigError>().is_some() {
        ExitCodes::CONFIG_ERROR
    } else if let Some(failure) = e.downcast_ref::<Failure>() {
        if failure.kind.is_transport() {
            ExitCodes::SERVICE_FAILURE
        } else {
            ExitCodes::INVALID_ARGS
        }
    } else if let Some(cli_error) = e.downcast_ref::<CliError>() {
        match cli_error {
            CliError::NoCharacters(_) => ExitCodes::GENERAL_ERROR,
            CliError::CharacterNotFound(_) | CliError::ReadDocument { .. } => ExitCodes::INVALID_ARGS,
        }
    } else {
        ExitCodes::GENERAL_ERROR
    }
}
