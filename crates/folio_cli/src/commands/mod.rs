//! CLI command definitions.
//!
//! Each subcommand is a thin wrapper: it builds the transport from the
//! resolved configuration, drives a controller, and leaves rendering to
//! [`TerminalSink`](crate::terminal::TerminalSink).

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use tracing::debug;

use folio_core::{ClientConfig, Document, IngestSource};

use crate::error::CliError;

pub mod chat;
pub mod ingest;
pub mod ping;

/// Folio - chat with the characters of a book
#[derive(Parser)]
#[command(name = "folio")]
#[command(version, about = "Folio - chat with the characters of a book")]
#[command(long_about = r#"
Folio uploads a document to a character chat service, lists the characters
found in it, and lets you hold a conversation with one of them.

COMMANDS:
  ingest   → Upload a PDF (or a web page) and print its characters
  chat     → Upload, pick a character, and start talking
  ping     → Check that the service is reachable

CONFIGURATION (lowest to highest precedence):
  built-in defaults → --config file → FOLIO_BASE_URL / FOLIO_TIMEOUT_SECS → flags

EXIT CODES:
  0 - Success
  1 - General error
  2 - Invalid arguments
  3 - Configuration error
  4 - Service failure
"#)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Base URL of the content service
    #[arg(long, global = true, value_name = "URL")]
    pub base_url: Option<String>,

    /// Request timeout in seconds
    #[arg(long, global = true, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// TOML config file
    #[arg(long, global = true, env = "FOLIO_CONFIG", value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Defaults, config file and environment, then command-line flags.
    pub fn client_config(&self) -> Result<ClientConfig> {
        let mut config = ClientConfig::load(self.config.as_deref())?;
        if let Some(url) = &self.base_url {
            config = config.base_url(url.as_str());
        }
        if let Some(seconds) = self.timeout {
            config = config.timeout(seconds);
        }
        config.validate()?;
        debug!(
            "Using {} (timeout {}s)",
            config.base_url, config.request_timeout_secs
        );
        Ok(config)
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Upload a document and list its characters
    Ingest(ingest::IngestArgs),

    /// Upload a document and chat with one of its characters
    Chat(chat::ChatArgs),

    /// Check that the content service answers
    Ping(ping::PingArgs),
}

/// Where the document comes from.
#[derive(Args, Debug, Clone)]
pub struct SourceArgs {
    /// PDF file to upload
    #[arg(required_unless_present = "url", conflicts_with = "url")]
    pub file: Option<PathBuf>,

    /// Web page to ingest instead of a file
    #[arg(long, value_name = "URL")]
    pub url: Option<String>,
}

impl SourceArgs {
    pub fn into_source(self) -> Result<IngestSource> {
        match (self.file, self.url) {
            (Some(path), _) => {
                let document = Document::read(&path).map_err(|source| CliError::ReadDocument {
                    path: path.display().to_string(),
                    source,
                })?;
                Ok(IngestSource::File(document))
            }
            (None, Some(url)) => Ok(IngestSource::Url(url)),
            (None, None) => anyhow::bail!("either a file or --url is required"),
        }
    }
}
