//! # folio_core
//!
//! Shared building blocks for the Folio client.
//!
//! Folio uploads a document to a content service, receives the roster of
//! characters found in it, and holds a turn-based conversation with one of
//! them. This crate owns the pieces every other crate agrees on:
//!
//! - **Outcomes**: [`Outcome`], [`Failure`] and [`FailureKind`], the typed
//!   results that replace thrown errors at the network boundary
//! - **Data model**: [`Document`], [`CharacterRoster`], [`Message`], [`Speaker`]
//! - **Configuration**: [`ClientConfig`], layered from defaults, a TOML file,
//!   and `FOLIO_*` environment variables

pub mod config;
pub mod error;
pub mod types;

pub use config::{ClientConfig, ENV_BASE_URL, ENV_TIMEOUT_SECS};
pub use error::{ConfigError, ConfigResult, Failure, FailureKind, Outcome};
pub use types::{
    CharacterRoster, ChatReply, Document, DocumentPolicy, IngestReport, IngestSource, Message,
    Speaker,
};
