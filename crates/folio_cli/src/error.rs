//! Errors raised by the command-line layer itself.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Document has no characters to chat with: {0}")]
    NoCharacters(String),

    #[error("Character not found: '{0}' (pick a name or number from the roster)")]
    CharacterNotFound(String),

    #[error("Failed to read {path}: {source}")]
    ReadDocument {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
