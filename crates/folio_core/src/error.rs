//! Error and outcome types shared by the transport and the controllers.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result of a network-facing operation.
///
/// Failures are values, never panics: the transport converts every fault into
/// a [`Failure`] and the owning controller decides what to do with it.
pub type Outcome<T> = Result<T, Failure>;

/// Result type alias for configuration loading.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Classification of a failed operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailureKind {
    /// The service could not be reached (DNS, refused connection, reset).
    NetworkUnreachable,
    /// The request exceeded the configured timeout.
    Timeout,
    /// The service answered with a non-2xx status.
    NonSuccessStatus(u16),
    /// The body could not be decoded or lacked a required field.
    MalformedResponse,
    /// Another request is already in flight for this controller.
    Busy,
    /// The message was empty after trimming.
    EmptyInput,
    /// The document violates the upload policy.
    InvalidDocument,
    /// The character is not part of the current roster.
    UnknownCharacter,
}

impl FailureKind {
    /// Whether this failure came back from the network rather than from a
    /// local precondition check.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::NetworkUnreachable
                | Self::Timeout
                | Self::NonSuccessStatus(_)
                | Self::MalformedResponse
        )
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NetworkUnreachable => write!(f, "NetworkUnreachable"),
            Self::Timeout => write!(f, "Timeout"),
            Self::NonSuccessStatus(code) => write!(f, "NonSuccessStatus({})", code),
            Self::MalformedResponse => write!(f, "MalformedResponse"),
            Self::Busy => write!(f, "Busy"),
            Self::EmptyInput => write!(f, "EmptyInput"),
            Self::InvalidDocument => write!(f, "InvalidDocument"),
            Self::UnknownCharacter => write!(f, "UnknownCharacter"),
        }
    }
}

/// A failed operation: what kind of failure, plus a human-readable detail.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind}: {detail}")]
pub struct Failure {
    pub kind: FailureKind,
    pub detail: String,
}

impl Failure {
    pub fn new(kind: FailureKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
        }
    }

    pub fn network(detail: impl Into<String>) -> Self {
        Self::new(FailureKind::NetworkUnreachable, detail)
    }

    pub fn timeout(detail: impl Into<String>) -> Self {
        Self::new(FailureKind::Timeout, detail)
    }

    pub fn status(code: u16, detail: impl Into<String>) -> Self {
        Self::new(FailureKind::NonSuccessStatus(code), detail)
    }

    pub fn malformed(detail: impl Into<String>) -> Self {
        Self::new(FailureKind::MalformedResponse, detail)
    }

    pub fn busy(detail: impl Into<String>) -> Self {
        Self::new(FailureKind::Busy, detail)
    }

    pub fn empty_input() -> Self {
        Self::new(FailureKind::EmptyInput, "message is empty")
    }

    pub fn invalid_document(detail: impl Into<String>) -> Self {
        Self::new(FailureKind::InvalidDocument, detail)
    }

    pub fn unknown_character(name: &str) -> Self {
        Self::new(
            FailureKind::UnknownCharacter,
            format!("'{}' is not in the current roster", name),
        )
    }

    /// One-line summary suitable for showing to a user.
    pub fn summary(&self) -> String {
        match &self.kind {
            FailureKind::NetworkUnreachable => {
                format!("Could not reach the service [{}]: {}", self.kind, self.detail)
            }
            FailureKind::Timeout => {
                format!("The service took too long to answer [{}]: {}", self.kind, self.detail)
            }
            FailureKind::NonSuccessStatus(_) => {
                format!("The service rejected the request [{}]: {}", self.kind, self.detail)
            }
            FailureKind::MalformedResponse => {
                format!("The service sent an unreadable answer [{}]: {}", self.kind, self.detail)
            }
            _ => format!("[{}] {}", self.kind, self.detail),
        }
    }
}

/// Errors that can occur while loading client configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid base URL '{0}': expected an http:// or https:// address")]
    InvalidBaseUrl(String),

    #[error("Invalid timeout: {0}")]
    InvalidTimeout(String),

    #[error("Invalid environment variable {name}: {message}")]
    InvalidEnv { name: String, message: String },

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(String),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
