//! Core data model: documents, rosters, and transcript messages.

use std::fmt;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Failure, Outcome};

/// A document picked by the user, held only for the duration of one upload.
#[derive(Clone, PartialEq, Eq)]
pub struct Document {
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl Document {
    pub fn new(filename: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            filename: filename.into(),
            bytes: bytes.into(),
        }
    }

    /// Read a document from disk, keeping only the file name.
    pub fn read(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self { filename, bytes })
    }

    /// Lowercased extension of the file name, if any.
    pub fn extension(&self) -> Option<String> {
        Path::new(&self.filename)
            .extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

// Payloads can be megabytes; keep them out of debug output and logs.
impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("filename", &self.filename)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// What to ingest: an uploaded file or a web page the service fetches itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestSource {
    File(Document),
    Url(String),
}

impl IngestSource {
    /// Short label for logs.
    pub fn describe(&self) -> String {
        match self {
            Self::File(doc) => format!("file {} ({} bytes)", doc.filename, doc.len()),
            Self::Url(url) => format!("url {}", url),
        }
    }
}

/// Upload rules enforced on the client before a document leaves the process.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentPolicy {
    /// Accepted file extensions, lowercase, without the dot
    pub extensions: Vec<String>,
    /// Largest payload accepted, in bytes
    pub max_bytes: usize,
}

impl Default for DocumentPolicy {
    fn default() -> Self {
        Self {
            extensions: vec!["pdf".to_string()],
            max_bytes: 50 * 1024 * 1024,
        }
    }
}

impl DocumentPolicy {
    pub fn extension(mut self, ext: impl Into<String>) -> Self {
        self.extensions.push(ext.into().trim_start_matches('.').to_lowercase());
        self
    }

    pub fn max_bytes(mut self, bytes: usize) -> Self {
        self.max_bytes = bytes;
        self
    }

    /// Validate an ingestion source against this policy.
    pub fn check(&self, source: &IngestSource) -> Outcome<()> {
        match source {
            IngestSource::File(doc) => self.check_document(doc),
            IngestSource::Url(url) => check_url(url),
        }
    }

    pub fn check_document(&self, doc: &Document) -> Outcome<()> {
        if doc.is_empty() {
            return Err(Failure::invalid_document(format!(
                "{} is empty",
                doc.filename
            )));
        }
        if doc.len() > self.max_bytes {
            return Err(Failure::invalid_document(format!(
                "{} is {} bytes, limit is {}",
                doc.filename,
                doc.len(),
                self.max_bytes
            )));
        }
        match doc.extension() {
            Some(ext) if self.extensions.iter().any(|allowed| *allowed == ext) => Ok(()),
            _ => Err(Failure::invalid_document(format!(
                "{} is not a supported document (expected: {})",
                doc.filename,
                self.extensions.join(", ")
            ))),
        }
    }
}

fn check_url(url: &str) -> Outcome<()> {
    let url = url.trim();
    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(())
    } else {
        Err(Failure::invalid_document(format!(
            "'{}' is not an http(s) address",
            url
        )))
    }
}

/// Ordered, immutable list of character names extracted from a document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CharacterRoster(Vec<String>);

impl CharacterRoster {
    pub fn new(names: Vec<String>) -> Self {
        Self(names)
    }

    pub fn names(&self) -> &[String] {
        &self.0
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.iter().any(|n| n == name)
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.0.get(index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl From<Vec<String>> for CharacterRoster {
    fn from(names: Vec<String>) -> Self {
        Self(names)
    }
}

impl<'a> From<Vec<&'a str>> for CharacterRoster {
    fn from(names: Vec<&'a str>) -> Self {
        Self(names.into_iter().map(str::to_string).collect())
    }
}

/// Everything the service returns for a successful ingestion.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestReport {
    pub text_preview: String,
    pub total_chars: u64,
    pub characters: CharacterRoster,
}

/// Reply text for one chat turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatReply {
    pub reply: String,
}

/// Who authored a transcript entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Speaker {
    User,
    Character(String),
    System,
}

impl Speaker {
    /// Transcript tag: `user`, `system`, or the character's name.
    pub fn as_str(&self) -> &str {
        match self {
            Self::User => "user",
            Self::Character(name) => name,
            Self::System => "system",
        }
    }

    pub fn is_user(&self) -> bool {
        *self == Self::User
    }

    pub fn is_system(&self) -> bool {
        *self == Self::System
    }
}

impl fmt::Display for Speaker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for Speaker {
    fn from(value: String) -> Self {
        match value.as_str() {
            "user" => Self::User,
            "system" => Self::System,
            _ => Self::Character(value),
        }
    }
}

impl From<Speaker> for String {
    fn from(value: Speaker) -> Self {
        match value {
            Speaker::Character(name) => name,
            other => other.as_str().to_string(),
        }
    }
}

/// A single transcript entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Unique message ID (UUID)
    pub id: String,
    /// Author of the entry
    pub speaker: Speaker,
    /// Entry text
    pub text: String,
    /// When the entry was appended
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

impl Message {
    pub fn new(speaker: Speaker, text: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            speaker,
            text: text.into(),
            created_at: Utc::now(),
        }
    }

    /// Create a new user message
    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Speaker::User, text)
    }

    /// Create a new character message
    pub fn character(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(Speaker::Character(name.into()), text)
    }

    /// Create a new system message
    pub fn system(text: impl Into<String>) -> Self {
        Self::new(Speaker::System, text)
    }
}
