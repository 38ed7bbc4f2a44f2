//! Payloads exchanged with the content service.
//!
//! Response types are lenient: absent or null fields decode to `None` or a
//! default, and the transport decides which of those are errors.

use serde::{Deserialize, Serialize};

use folio_core::{CharacterRoster, IngestReport};

/// Multipart field carrying the document bytes.
pub const UPLOAD_FILE_FIELD: &str = "file";
/// Multipart field carrying a URL for the service to fetch.
pub const UPLOAD_URL_FIELD: &str = "url";

/// `POST /upload` response body.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct UploadResponse {
    #[serde(default)]
    pub text_preview: Option<String>,
    #[serde(default)]
    pub total_chars: Option<u64>,
    #[serde(default)]
    pub characters: Option<Vec<String>>,
}

impl From<UploadResponse> for IngestReport {
    fn from(response: UploadResponse) -> Self {
        Self {
            text_preview: response.text_preview.unwrap_or_default(),
            total_chars: response.total_chars.unwrap_or_default(),
            characters: CharacterRoster::new(response.characters.unwrap_or_default()),
        }
    }
}

/// `POST /chat` request body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ChatRequest {
    pub character: String,
    pub message: String,
}

/// `POST /chat` response body.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub reply: Option<String>,
}

/// `GET /` response body.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct WelcomeResponse {
    #[serde(default)]
    pub message: Option<String>,
}
