//! Transport trait.

use async_trait::async_trait;

use folio_core::{ChatReply, IngestReport, IngestSource, Outcome};

/// Client side of the content service contracts.
///
/// Implementations are stateless and never retry; a failed call is reported
/// once and the caller decides whether to try again.
#[async_trait]
pub trait TransportClient: Send + Sync {
    /// Submit a document (or a URL) and receive the extracted roster.
    ///
    /// The source is consumed; its bytes are gone once the call returns.
    async fn ingest(&self, source: IngestSource) -> Outcome<IngestReport>;

    /// Send one chat message to a character and receive the reply.
    async fn send_chat_turn(&self, character: &str, message: &str) -> Outcome<ChatReply>;

    /// Probe the service root and return its welcome message.
    async fn health(&self) -> Outcome<String>;
}
