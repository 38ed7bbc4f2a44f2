//! # folio_transport
//!
//! Transport to the Folio content service.
//!
//! The service exposes two contracts: `POST /upload` (multipart document
//! ingestion, answered with a character roster) and `POST /chat` (one chat
//! turn with a named character). This crate maps both onto the
//! [`TransportClient`] trait and converts every HTTP outcome into an
//! [`Outcome`](folio_core::Outcome) at the boundary.
//!
//! # Features
//!
//! - **HttpTransport**: reqwest-backed client with configurable timeouts
//! - **MockTransport**: scripted responses, call capture, and a hold gate for
//!   keeping requests in flight during tests
//!
//! # Example
//!
//! ```rust,no_run
//! use folio_core::{ClientConfig, Document, IngestSource};
//! use folio_transport::{HttpTransport, TransportClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let transport = HttpTransport::new(ClientConfig::new("http://127.0.0.1:8000"))?;
//!
//!     let document = Document::read("book.pdf")?;
//!     let report = transport.ingest(IngestSource::File(document)).await?;
//!     println!("Found {} characters", report.characters.len());
//!
//!     let reply = transport.send_chat_turn("Alice", "Who are you?").await?;
//!     println!("{}", reply.reply);
//!     Ok(())
//! }
//! ```

pub mod http;
pub mod mock;
pub mod transport;
pub mod wire;

pub use http::HttpTransport;
pub use mock::{CapturedCall, MockTransport};
pub use transport::TransportClient;
pub use wire::{ChatRequest, ChatResponse, UploadResponse, WelcomeResponse};
