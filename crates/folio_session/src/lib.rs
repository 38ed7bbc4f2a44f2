//! # folio_session
//!
//! Stateful controllers between a presentation layer and the content
//! service.
//!
//! - [`IngestionController`] uploads a document and produces a
//!   [`CharacterRoster`](folio_core::CharacterRoster)
//! - [`ChatSessionController`] holds one conversation with one character and
//!   keeps at most one chat request in flight
//!
//! Both take `&self`, so they can be shared behind an `Arc`, and both report
//! every change to a [`PresentationSink`] instead of exposing mutable state.
//!
//! ```no_run
//! use std::sync::Arc;
//! use folio_core::{ClientConfig, Document, DocumentPolicy};
//! use folio_session::{ChatSessionController, EventBus, IngestionController};
//! use folio_transport::HttpTransport;
//!
//! # async fn run() -> anyhow::Result<()> {
//! let transport = Arc::new(HttpTransport::new(ClientConfig::default())?);
//! let bus = Arc::new(EventBus::default());
//!
//! let ingestion = IngestionController::new(transport.clone(), bus.clone(), DocumentPolicy::default());
//! let report = ingestion.start_upload(Document::read("book.pdf")?).await?;
//!
//! let session = ChatSessionController::new(transport, bus, &report.characters, "Alice")?;
//! session.send("hello").await?;
//! # Ok(())
//! # }
//! ```

pub mod chat;
pub mod events;
pub mod ingestion;

pub use chat::{failure_entry, ChatSessionController, TurnOutcome};
pub use events::{ClientEvent, EventBus, IngestionState, NullSink, PresentationSink, SessionState};
pub use ingestion::IngestionController;
