//! Document ingestion controller.
//!
//! Drives `Idle -> Uploading -> (RosterReady | Failed) -> Idle` and reports
//! every transition to a [`PresentationSink`].

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info};

use folio_core::{
    CharacterRoster, Document, DocumentPolicy, Failure, IngestReport, IngestSource, Outcome,
};
use folio_transport::TransportClient;

use crate::events::{IngestionState, PresentationSink};

#[derive(Debug, Default)]
struct IngestionInner {
    state: IngestionState,
    report: Option<IngestReport>,
    last_error: Option<String>,
}

/// Uploads documents and turns the service answer into a character roster.
pub struct IngestionController {
    transport: Arc<dyn TransportClient>,
    sink: Arc<dyn PresentationSink>,
    policy: DocumentPolicy,
    inner: Mutex<IngestionInner>,
}

impl IngestionController {
    pub fn new(
        transport: Arc<dyn TransportClient>,
        sink: Arc<dyn PresentationSink>,
        policy: DocumentPolicy,
    ) -> Self {
        Self {
            transport,
            sink,
            policy,
            inner: Mutex::new(IngestionInner::default()),
        }
    }

    /// Upload a document and wait for the roster.
    ///
    /// The document is consumed by this call and dropped once the request
    /// has completed, whatever the outcome.
    pub async fn start_upload(&self, document: Document) -> Outcome<IngestReport> {
        self.ingest(IngestSource::File(document)).await
    }

    /// Ask the service to fetch and ingest a web page.
    pub async fn start_url_ingest(&self, url: impl Into<String>) -> Outcome<IngestReport> {
        self.ingest(IngestSource::Url(url.into())).await
    }

    /// Shared flow behind [`Self::start_upload`] and [`Self::start_url_ingest`].
    ///
    /// Returns `Busy` while another ingestion is running and
    /// `InvalidDocument` when the source violates the policy; neither touches
    /// state nor reaches the transport.
    pub async fn ingest(&self, source: IngestSource) -> Outcome<IngestReport> {
        {
            let mut inner = self.inner.lock();
            if inner.state == IngestionState::Uploading {
                debug!("Rejected ingestion of {}: upload in progress", source.describe());
                return Err(Failure::busy("an upload is already in progress"));
            }
            if let Err(failure) = self.policy.check(&source) {
                debug!("Rejected ingestion of {}: {}", source.describe(), failure);
                return Err(failure);
            }
            inner.state = IngestionState::Uploading;
            inner.report = None;
            inner.last_error = None;
        }

        let _busy = BusyGuard::engage(self);
        debug!("Ingesting {}", source.describe());

        let outcome = self.transport.ingest(source).await;

        match &outcome {
            Ok(report) => {
                {
                    let mut inner = self.inner.lock();
                    inner.state = IngestionState::RosterReady;
                    inner.report = Some(report.clone());
                }
                info!(
                    "Roster ready: {} characters from {} chars of text",
                    report.characters.len(),
                    report.total_chars
                );
                self.sink
                    .on_ingestion_state_changed(IngestionState::RosterReady);
                self.sink.on_roster_ready(&report.characters);
            }
            Err(failure) => {
                let summary = failure.summary();
                {
                    let mut inner = self.inner.lock();
                    inner.state = IngestionState::Failed;
                    inner.last_error = Some(summary.clone());
                }
                debug!("Ingestion failed: {}", failure);
                self.sink.on_ingestion_state_changed(IngestionState::Failed);
                self.sink.on_error(&failure.kind, &summary);

                self.inner.lock().state = IngestionState::Idle;
                self.sink.on_ingestion_state_changed(IngestionState::Idle);
            }
        }

        outcome
    }

    /// Drop a held roster and return to `Idle`.
    ///
    /// Does nothing while an upload is running.
    pub fn reset(&self) {
        let changed = {
            let mut inner = self.inner.lock();
            if inner.state == IngestionState::Uploading {
                return;
            }
            let changed = inner.state != IngestionState::Idle;
            inner.state = IngestionState::Idle;
            inner.report = None;
            inner.last_error = None;
            changed
        };
        if changed {
            self.sink.on_ingestion_state_changed(IngestionState::Idle);
        }
    }

    pub fn state(&self) -> IngestionState {
        self.inner.lock().state
    }

    pub fn is_busy(&self) -> bool {
        self.state() == IngestionState::Uploading
    }

    /// Roster from the last successful ingestion, until [`Self::reset`].
    pub fn roster(&self) -> Option<CharacterRoster> {
        self.inner
            .lock()
            .report
            .as_ref()
            .map(|report| report.characters.clone())
    }

    pub fn report(&self) -> Option<IngestReport> {
        self.inner.lock().report.clone()
    }

    /// Summary of the last failed ingestion.
    pub fn last_error(&self) -> Option<String> {
        self.inner.lock().last_error.clone()
    }

    pub fn policy(&self) -> &DocumentPolicy {
        &self.policy
    }
}

/// Holds the busy flag up for one ingestion.
///
/// Dropping it clears the flag. If the ingestion future was dropped before
/// the transport answered, the state is still `Uploading` and is put back to
/// `Idle` here.
struct BusyGuard<'a> {
    controller: &'a IngestionController,
}

impl<'a> BusyGuard<'a> {
    fn engage(controller: &'a IngestionController) -> Self {
        controller
            .sink
            .on_ingestion_state_changed(IngestionState::Uploading);
        controller.sink.on_busy_changed(true);
        Self { controller }
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        let abandoned = {
            let mut inner = self.controller.inner.lock();
            if inner.state == IngestionState::Uploading {
                inner.state = IngestionState::Idle;
                true
            } else {
                false
            }
        };
        if abandoned {
            debug!("Ingestion abandoned before the service answered");
            self.controller
                .sink
                .on_ingestion_state_changed(IngestionState::Idle);
        }
        self.controller.sink.on_busy_changed(false);
    }
}
