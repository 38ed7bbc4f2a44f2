//! Mock transport for testing.
//!
//! Provides a scriptable implementation of the [`TransportClient`] trait so
//! controllers can be exercised without a running content service.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::RwLock;
use tokio::sync::{Notify, Semaphore};

use folio_core::{ChatReply, Failure, IngestReport, IngestSource, Outcome};

use crate::transport::TransportClient;

/// Captured call information for verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedCall {
    pub method: String,
    /// `IngestSource::describe()` for ingest calls
    pub source: Option<String>,
    pub character: Option<String>,
    pub message: Option<String>,
}

/// Mock transport for testing.
///
/// Responses are returned in the order they were added, cycling when the
/// list runs out. With [`MockTransport::hold_requests`] every call parks
/// after being recorded until [`MockTransport::release`] lets it finish,
/// which is how tests observe a request in flight.
#[derive(Clone)]
pub struct MockTransport {
    /// Scripted outcomes for ingest calls.
    ingest_responses: Arc<RwLock<Vec<Outcome<IngestReport>>>>,
    ingest_index: Arc<AtomicUsize>,
    /// Scripted outcomes for chat calls.
    chat_responses: Arc<RwLock<Vec<Outcome<ChatReply>>>>,
    chat_index: Arc<AtomicUsize>,
    /// Outcome for health checks.
    health_response: Arc<RwLock<Outcome<String>>>,
    /// Captured calls for verification.
    captured_calls: Arc<RwLock<Vec<CapturedCall>>>,
    /// Whether calls wait on the gate before answering.
    hold: Arc<AtomicBool>,
    gate: Arc<Semaphore>,
    /// Woken every time a call is recorded.
    call_notify: Arc<Notify>,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
    latency: Arc<RwLock<Option<Duration>>>,
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTransport {
    /// Create a new mock transport.
    pub fn new() -> Self {
        Self {
            ingest_responses: Arc::new(RwLock::new(Vec::new())),
            ingest_index: Arc::new(AtomicUsize::new(0)),
            chat_responses: Arc::new(RwLock::new(Vec::new())),
            chat_index: Arc::new(AtomicUsize::new(0)),
            health_response: Arc::new(RwLock::new(Ok("Welcome to Character Chat API".to_string()))),
            captured_calls: Arc::new(RwLock::new(Vec::new())),
            hold: Arc::new(AtomicBool::new(false)),
            gate: Arc::new(Semaphore::new(0)),
            call_notify: Arc::new(Notify::new()),
            in_flight: Arc::new(AtomicUsize::new(0)),
            max_in_flight: Arc::new(AtomicUsize::new(0)),
            latency: Arc::new(RwLock::new(None)),
        }
    }

    /// Add an outcome for the next ingest call.
    pub fn add_ingest(self, outcome: Outcome<IngestReport>) -> Self {
        self.ingest_responses.write().push(outcome);
        self
    }

    /// Add a successful ingest returning the given character names.
    pub fn add_roster(self, names: &[&str]) -> Self {
        let report = IngestReport {
            text_preview: String::new(),
            total_chars: 0,
            characters: names.to_vec().into(),
        };
        self.add_ingest(Ok(report))
    }

    /// Add an outcome for the next chat call.
    pub fn add_chat(self, outcome: Outcome<ChatReply>) -> Self {
        self.chat_responses.write().push(outcome);
        self
    }

    /// Add a successful chat reply.
    pub fn add_reply(self, reply: impl Into<String>) -> Self {
        self.add_chat(Ok(ChatReply {
            reply: reply.into(),
        }))
    }

    /// Add a failed chat turn.
    pub fn add_chat_failure(self, failure: Failure) -> Self {
        self.add_chat(Err(failure))
    }

    /// Set the health check outcome.
    pub fn with_health(self, outcome: Outcome<String>) -> Self {
        *self.health_response.write() = outcome;
        self
    }

    /// Delay every answer by the given duration.
    pub fn with_latency(self, latency: Duration) -> Self {
        *self.latency.write() = Some(latency);
        self
    }

    /// Park every call until [`MockTransport::release`] is called.
    pub fn hold_requests(self) -> Self {
        self.hold.store(true, Ordering::SeqCst);
        self
    }

    /// Let one parked call finish.
    pub fn release(&self) {
        self.gate.add_permits(1);
    }

    /// Let `n` parked calls finish.
    pub fn release_many(&self, n: usize) {
        self.gate.add_permits(n);
    }

    /// Wait until at least `n` calls have been recorded.
    pub async fn wait_for_calls(&self, n: usize) {
        loop {
            let notified = self.call_notify.notified();
            if self.call_count() >= n {
                return;
            }
            notified.await;
        }
    }

    /// Clear all captured calls.
    pub fn clear_calls(&self) {
        self.captured_calls.write().clear();
    }

    /// Get all captured calls.
    pub fn get_calls(&self) -> Vec<CapturedCall> {
        self.captured_calls.read().clone()
    }

    /// Get the number of calls made.
    pub fn call_count(&self) -> usize {
        self.captured_calls.read().len()
    }

    /// Check if a specific method was called.
    pub fn was_called(&self, method: &str) -> bool {
        self.captured_calls.read().iter().any(|c| c.method == method)
    }

    /// Get calls to a specific method.
    pub fn get_method_calls(&self, method: &str) -> Vec<CapturedCall> {
        self.captured_calls
            .read()
            .iter()
            .filter(|c| c.method == method)
            .cloned()
            .collect()
    }

    /// Requests currently between "recorded" and "answered".
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Highest number of simultaneous requests seen so far.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    /// Record a call and wake anyone waiting on the call count.
    fn record_call(&self, call: CapturedCall) {
        self.captured_calls.write().push(call);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        self.call_notify.notify_waiters();
    }

    /// Wait for the gate and the configured latency, then mark the call done.
    async fn finish_call(&self) {
        if self.hold.load(Ordering::SeqCst) {
            if let Ok(permit) = self.gate.acquire().await {
                permit.forget();
            }
        }
        let latency = *self.latency.read();
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }

    fn next<T: Clone>(responses: &RwLock<Vec<Outcome<T>>>, index: &AtomicUsize) -> Option<Outcome<T>> {
        let responses = responses.read();
        if responses.is_empty() {
            return None;
        }
        let i = index.fetch_add(1, Ordering::SeqCst);
        responses.get(i % responses.len()).cloned()
    }
}

#[async_trait]
impl TransportClient for MockTransport {
    async fn ingest(&self, source: IngestSource) -> Outcome<IngestReport> {
        self.record_call(CapturedCall {
            method: "ingest".to_string(),
            source: Some(source.describe()),
            character: None,
            message: None,
        });
        drop(source);

        let outcome = Self::next(&self.ingest_responses, &self.ingest_index)
            .unwrap_or_else(|| Ok(IngestReport::default()));
        self.finish_call().await;
        outcome
    }

    async fn send_chat_turn(&self, character: &str, message: &str) -> Outcome<ChatReply> {
        self.record_call(CapturedCall {
            method: "send_chat_turn".to_string(),
            source: None,
            character: Some(character.to_string()),
            message: Some(message.to_string()),
        });

        let outcome = Self::next(&self.chat_responses, &self.chat_index).unwrap_or_else(|| {
            Ok(ChatReply {
                reply: format!("{} has nothing to say.", character),
            })
        });
        self.finish_call().await;
        outcome
    }

    async fn health(&self) -> Outcome<String> {
        self.record_call(CapturedCall {
            method: "health".to_string(),
            source: None,
            character: None,
            message: None,
        });
        let outcome = self.health_response.read().clone();
        self.finish_call().await;
        outcome
    }
}
