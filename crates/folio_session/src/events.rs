//! Controller states and the presentation-facing event surface.
//!
//! Controllers never expose mutable fields. Every state change is pushed to a
//! [`PresentationSink`], and a renderer reacts to those calls instead of
//! polling.

use std::fmt;

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use folio_core::{CharacterRoster, FailureKind, Message};

/// Request state of a chat session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SessionState {
    /// Ready to accept the next message
    Idle,
    /// A chat turn is in flight
    AwaitingReply,
}

impl Default for SessionState {
    fn default() -> Self {
        Self::Idle
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::AwaitingReply => write!(f, "awaiting reply"),
        }
    }
}

/// Lifecycle of a document ingestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum IngestionState {
    /// Nothing uploaded yet, or the last attempt failed
    Idle,
    /// Upload in progress
    Uploading,
    /// A roster is available
    RosterReady,
    /// The last upload failed (transient, followed by `Idle`)
    Failed,
}

impl Default for IngestionState {
    fn default() -> Self {
        Self::Idle
    }
}

impl fmt::Display for IngestionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Uploading => write!(f, "uploading"),
            Self::RosterReady => write!(f, "roster ready"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// Receiver for controller notifications.
///
/// All methods default to no-ops so a renderer only implements what it
/// draws. Calls arrive synchronously and never while a controller holds its
/// internal lock.
///
/// Within one call they arrive in the order the state changed. When calls
/// are issued one at a time from a single task, the events of one turn also
/// end before the next turn's begin. If tasks on a multi-threaded runtime
/// share a controller, a new turn can start between the previous turn's
/// state change and its `Idle` notification, so the sink may see the two
/// turns' events interleaved.
#[cfg_attr(test, mockall::automock)]
pub trait PresentationSink: Send + Sync {
    /// Loading indicator for an ingestion.
    fn on_busy_changed(&self, busy: bool) {
        let _ = busy;
    }

    fn on_roster_ready(&self, roster: &CharacterRoster) {
        let _ = roster;
    }

    /// A transcript entry was appended; a renderer typically scrolls to it.
    fn on_transcript_appended(&self, message: &Message) {
        let _ = message;
    }

    /// `AwaitingReply` is the cue for a "character is typing" indicator.
    fn on_session_state_changed(&self, state: SessionState) {
        let _ = state;
    }

    fn on_ingestion_state_changed(&self, state: IngestionState) {
        let _ = state;
    }

    fn on_error(&self, kind: &FailureKind, summary: &str) {
        let _ = (kind, summary);
    }
}

/// Sink that ignores every notification.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl PresentationSink for NullSink {}

/// A controller notification as a value.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientEvent {
    BusyChanged(bool),
    RosterReady(CharacterRoster),
    TranscriptAppended(Message),
    SessionStateChanged(SessionState),
    IngestionStateChanged(IngestionState),
    Error { kind: FailureKind, summary: String },
}

/// Broadcast sink: publishes every notification as a [`ClientEvent`].
///
/// Cloning the bus clones the sender. Publishing with no subscriber is a
/// no-op; a subscriber that falls more than `capacity` events behind sees a
/// `Lagged` error on its next receive.
pub struct EventBus {
    sender: broadcast::Sender<ClientEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Receive every event published after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<ClientEvent> {
        self.sender.subscribe()
    }

    pub fn publish(&self, event: ClientEvent) {
        let _ = self.sender.send(event);
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}

impl Clone for EventBus {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
        }
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("receiver_count", &self.sender.receiver_count())
            .finish()
    }
}

impl PresentationSink for EventBus {
    fn on_busy_changed(&self, busy: bool) {
        self.publish(ClientEvent::BusyChanged(busy));
    }

    fn on_roster_ready(&self, roster: &CharacterRoster) {
        self.publish(ClientEvent::RosterReady(roster.clone()));
    }

    fn on_transcript_appended(&self, message: &Message) {
        self.publish(ClientEvent::TranscriptAppended(message.clone()));
    }

    fn on_session_state_changed(&self, state: SessionState) {
        self.publish(ClientEvent::SessionStateChanged(state));
    }

    fn on_ingestion_state_changed(&self, state: IngestionState) {
        self.publish(ClientEvent::IngestionStateChanged(state));
    }

    fn on_error(&self, kind: &FailureKind, summary: &str) {
        self.publish(ClientEvent::Error {
            kind: kind.clone(),
            summary: summary.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::broadcast::error::TryRecvError;

    #[test]
    fn test_event_bus_delivers_in_order() {
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();

        bus.on_busy_changed(true);
        bus.on_roster_ready(&CharacterRoster::from(vec!["Alice"]));
        bus.on_busy_changed(false);

        assert_eq!(rx.try_recv().unwrap(), ClientEvent::BusyChanged(true));
        assert_eq!(
            rx.try_recv().unwrap(),
            ClientEvent::RosterReady(CharacterRoster::from(vec!["Alice"]))
        );
        assert_eq!(rx.try_recv().unwrap(), ClientEvent::BusyChanged(false));
        assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
    }

    #[test]
    fn test_event_bus_without_subscribers() {
        let bus = EventBus::default();
        assert_eq!(bus.subscriber_count(), 0);
        bus.on_session_state_changed(SessionState::AwaitingReply);
        bus.on_error(&FailureKind::Timeout, "slow");
    }

    #[test]
    fn test_event_bus_clones_share_channel() {
        let bus = EventBus::new(4);
        let mut rx = bus.subscribe();
        let clone = bus.clone();

        clone.on_ingestion_state_changed(IngestionState::Uploading);
        assert_eq!(
            rx.try_recv().unwrap(),
            ClientEvent::IngestionStateChanged(IngestionState::Uploading)
        );
    }

    #[test]
    fn test_null_sink_accepts_everything() {
        let sink = NullSink;
        sink.on_busy_changed(true);
        sink.on_transcript_appended(&Message::user("hello"));
        sink.on_error(&FailureKind::Busy, "busy");
    }

    #[test]
    fn test_state_display() {
        assert_eq!(SessionState::AwaitingReply.to_string(), "awaiting reply");
        assert_eq!(IngestionState::RosterReady.to_string(), "roster ready");
    }
}
