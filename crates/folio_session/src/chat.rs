//! Chat session controller.
//!
//! One controller owns one conversation with one character. Turns are
//! strictly serialized: a second `send` while a reply is pending is rejected
//! with `Busy` instead of racing the first.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info};

use folio_core::{CharacterRoster, Failure, Message, Outcome, Speaker};
use folio_transport::TransportClient;

use crate::events::{PresentationSink, SessionState};

/// How a turn that reached the service resolved.
///
/// Either way the transcript has gained two entries: the user message and
/// the reply or system failure entry returned here.
#[derive(Debug, Clone, PartialEq)]
pub enum TurnOutcome {
    Replied(Message),
    Failed(Failure),
}

impl TurnOutcome {
    pub fn is_replied(&self) -> bool {
        matches!(self, Self::Replied(_))
    }

    pub fn reply(&self) -> Option<&Message> {
        match self {
            Self::Replied(message) => Some(message),
            Self::Failed(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&Failure> {
        match self {
            Self::Replied(_) => None,
            Self::Failed(failure) => Some(failure),
        }
    }
}

#[derive(Debug, Default)]
struct SessionInner {
    state: SessionState,
    transcript: Vec<Message>,
}

/// Conversation with a single character.
pub struct ChatSessionController {
    character: String,
    transport: Arc<dyn TransportClient>,
    sink: Arc<dyn PresentationSink>,
    inner: Mutex<SessionInner>,
}

impl ChatSessionController {
    /// Open a session with `character`, which must be in `roster`.
    pub fn new(
        transport: Arc<dyn TransportClient>,
        sink: Arc<dyn PresentationSink>,
        roster: &CharacterRoster,
        character: &str,
    ) -> Outcome<Self> {
        if !roster.contains(character) {
            return Err(Failure::unknown_character(character));
        }
        debug!("Opened chat session with {}", character);
        Ok(Self {
            character: character.to_string(),
            transport,
            sink,
            inner: Mutex::new(SessionInner::default()),
        })
    }

    /// Send one user message and wait for the turn to resolve.
    ///
    /// `Err` means the call was rejected (`Busy` or `EmptyInput`) and nothing
    /// changed. Transport failures are not errors here: they come back as
    /// [`TurnOutcome::Failed`] after being recorded in the transcript.
    pub async fn send(&self, text: &str) -> Result<TurnOutcome, Failure> {
        let user_message = {
            let mut inner = self.inner.lock();
            if inner.state == SessionState::AwaitingReply {
                debug!("Rejected message to {}: reply pending", self.character);
                return Err(Failure::busy(format!(
                    "still waiting for {} to reply",
                    self.character
                )));
            }
            if text.trim().is_empty() {
                return Err(Failure::empty_input());
            }
            let message = Message::user(text);
            inner.transcript.push(message.clone());
            inner.state = SessionState::AwaitingReply;
            message
        };

        let _turn = TurnGuard::engage(self, &user_message);

        let outcome = match self.transport.send_chat_turn(&self.character, text).await {
            Ok(reply) => {
                let message = Message::character(self.character.as_str(), reply.reply);
                self.append(message.clone());
                TurnOutcome::Replied(message)
            }
            Err(failure) => {
                debug!("Turn with {} failed: {}", self.character, failure);
                self.append(Message::system(failure_entry(&failure)));
                TurnOutcome::Failed(failure)
            }
        };

        Ok(outcome)
    }

    fn append(&self, message: Message) {
        self.inner.lock().transcript.push(message.clone());
        self.sink.on_transcript_appended(&message);
    }

    pub fn character(&self) -> &str {
        &self.character
    }

    pub fn state(&self) -> SessionState {
        self.inner.lock().state
    }

    pub fn is_awaiting_reply(&self) -> bool {
        self.state() == SessionState::AwaitingReply
    }

    /// Snapshot of the transcript in chronological order.
    pub fn transcript(&self) -> Vec<Message> {
        self.inner.lock().transcript.clone()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().transcript.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().transcript.is_empty()
    }

    /// User text of the latest turn, if that turn ended in a system failure
    /// entry.
    pub fn last_failed_input(&self) -> Option<String> {
        let inner = self.inner.lock();
        match inner.transcript.as_slice() {
            [.., user, failure] if user.speaker == Speaker::User && failure.speaker.is_system() => {
                Some(user.text.clone())
            }
            _ => None,
        }
    }
}

/// Transcript text recorded for a failed turn.
pub fn failure_entry(failure: &Failure) -> String {
    format!("Reply failed [{}]: {}", failure.kind, failure.detail)
}

/// Keeps a session in `AwaitingReply` for one turn.
///
/// Dropping it returns the session to `Idle`, so a failed, finished, or
/// abandoned turn never leaves the session stuck.
struct TurnGuard<'a> {
    controller: &'a ChatSessionController,
}

impl<'a> TurnGuard<'a> {
    fn engage(controller: &'a ChatSessionController, user_message: &Message) -> Self {
        controller.sink.on_transcript_appended(user_message);
        controller
            .sink
            .on_session_state_changed(SessionState::AwaitingReply);
        debug!("Waiting for {} to reply", controller.character);
        Self { controller }
    }
}

impl Drop for TurnGuard<'_> {
    fn drop(&mut self) {
        let len = {
            let mut inner = self.controller.inner.lock();
            inner.state = SessionState::Idle;
            inner.transcript.len()
        };
        info!(
            "Turn with {} finished ({} transcript entries)",
            self.controller.character, len
        );
        self.controller
            .sink
            .on_session_state_changed(SessionState::Idle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{MockPresentationSink, NullSink};
    use folio_core::FailureKind;
    use folio_transport::MockTransport;
    use mockall::predicate::eq;
    use mockall::Sequence;

    fn roster() -> CharacterRoster {
        CharacterRoster::from(vec!["Alice", "Bob"])
    }

    fn session(transport: MockTransport) -> ChatSessionController {
        ChatSessionController::new(Arc::new(transport), Arc::new(NullSink), &roster(), "Alice")
            .unwrap()
    }

    #[test]
    fn test_unknown_character_is_rejected() {
        let result = ChatSessionController::new(
            Arc::new(MockTransport::new()),
            Arc::new(NullSink),
            &roster(),
            "Mallory",
        );
        assert_eq!(result.err().map(|f| f.kind), Some(FailureKind::UnknownCharacter));
    }

    #[tokio::test]
    async fn test_turn_emits_in_order() {
        let mut sink = MockPresentationSink::new();
        let mut seq = Sequence::new();
        sink.expect_on_transcript_appended()
            .withf(|m| m.speaker == Speaker::User && m.text == "hello")
            .times(1)
            .in_sequence(&mut seq)
            .return_const(());
        sink.expect_on_session_state_changed()
            .with(eq(SessionState::AwaitingReply))
            .times(1)
            .in_sequence(&mut seq)
            .return_const(());
        sink.expect_on_transcript_appended()
            .withf(|m| m.speaker.as_str() == "Alice" && m.text == "Hi there")
            .times(1)
            .in_sequence(&mut seq)
            .return_const(());
        sink.expect_on_session_state_changed()
            .with(eq(SessionState::Idle))
            .times(1)
            .in_sequence(&mut seq)
            .return_const(());
        sink.expect_on_error().never();

        let controller = ChatSessionController::new(
            Arc::new(MockTransport::new().add_reply("Hi there")),
            Arc::new(sink),
            &roster(),
            "Alice",
        )
        .unwrap();

        let outcome = controller.send("hello").await.unwrap();
        assert!(outcome.is_replied());
        assert_eq!(outcome.reply().unwrap().text, "Hi there");
    }

    #[tokio::test]
    async fn test_failed_turn_records_system_entry() {
        let transport = MockTransport::new()
            .add_chat_failure(Failure::status(503, "POST /chat returned 503 Service Unavailable"));
        let controller = session(transport);

        let outcome = controller.send("hello").await.unwrap();
        assert_eq!(outcome.failure().unwrap().kind, FailureKind::NonSuccessStatus(503));

        let transcript = controller.transcript();
        assert_eq!(transcript.len(), 2);
        assert!(transcript[1].speaker.is_system());
        assert_eq!(
            transcript[1].text,
            "Reply failed [NonSuccessStatus(503)]: POST /chat returned 503 Service Unavailable"
        );
        assert_eq!(controller.state(), SessionState::Idle);
        assert_eq!(controller.last_failed_input().as_deref(), Some("hello"));
    }

    #[tokio::test]
    async fn test_empty_input_is_rejected() {
        let transport = MockTransport::new();
        let controller = session(transport.clone());

        for text in ["", "   ", "\n\t "] {
            let failure = controller.send(text).await.unwrap_err();
            assert_eq!(failure.kind, FailureKind::EmptyInput);
        }

        assert!(controller.is_empty());
        assert_eq!(transport.call_count(), 0);
    }

    #[tokio::test]
    async fn test_user_text_is_sent_untrimmed() {
        let transport = MockTransport::new();
        let controller = session(transport.clone());

        controller.send("  hello  ").await.unwrap();

        let calls = transport.get_method_calls("send_chat_turn");
        assert_eq!(calls[0].message.as_deref(), Some("  hello  "));
        assert_eq!(controller.transcript()[0].text, "  hello  ");
    }

    #[tokio::test]
    async fn test_last_failed_input_clears_after_success() {
        let transport = MockTransport::new()
            .add_chat_failure(Failure::timeout("no answer"))
            .add_reply("Back again");
        let controller = session(transport);

        controller.send("first").await.unwrap();
        assert_eq!(controller.last_failed_input().as_deref(), Some("first"));

        controller.send("first").await.unwrap();
        assert_eq!(controller.last_failed_input(), None);
        assert_eq!(controller.len(), 4);
    }

    #[tokio::test]
    async fn test_abandoned_turn_returns_to_idle() {
        let transport = MockTransport::new().hold_requests();
        let controller = session(transport.clone());

        let turn = controller.send("hello");
        tokio::select! {
            _ = turn => panic!("turn should still be pending"),
            _ = transport.wait_for_calls(1) => {}
        }

        assert_eq!(controller.state(), SessionState::Idle);
        assert_eq!(controller.len(), 1);
        assert_eq!(controller.last_failed_input(), None);
    }
}
