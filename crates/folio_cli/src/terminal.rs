//! Terminal rendering of controller events.

use std::io::Write;

use folio_core::{CharacterRoster, FailureKind, Message, Speaker};
use folio_session::{IngestionState, PresentationSink, SessionState};

/// Prints controller events as they arrive.
///
/// Transcript entries and the roster go to stdout. Progress indicators and
/// errors go to stderr so a piped transcript stays clean. The user's own
/// messages are not echoed; the terminal already shows what was typed.
#[derive(Debug, Default)]
pub struct TerminalSink;

impl TerminalSink {
    pub fn new() -> Self {
        Self
    }
}

impl PresentationSink for TerminalSink {
    fn on_busy_changed(&self, busy: bool) {
        if busy {
            eprintln!("⏳ Uploading document...");
        }
    }

    fn on_roster_ready(&self, roster: &CharacterRoster) {
        if roster.is_empty() {
            println!("No characters found.");
            return;
        }
        println!("👥 Characters:");
        print!("{}", render_roster(roster));
    }

    fn on_transcript_appended(&self, message: &Message) {
        match &message.speaker {
            Speaker::User => {}
            Speaker::Character(name) => println!("{}> {}", name, message.text),
            Speaker::System => println!("⚠️  {}", message.text),
        }
    }

    fn on_session_state_changed(&self, state: SessionState) {
        if state == SessionState::AwaitingReply {
            eprint!("...\r");
            let _ = std::io::stderr().flush();
        }
    }

    fn on_ingestion_state_changed(&self, state: IngestionState) {
        tracing::debug!("Ingestion {}", state);
    }

    // A failed ingestion also ends the command, and `main` prints that
    // error. Printing here too would report it twice.
    fn on_error(&self, kind: &FailureKind, summary: &str) {
        tracing::debug!("{} reported: {}", kind, summary);
    }
}

/// Numbered roster, one name per line.
pub fn render_roster(roster: &CharacterRoster) -> String {
    roster
        .iter()
        .enumerate()
        .map(|(i, name)| format!("  {:>2}. {}\n", i + 1, name))
        .collect()
}

/// Transcript as plain lines, for `/history`.
pub fn render_transcript(transcript: &[Message]) -> String {
    transcript
        .iter()
        .map(|m| {
            format!(
                "[{}] {}: {}\n",
                m.created_at.format("%H:%M:%S"),
                m.speaker,
                m.text
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_roster_numbers_from_one() {
        let roster = CharacterRoster::from(vec!["Alice", "Bob"]);
        assert_eq!(render_roster(&roster), "   1. Alice\n   2. Bob\n");
    }

    #[test]
    fn test_render_transcript_names_speakers() {
        let transcript = vec![Message::user("hello"), Message::character("Alice", "Hi there")];
        let rendered = render_transcript(&transcript);
        let lines: Vec<&str> = rendered.lines().collect();
        assert!(lines[0].ends_with("user: hello"));
        assert!(lines[1].ends_with("Alice: Hi there"));
    }
}
