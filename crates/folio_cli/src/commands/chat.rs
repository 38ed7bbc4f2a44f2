//! Chat command - Upload a document and talk to one of its characters.

use std::io::Write;
use std::sync::Arc;

use anyhow::Result;
use clap::Args;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines};
use tracing::{debug, info};

use folio_core::{CharacterRoster, ClientConfig, FailureKind};
use folio_session::{ChatSessionController, IngestionController, PresentationSink};
use folio_transport::{HttpTransport, TransportClient};

use super::SourceArgs;
use crate::error::CliError;
use crate::terminal::{render_roster, render_transcript, TerminalSink};

const HELP: &str = "Commands: /retry  /switch  /history  /help  /quit";

#[derive(Args)]
pub struct ChatArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Character to talk to, by name or roster number
    #[arg(short, long)]
    pub character: Option<String>,
}

/// One line typed at the chat prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
enum ReplInput {
    Message(String),
    Retry,
    Switch,
    History,
    Help,
    Quit,
    Unknown(String),
}

impl ReplInput {
    fn parse(line: &str) -> Self {
        let trimmed = line.trim();
        match trimmed.strip_prefix('/') {
            Some(command) => match command.to_lowercase().as_str() {
                "retry" | "r" => Self::Retry,
                "switch" | "s" => Self::Switch,
                "history" | "h" => Self::History,
                "help" | "?" => Self::Help,
                "quit" | "exit" | "q" => Self::Quit,
                _ => Self::Unknown(trimmed.to_string()),
            },
            None => Self::Message(line.to_string()),
        }
    }
}

/// How a conversation loop ended.
#[derive(Debug, PartialEq, Eq)]
enum Exit {
    Quit,
    Switch,
}

pub async fn execute(args: ChatArgs, config: ClientConfig) -> Result<()> {
    let source = args.source.into_source()?;
    let described = source.describe();

    let transport: Arc<dyn TransportClient> = Arc::new(HttpTransport::new(config.clone())?);
    let sink: Arc<dyn PresentationSink> = Arc::new(TerminalSink::new());

    let ingestion = IngestionController::new(transport.clone(), sink.clone(), config.documents.clone());
    let report = ingestion.ingest(source).await?;
    super::ingest::print_summary(&report);

    let roster = report.characters;
    if roster.is_empty() {
        return Err(CliError::NoCharacters(described).into());
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    let mut character = match args.character {
        Some(choice) => {
            resolve_character(&roster, &choice).ok_or(CliError::CharacterNotFound(choice))?
        }
        None => match pick_character(&roster, &mut lines).await? {
            Some(name) => name,
            None => return Ok(()),
        },
    };

    loop {
        let session =
            ChatSessionController::new(transport.clone(), sink.clone(), &roster, &character)?;
        info!("Chatting with {}", character);
        println!("\n💬 Chatting with {}. {}", character, HELP);

        match converse(&session, &mut lines).await? {
            Exit::Quit => break,
            Exit::Switch => {
                println!("{}", render_roster(&roster));
                match pick_character(&roster, &mut lines).await? {
                    Some(name) => character = name,
                    None => break,
                }
            }
        }
    }

    println!("👋 Bye");
    Ok(())
}

/// Run one conversation until the user quits, switches, or input ends.
async fn converse<R>(session: &ChatSessionController, lines: &mut Lines<R>) -> Result<Exit>
where
    R: AsyncBufRead + Unpin,
{
    loop {
        prompt("you> ")?;
        let Some(line) = lines.next_line().await? else {
            return Ok(Exit::Quit);
        };

        match ReplInput::parse(&line) {
            ReplInput::Message(text) => send(session, &text).await,
            ReplInput::Retry => match session.last_failed_input() {
                Some(text) => {
                    debug!("Retrying last failed message");
                    send(session, &text).await;
                }
                None => println!("Nothing to retry."),
            },
            ReplInput::History => print!("{}", render_transcript(&session.transcript())),
            ReplInput::Help => println!("{}", HELP),
            ReplInput::Switch => return Ok(Exit::Switch),
            ReplInput::Quit => return Ok(Exit::Quit),
            ReplInput::Unknown(command) => println!("Unknown command {}. {}", command, HELP),
        }
    }
}

/// Send a message; the sink renders the turn, rejections are printed here.
async fn send(session: &ChatSessionController, text: &str) {
    match session.send(text).await {
        Ok(_) => {}
        Err(rejection) if rejection.kind == FailureKind::EmptyInput => {}
        Err(rejection) => eprintln!("❌ {}", rejection.summary()),
    }
}

/// Ask until the user names a character; `None` when input ends.
async fn pick_character<R>(roster: &CharacterRoster, lines: &mut Lines<R>) -> Result<Option<String>>
where
    R: AsyncBufRead + Unpin,
{
    loop {
        prompt("Pick a character (number or name): ")?;
        let Some(line) = lines.next_line().await? else {
            return Ok(None);
        };
        match resolve_character(roster, &line) {
            Some(name) => return Ok(Some(name)),
            None => println!("No character matches '{}'.", line.trim()),
        }
    }
}

/// Match a roster number (1-based) or a case-insensitive name.
fn resolve_character(roster: &CharacterRoster, choice: &str) -> Option<String> {
    let choice = choice.trim();
    if choice.is_empty() {
        return None;
    }
    if let Ok(number) = choice.parse::<usize>() {
        return number
            .checked_sub(1)
            .and_then(|index| roster.get(index))
            .map(str::to_string);
    }
    roster
        .iter()
        .find(|name| *name == choice)
        .or_else(|| roster.iter().find(|name| name.eq_ignore_ascii_case(choice)))
        .map(str::to_string)
}

fn prompt(text: &str) -> Result<()> {
    print!("{}", text);
    std::io::stdout().flush()?;
    Ok(())
}
