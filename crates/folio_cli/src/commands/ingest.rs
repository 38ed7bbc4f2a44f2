//! Ingest command - Upload a document and print its roster.

use std::sync::Arc;

use anyhow::Result;
use clap::Args;

use folio_core::{ClientConfig, IngestReport};
use folio_session::IngestionController;
use folio_transport::HttpTransport;

use super::SourceArgs;
use crate::terminal::TerminalSink;

/// Characters of preview text shown after an upload.
const PREVIEW_CHARS: usize = 300;

#[derive(Args)]
pub struct IngestArgs {
    #[command(flatten)]
    pub source: SourceArgs,
}

pub async fn execute(args: IngestArgs, config: ClientConfig) -> Result<()> {
    let source = args.source.into_source()?;

    let transport = Arc::new(HttpTransport::new(config.clone())?);
    let controller = IngestionController::new(
        transport,
        Arc::new(TerminalSink::new()),
        config.documents.clone(),
    );

    let report = controller.ingest(source).await?;
    println!();
    print_summary(&report);
    Ok(())
}

pub fn print_summary(report: &IngestReport) {
    println!("📖 {} characters of text", report.total_chars);
    let preview = preview(&report.text_preview);
    if !preview.is_empty() {
        println!("   \"{}\"", preview);
    }
}

fn preview(text: &str) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() <= PREVIEW_CHARS {
        return collapsed;
    }
    let mut cut: String = collapsed.chars().take(PREVIEW_CHARS).collect();
    cut.push('…');
    cut
}
