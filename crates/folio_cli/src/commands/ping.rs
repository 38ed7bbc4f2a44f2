//! Ping command - Check that the content service answers.

use anyhow::Result;
use clap::Args;

use folio_core::ClientConfig;
use folio_transport::{HttpTransport, TransportClient};

#[derive(Args)]
pub struct PingArgs {}

pub async fn execute(_args: PingArgs, config: ClientConfig) -> Result<()> {
    let transport = HttpTransport::new(config)?;
    let message = transport.health().await?;
    println!("✅ {} answered: {}", transport.config().base_url, message);
    Ok(())
}
