//! Remix Studio CLI — slide-deck labeling tool.
//!
//! Imports .pptx decks into labeling sessions, manages caption and remix
//! suggestion labels, and exports training-ready dataset bundles.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
