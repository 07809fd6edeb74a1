//! webqa CLI: question answering over a single web page.
//!
//! Fetches the page, checks whether it can actually answer the question,
//! and answers from the page or from web search. Also runs as an HTTP
//! service that streams answers as server-sent events.

mod commands;
mod server;

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
