mod api;
mod cli;
mod config;
mod error;
mod logging;
mod model;
mod orchestrator;
mod text_summary;
#[cfg(feature = "tui")]
mod tui;
mod view;

use anyhow::Result;
use clap::Parser;

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Cli::parse();
    let is_non_tui = !args.is_interactive();
    logging::init(&args)?;

    cli::run(args).await?;
    // Explicitly exit with code 0 on success, especially for non-TUI modes
    if is_non_tui {
        std::process::exit(0);
    }
    Ok(())
}
