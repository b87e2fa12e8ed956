//! Tracing setup.
//!
//! The TUI owns the terminal, so it only logs when `--verbose` is given and then
//! writes to a file. Headless modes log to stderr.

use crate::cli::Cli;
use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

pub fn init(args: &Cli) -> Result<()> {
    let default_directive = if args.verbose {
        "warn,sentinel_cli=debug"
    } else {
        "warn"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    if args.is_interactive() {
        if !args.verbose {
            return Ok(());
        }
        let dir = log_dir();
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("create log directory {}", dir.display()))?;
        let path = dir.join("debug.log");
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("open log file {}", path.display()))?;
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(Mutex::new(file))
            .with_ansi(false)
            .try_init()
            .map_err(|e| anyhow::anyhow!("install log subscriber: {e}"))?;
        tracing::info!(
            "sentinel-cli v{} starting with verbose logging",
            env!("CARGO_PKG_VERSION")
        );
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init()
            .map_err(|e| anyhow::anyhow!("install log subscriber: {e}"))?;
    }
    Ok(())
}

fn log_dir() -> PathBuf {
    dirs::state_dir()
        .or_else(dirs::data_local_dir)
        .unwrap_or_else(std::env::temp_dir)
        .join("sentinel-cli")
}
