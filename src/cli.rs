use crate::api::{HttpInvestigationClient, SharedApi};
use crate::config::{self, ClientConfig};
use crate::model::PollPhase;
use crate::orchestrator::{self, ControllerEvent, Snapshot, UiCommand};
use anyhow::{Context, Result};
use clap::Parser;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// Output line routing for stdout/stderr writer.
enum OutputLine {
    Stdout(String),
    Stderr(String),
}

/// Spawn a blocking writer for stdout/stderr to avoid blocking async tasks.
fn spawn_output_writer() -> (
    mpsc::UnboundedSender<OutputLine>,
    tokio::task::JoinHandle<()>,
) {
    let (tx, mut rx) = mpsc::unbounded_channel::<OutputLine>();
    let handle = tokio::task::spawn_blocking(move || {
        let stdout = std::io::stdout();
        let stderr = std::io::stderr();
        let mut out = std::io::LineWriter::new(stdout.lock());
        let mut err = std::io::LineWriter::new(stderr.lock());

        while let Some(line) = rx.blocking_recv() {
            match line {
                OutputLine::Stdout(msg) => {
                    let _ = writeln!(out, "{}", msg);
                }
                OutputLine::Stderr(msg) => {
                    let _ = writeln!(err, "{}", msg);
                }
            }
        }

        let _ = out.flush();
        let _ = err.flush();
    });
    (tx, handle)
}

#[derive(Debug, Parser, Clone)]
#[command(
    name = "sentinel-cli",
    version,
    about = "Submit security queries to Sentinel AI and follow the investigation"
)]
pub struct Cli {
    /// Base URL of the investigation service [default: http://localhost:8000,
    /// or http://api:8000 inside a container network]
    #[arg(long, env = config::BASE_URL_ENV)]
    pub base_url: Option<String>,

    /// Interval between status checks
    #[arg(long, default_value = "3s")]
    pub poll_interval: humantime::Duration,

    /// Per-request timeout (0s disables)
    #[arg(long, default_value = "30s")]
    pub request_timeout: humantime::Duration,

    /// Query to submit on launch (required with --text or --json)
    #[arg(long)]
    pub query: Option<String>,

    /// Print status changes and a text summary, then exit (no TUI)
    #[arg(long, conflicts_with = "json")]
    pub text: bool,

    /// Print the final report as JSON and exit (no TUI)
    #[arg(long)]
    pub json: bool,

    /// Write the final report as JSON to this path
    #[arg(long)]
    pub export_json: Option<std::path::PathBuf>,

    /// Enable debug logging (to a file while the TUI is active)
    #[arg(long)]
    pub verbose: bool,
}

impl Cli {
    pub fn is_interactive(&self) -> bool {
        cfg!(feature = "tui") && !self.text && !self.json
    }
}

pub async fn run(args: Cli) -> Result<()> {
    let cfg = build_config(&args)?;
    tracing::debug!(base_url = %cfg.base_url, poll_interval = ?cfg.poll_interval, "resolved configuration");

    if !args.json && !args.text {
        #[cfg(feature = "tui")]
        {
            return crate::tui::run(args, cfg).await;
        }
        #[cfg(not(feature = "tui"))]
        {
            // Fallback when built without TUI support.
            return run_headless(args, cfg).await;
        }
    }

    run_headless(args, cfg).await
}

/// Build a `ClientConfig` from CLI arguments.
pub fn build_config(args: &Cli) -> Result<ClientConfig> {
    let base_url =
        config::resolve_base_url(args.base_url.as_deref(), config::running_in_container())?;
    let poll_interval = config::validate_poll_interval(Duration::from(args.poll_interval))?;
    let request_timeout = Some(Duration::from(args.request_timeout)).filter(|d| !d.is_zero());

    Ok(ClientConfig {
        base_url,
        poll_interval,
        request_timeout,
        user_agent: format!("sentinel-cli/{}", env!("CARGO_PKG_VERSION")),
    })
}

/// Submit `--query`, follow the investigation until it settles, then print
/// either a text summary or the JSON report.
async fn run_headless(args: Cli, cfg: ClientConfig) -> Result<()> {
    let query = args
        .query
        .clone()
        .context("--query is required with --text or --json")?;

    let api: SharedApi = Arc::new(HttpInvestigationClient::new(&cfg)?);
    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<ControllerEvent>();
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel::<UiCommand>();
    let controller_cfg = cfg.clone();
    let handle = tokio::spawn(async move {
        orchestrator::run_controller(api, &controller_cfg, event_tx, cmd_rx).await
    });
    let (out_tx, out_handle) = spawn_output_writer();

    let _ = cmd_tx.send(UiCommand::Submit(query));

    let mut failure = None;
    let mut last_status: Option<String> = None;
    let mut final_snapshot: Option<Snapshot> = None;
    let mut interrupted = false;

    loop {
        tokio::select! {
            ev = event_rx.recv() => {
                match ev {
                    Some(ControllerEvent::Error(e)) => failure = Some(e),
                    Some(ControllerEvent::Snapshot(snap)) => {
                        if args.text {
                            if let Some(inv) = snap.investigation.as_ref() {
                                let status = inv.status.to_string();
                                if last_status.as_deref() != Some(status.as_str()) {
                                    let _ = out_tx.send(OutputLine::Stderr(format!(
                                        "[{}] {}", inv.id, status
                                    )));
                                    last_status = Some(status);
                                }
                            }
                        }
                        if failure.is_some() || snap.phase == PollPhase::Settled {
                            final_snapshot = Some(snap);
                            break;
                        }
                    }
                    None => break,
                }
            }
            _ = tokio::signal::ctrl_c() => {
                interrupted = true;
                break;
            }
        }
    }

    let _ = cmd_tx.send(UiCommand::Quit);
    handle.await.context("controller task failed")??;

    if interrupted {
        drop(out_tx);
        let _ = out_handle.await;
        anyhow::bail!("interrupted before the investigation settled");
    }

    let snapshot = final_snapshot.context("controller stopped before the investigation settled")?;
    let report = orchestrator::build_report(&cfg, &snapshot);

    if let Some(path) = args.export_json.as_deref() {
        orchestrator::export_json(path, &report)?;
        let _ = out_tx.send(OutputLine::Stderr(format!("Exported JSON: {}", path.display())));
    }

    if args.json {
        let out = serde_json::to_string_pretty(&report)?;
        let _ = out_tx.send(OutputLine::Stdout(out));
    } else {
        let summary = crate::text_summary::build_text_summary(&report);
        for line in summary.lines {
            let _ = out_tx.send(OutputLine::Stdout(line));
        }
    }

    drop(out_tx);
    let _ = out_handle.await;

    match failure {
        Some(e) => Err(anyhow::Error::new(e)),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_service_contract() {
        let args = Cli::parse_from(["sentinel-cli", "--base-url", "http://svc:8000"]);
        let cfg = build_config(&args).unwrap();
        assert_eq!(cfg.base_url, "http://svc:8000/");
        assert_eq!(cfg.poll_interval, Duration::from_secs(3));
        assert_eq!(cfg.request_timeout, Some(Duration::from_secs(30)));
        assert!(cfg.user_agent.starts_with("sentinel-cli/"));
    }

    #[test]
    fn zero_timeout_disables_it() {
        let args = Cli::parse_from([
            "sentinel-cli",
            "--base-url",
            "http://svc:8000",
            "--request-timeout",
            "0s",
            "--poll-interval",
            "500ms",
        ]);
        let cfg = build_config(&args).unwrap();
        assert_eq!(cfg.request_timeout, None);
        assert_eq!(cfg.poll_interval, Duration::from_millis(500));
    }

    #[test]
    fn zero_poll_interval_is_an_error() {
        let args = Cli::parse_from([
            "sentinel-cli",
            "--base-url",
            "http://svc:8000",
            "--poll-interval",
            "0s",
        ]);
        assert!(build_config(&args).is_err());
    }

    #[test]
    fn text_and_json_conflict() {
        assert!(Cli::try_parse_from(["sentinel-cli", "--text", "--json"]).is_err());
    }

    #[test]
    fn output_flags_disable_the_tui() {
        let args = Cli::parse_from(["sentinel-cli", "--text", "--query", "failed logins"]);
        assert!(!args.is_interactive());
        assert_eq!(args.query.as_deref(), Some("failed logins"));
    }
}
