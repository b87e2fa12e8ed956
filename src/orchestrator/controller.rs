//! Investigation lifecycle controller.
//!
//! Owns submission and polling orchestration and emits snapshots for presentation layers.

use super::session::PollEvent;
use super::tracker::{Snapshot, Tracker};
use crate::api::SharedApi;
use crate::config::ClientConfig;
use crate::error::{ApiError, ClientError};
use crate::model::Investigation;
use anyhow::Result;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;

/// Commands emitted by UI layers.
#[derive(Debug, Clone)]
pub(crate) enum UiCommand {
    Submit(String),
    Quit,
}

/// Events emitted back to UI layers. An `Error` is always followed by the
/// `Snapshot` that reflects it.
#[derive(Debug)]
pub(crate) enum ControllerEvent {
    Snapshot(Snapshot),
    Error(ClientError),
}

/// Drive submissions and poll sessions from UI commands until the UI quits.
pub(crate) async fn run_controller(
    api: SharedApi,
    cfg: &ClientConfig,
    event_tx: UnboundedSender<ControllerEvent>,
    mut cmd_rx: UnboundedReceiver<UiCommand>,
) -> Result<()> {
    let (poll_tx, mut poll_rx) = mpsc::unbounded_channel::<PollEvent>();
    let mut tracker = Tracker::new(api.clone(), cfg.poll_interval, poll_tx);
    // At most one create request in flight; the tracker refuses new queries while busy.
    let mut pending: Option<JoinHandle<Result<Investigation, ApiError>>> = None;

    let publish = |tracker: &Tracker| {
        let _ = event_tx.send(ControllerEvent::Snapshot(tracker.snapshot().clone()));
    };
    let report = |err: ClientError| {
        let _ = event_tx.send(ControllerEvent::Error(err));
    };

    publish(&tracker);

    let res = loop {
        tokio::select! {
            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(UiCommand::Submit(raw)) => {
                        match tracker.begin_submission(&raw) {
                            Ok(Some(query)) => {
                                let api = api.clone();
                                pending = Some(tokio::spawn(async move {
                                    api.start_investigation(&query).await
                                }));
                            }
                            Ok(None) => {}
                            Err(e) => report(e),
                        }
                        publish(&tracker);
                    }
                    Some(UiCommand::Quit) | None => {
                        tracing::debug!(polling = tracker.is_polling(), "controller shutting down");
                        tracker.shutdown();
                        if let Some(handle) = pending.take() {
                            handle.abort();
                        }
                        break Ok(());
                    }
                }
            }
            // Do not take the JoinHandle before this branch wins; otherwise it can be dropped
            // if another select branch is chosen, and we'll never observe completion.
            maybe_done = async {
                if let Some(h) = pending.as_mut() {
                    return Some(h.await);
                }
                futures::future::pending().await
            } => {
                if let Some(join_res) = maybe_done {
                    pending = None;
                    let result = join_res.unwrap_or_else(|e| {
                        Err(ApiError::Transport(format!("submission task failed: {e}")))
                    });
                    if let Err(e) = tracker.finish_submission(result) {
                        report(e);
                    }
                    publish(&tracker);
                }
            }
            Some(ev) = poll_rx.recv() => {
                if let Err(e) = tracker.apply_poll_event(ev) {
                    report(e);
                }
                publish(&tracker);
            }
        }
    };

    res
}
