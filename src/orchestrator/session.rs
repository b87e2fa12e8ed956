//! Poll session.
//!
//! One session re-fetches a single investigation on a fixed-rate schedule until it
//! sees a terminal status, a request fails, or it is cancelled. Sessions are
//! numbered; the owner drops events whose generation is not the current one.

use crate::api::SharedApi;
use crate::error::ApiError;
use crate::model::{Investigation, InvestigationId};
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

#[derive(Debug)]
pub(crate) struct PollEvent {
    pub generation: u64,
    pub kind: PollEventKind,
}

#[derive(Debug)]
pub(crate) enum PollEventKind {
    Updated(Investigation),
    Failed(ApiError),
}

struct ActiveSession {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

pub(crate) struct PollSession {
    generation: u64,
    active: Option<ActiveSession>,
}

impl PollSession {
    pub fn new() -> Self {
        Self {
            generation: 0,
            active: None,
        }
    }

    /// Generation of the most recently started session.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_active(&self) -> bool {
        self.active
            .as_ref()
            .is_some_and(|s| !s.cancel.is_cancelled() && !s.handle.is_finished())
    }

    /// Start polling `id`, replacing any running session. Returns the new generation.
    pub fn start(
        &mut self,
        api: SharedApi,
        id: InvestigationId,
        interval: Duration,
        event_tx: UnboundedSender<PollEvent>,
    ) -> u64 {
        self.cancel();
        self.generation += 1;

        let cancel = CancellationToken::new();
        let handle = tokio::spawn(poll_loop(PollLoopParams {
            api,
            id: id.clone(),
            interval,
            generation: self.generation,
            event_tx,
            cancel: cancel.clone(),
        }));
        self.active = Some(ActiveSession { cancel, handle });

        tracing::debug!(generation = self.generation, %id, ?interval, "poll session started");
        self.generation
    }

    /// Stop the current session. Safe to call at any time; returns whether a
    /// running session was actually stopped.
    pub fn cancel(&mut self) -> bool {
        let Some(session) = self.active.take() else {
            return false;
        };
        let was_running = !session.cancel.is_cancelled() && !session.handle.is_finished();
        session.cancel.cancel();
        if was_running {
            tracing::debug!(generation = self.generation, "poll session cancelled");
        }
        was_running
    }
}

impl Drop for PollSession {
    fn drop(&mut self) {
        self.cancel();
    }
}

struct PollLoopParams {
    api: SharedApi,
    id: InvestigationId,
    interval: Duration,
    generation: u64,
    event_tx: UnboundedSender<PollEvent>,
    cancel: CancellationToken,
}

async fn poll_loop(params: PollLoopParams) {
    let PollLoopParams {
        api,
        id,
        interval,
        generation,
        event_tx,
        cancel,
    } = params;

    // First tick one interval after start; a tick that falls due while a
    // request is still outstanding is skipped, so requests never overlap.
    let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut ticks = 0u32;

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }
        ticks += 1;

        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            r = api.get_investigation(&id) => r,
        };
        if cancel.is_cancelled() {
            break;
        }

        let stop = match &result {
            Ok(inv) => {
                tracing::debug!(generation, tick = ticks, status = %inv.status, "poll tick");
                inv.status.is_terminal()
            }
            Err(e) => {
                tracing::warn!(generation, tick = ticks, timeout = e.is_timeout(), error = e as &(dyn std::error::Error + 'static), "poll request failed");
                true
            }
        };
        let kind = match result {
            Ok(inv) => PollEventKind::Updated(inv),
            Err(e) => PollEventKind::Failed(e),
        };
        if event_tx.send(PollEvent { generation, kind }).is_err() || stop {
            break;
        }
    }

    tracing::debug!(generation, ticks, "poll session finished");
}
