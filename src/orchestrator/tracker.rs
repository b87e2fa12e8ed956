//! Submission and polling state machine.
//!
//! The tracker owns the held investigation and the poll session. It never does
//! I/O itself apart from starting poll sessions; the controller loop feeds it the
//! outcome of the create request and the events of the current session.

use super::session::{PollEvent, PollEventKind, PollSession};
use crate::api::SharedApi;
use crate::error::{ApiError, ClientError};
use crate::model::{Investigation, PollPhase};
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tokio::time::Instant;

/// Everything a presentation layer needs to draw the current state.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct Snapshot {
    pub phase: PollPhase,
    pub busy: bool,
    pub error: Option<String>,
    pub investigation: Option<Investigation>,
    /// Poll responses applied for the current investigation.
    pub polls: u32,
    /// Time from submission to settling; set once tracking has ended.
    pub elapsed: Option<Duration>,
}

pub(crate) struct Tracker {
    api: SharedApi,
    poll_interval: Duration,
    poll_tx: UnboundedSender<PollEvent>,
    session: PollSession,
    snapshot: Snapshot,
    submitted_at: Option<Instant>,
}

impl Tracker {
    pub fn new(api: SharedApi, poll_interval: Duration, poll_tx: UnboundedSender<PollEvent>) -> Self {
        Self {
            api,
            poll_interval,
            poll_tx,
            session: PollSession::new(),
            snapshot: Snapshot::default(),
            submitted_at: None,
        }
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    pub fn is_polling(&self) -> bool {
        self.session.is_active()
    }

    /// Validate and accept a new query.
    ///
    /// Returns the query to send, `None` when a submission or poll session is
    /// still in progress, or `Validation` for blank input (the displayed
    /// investigation is left alone in that case).
    pub fn begin_submission(&mut self, raw: &str) -> Result<Option<String>, ClientError> {
        if self.snapshot.busy {
            tracing::warn!("ignoring submission while an investigation is in progress");
            return Ok(None);
        }
        if raw.trim().is_empty() {
            let err = ClientError::Validation;
            self.snapshot.error = Some(err.to_string());
            return Err(err);
        }

        self.session.cancel();
        self.snapshot = Snapshot {
            busy: true,
            ..Snapshot::default()
        };
        self.submitted_at = Some(Instant::now());
        tracing::info!(query = raw, "starting investigation");
        Ok(Some(raw.to_string()))
    }

    /// Apply the outcome of the create request.
    pub fn finish_submission(
        &mut self,
        result: Result<Investigation, ApiError>,
    ) -> Result<(), ClientError> {
        match result {
            Ok(inv) => {
                tracing::info!(id = %inv.id, status = %inv.status, "investigation created");
                let terminal = inv.status.is_terminal();
                let id = inv.id.clone();
                self.snapshot.investigation = Some(inv);
                if terminal {
                    self.settle();
                } else {
                    self.session.start(
                        self.api.clone(),
                        id,
                        self.poll_interval,
                        self.poll_tx.clone(),
                    );
                    self.snapshot.phase = PollPhase::Polling;
                }
                Ok(())
            }
            Err(e) => {
                let err = ClientError::Submission(e);
                tracing::warn!(error = &err as &(dyn std::error::Error + 'static), "submission failed");
                self.snapshot.phase = PollPhase::Idle;
                self.snapshot.busy = false;
                self.snapshot.investigation = None;
                self.snapshot.error = Some(err.to_string());
                self.snapshot.elapsed = self.elapsed();
                Err(err)
            }
        }
    }

    /// Apply one event from a poll session. Events from superseded sessions,
    /// or arriving after tracking ended, are dropped.
    pub fn apply_poll_event(&mut self, event: PollEvent) -> Result<(), ClientError> {
        if event.generation != self.session.generation() || self.snapshot.phase != PollPhase::Polling {
            tracing::debug!(
                generation = event.generation,
                current = self.session.generation(),
                "dropping stale poll event"
            );
            return Ok(());
        }

        self.snapshot.polls += 1;
        match event.kind {
            PollEventKind::Updated(inv) => {
                let terminal = inv.status.is_terminal();
                self.snapshot.investigation = Some(inv);
                if terminal {
                    self.session.cancel();
                    self.settle();
                }
                Ok(())
            }
            PollEventKind::Failed(e) => {
                self.session.cancel();
                let err = ClientError::Poll(e);
                tracing::warn!(error = &err as &(dyn std::error::Error + 'static), "polling stopped");
                self.snapshot.phase = PollPhase::Errored;
                self.snapshot.busy = false;
                self.snapshot.error = Some(err.to_string());
                self.snapshot.elapsed = self.elapsed();
                Err(err)
            }
        }
    }

    /// Stop any poll session; used on teardown.
    pub fn shutdown(&mut self) {
        if self.session.cancel() {
            tracing::debug!("poll session stopped on shutdown");
        }
    }

    fn settle(&mut self) {
        if let Some(inv) = self.snapshot.investigation.as_ref() {
            tracing::info!(id = %inv.id, status = %inv.status, polls = self.snapshot.polls, "investigation settled");
        }
        self.snapshot.phase = PollPhase::Settled;
        self.snapshot.busy = false;
        self.snapshot.elapsed = self.elapsed();
    }

    fn elapsed(&self) -> Option<Duration> {
        self.submitted_at.map(|t| t.elapsed())
    }
}
