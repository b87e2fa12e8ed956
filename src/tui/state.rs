use crate::error::ClientError;
use crate::orchestrator::{ControllerEvent, Snapshot};
use crate::view::{self, RenderedView, Rgb};
use ratatui::{
    style::Color,
    style::Style,
    text::{Line, Span},
};
use std::path::PathBuf;
use std::time::Duration;

pub struct UiState {
    pub tab: usize,
    pub input: String,
    pub info: String,
    pub snapshot: Snapshot,
    // Set between sending a submit and the controller's next snapshot, so a
    // second Enter cannot slip through before "busy" arrives.
    pub submit_pending: bool,
    pub last_exported_path: Option<String>,
    pub base_url: String,
    pub poll_interval: Duration,
    pub export_json: Option<PathBuf>,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            tab: 0,
            input: String::new(),
            info: String::new(),
            snapshot: Snapshot::default(),
            submit_pending: false,
            last_exported_path: None,
            base_url: String::new(),
            poll_interval: Duration::from_secs(3),
            export_json: None,
        }
    }
}

impl UiState {
    pub fn input_enabled(&self) -> bool {
        !self.snapshot.busy && !self.submit_pending
    }

    pub fn rendered(&self) -> RenderedView {
        view::render(
            &self.input,
            !self.input_enabled(),
            self.snapshot.error.as_deref(),
            self.snapshot.investigation.as_ref(),
        )
    }

    /// Apply a controller event. Returns true when this event ended the
    /// tracking of an investigation (settled or errored).
    pub fn apply_event(&mut self, ev: ControllerEvent) -> bool {
        match ev {
            ControllerEvent::Error(e) => {
                self.info = match e {
                    ClientError::Submission(cause) | ClientError::Poll(cause) => {
                        format!("Cause: {:#}", anyhow::Error::new(cause))
                    }
                    ClientError::Validation => String::new(),
                };
                false
            }
            ControllerEvent::Snapshot(snap) => {
                let was_busy = self.snapshot.busy;
                self.submit_pending = false;
                self.snapshot = snap;
                was_busy && !self.snapshot.busy && self.snapshot.investigation.is_some()
            }
        }
    }
}

pub fn to_color(rgb: Rgb) -> Color {
    Color::Rgb(rgb.0, rgb.1, rgb.2)
}

pub fn push_wrapped_status_kv(
    out: &mut Vec<Line<'static>>,
    label: &str,
    value: &str,
    status_area_width: u16,
) {
    let value = value.trim();
    if value.is_empty() {
        return;
    }

    // Account for borders (2 chars on each side)
    let usable_width = status_area_width.saturating_sub(4).max(1);
    let label_text = format!("{label}:");
    let label_width = label_text.chars().count() as u16;

    let value_chars: Vec<char> = value.chars().collect();
    let mut remaining = value_chars.as_slice();
    let mut first = true;

    while !remaining.is_empty() {
        let line_width = if first {
            usable_width.saturating_sub(label_width + 1).max(1)
        } else {
            usable_width.saturating_sub(2).max(1)
        };

        let chars_to_take = (remaining.len() as u16).min(line_width) as usize;
        let (line_chars, rest) = remaining.split_at(chars_to_take);
        let line_text: String = line_chars.iter().collect();

        if first {
            out.push(Line::from(vec![
                Span::styled(label_text.clone(), Style::default().fg(Color::Gray)),
                Span::raw(" "),
                Span::raw(line_text),
            ]));
            first = false;
        } else {
            out.push(Line::from(vec![Span::raw("  "), Span::raw(line_text)]));
        }

        remaining = rest;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::testing::{investigation, unavailable};
    use crate::error::ApiError;
    use crate::model::{InvestigationStatus, PollPhase};

    #[test]
    fn pending_submit_disables_input_until_snapshot() {
        let mut state = UiState::default();
        assert!(state.input_enabled());
        state.submit_pending = true;
        assert!(!state.input_enabled());
        assert_eq!(state.rendered().submit_label, "Investigating...");

        state.apply_event(ControllerEvent::Snapshot(Snapshot {
            busy: true,
            ..Snapshot::default()
        }));
        assert!(!state.submit_pending);
        assert!(!state.input_enabled());
    }

    #[test]
    fn reports_end_of_tracking_once() {
        let mut state = UiState::default();
        state.apply_event(ControllerEvent::Snapshot(Snapshot {
            phase: PollPhase::Polling,
            busy: true,
            investigation: Some(investigation("x1", "q", InvestigationStatus::Pending, None)),
            ..Snapshot::default()
        }));

        let settled = Snapshot {
            phase: PollPhase::Settled,
            busy: false,
            investigation: Some(investigation("x1", "q", InvestigationStatus::Completed, None)),
            ..Snapshot::default()
        };
        assert!(state.apply_event(ControllerEvent::Snapshot(settled.clone())));
        assert!(!state.apply_event(ControllerEvent::Snapshot(settled)));
        assert!(state.input_enabled());
    }

    #[test]
    fn error_event_shows_the_cause() {
        let mut state = UiState::default();
        state.apply_event(ControllerEvent::Error(ClientError::Poll(unavailable())));
        assert_eq!(state.info, "Cause: HTTP 503: service unavailable");

        let decode = serde_json::from_str::<serde_json::Value>("not json").unwrap_err();
        state.apply_event(ControllerEvent::Error(ClientError::Submission(ApiError::from(decode))));
        assert!(state.info.starts_with("Cause: malformed response: expected"));

        state.apply_event(ControllerEvent::Error(ClientError::Validation));
        assert!(state.info.is_empty());
    }

    #[test]
    fn wraps_long_values_under_label() {
        let mut out = Vec::new();
        push_wrapped_status_kv(&mut out, "Query", &"a".repeat(30), 20);
        assert!(out.len() > 1);
        push_wrapped_status_kv(&mut out, "Empty", "   ", 20);
        let before = out.len();
        push_wrapped_status_kv(&mut out, "Empty", "", 20);
        assert_eq!(out.len(), before);
    }
}
