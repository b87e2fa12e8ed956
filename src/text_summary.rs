//! Text summary builder for CLI output.
//!
//! This module formats human-readable lines for text mode from a finished report.

use crate::model::InvestigationReport;
use crate::view;

/// Pre-formatted lines for text output.
pub(crate) struct TextSummary {
    pub lines: Vec<String>,
}

/// Build a text summary from a finished report.
pub(crate) fn build_text_summary(report: &InvestigationReport) -> TextSummary {
    let query = report
        .investigation
        .as_ref()
        .map(|inv| inv.query.as_str())
        .unwrap_or_default();
    let rendered = view::render(
        query,
        false,
        report.error.as_deref(),
        report.investigation.as_ref(),
    );

    let mut lines = rendered.text_lines();
    if !lines.is_empty() {
        lines.push(String::new());
    }
    lines.push(format!(
        "Polls: {} every {} (elapsed {})",
        report.polls,
        humantime::format_duration(report.poll_interval),
        humantime::format_duration(round_to_millis(report.elapsed)),
    ));
    lines.push(format!("Service: {}", report.base_url));

    TextSummary { lines }
}

fn round_to_millis(d: std::time::Duration) -> std::time::Duration {
    std::time::Duration::from_millis(d.as_millis() as u64)
}
