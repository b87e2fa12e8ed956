//! Post-run processing utilities.
//!
//! Builds the final report for a tracked investigation and handles exports.

use super::tracker::Snapshot;
use crate::config::ClientConfig;
use crate::model::InvestigationReport;
use anyhow::{Context, Result};
use std::path::Path;

/// Result of post-run processing, ready for presentation layers.
pub(crate) struct ProcessedRun {
    pub report: InvestigationReport,
    pub export_messages: Vec<String>,
}

impl ProcessedRun {
    /// Status-bar text: export results plus how long tracking took.
    pub fn status_line(&self) -> String {
        let elapsed = std::time::Duration::from_secs(self.report.elapsed.as_secs());
        let timing = format!(
            "{} checks in {}",
            self.report.polls,
            humantime::format_duration(elapsed)
        );
        if self.export_messages.is_empty() {
            timing
        } else {
            format!("{} ({timing})", self.export_messages.join("; "))
        }
    }
}

/// Snapshot the end state of a tracked investigation into a report.
pub(crate) fn build_report(cfg: &ClientConfig, snapshot: &Snapshot) -> InvestigationReport {
    InvestigationReport {
        finished_utc: time::OffsetDateTime::now_utc()
            .format(&time::format_description::well_known::Rfc3339)
            .unwrap_or_else(|_| "now".into()),
        base_url: cfg.base_url.clone(),
        poll_interval: cfg.poll_interval,
        polls: snapshot.polls,
        elapsed: snapshot.elapsed.unwrap_or_default(),
        outcome: snapshot.phase,
        error: snapshot.error.clone(),
        investigation: snapshot.investigation.clone(),
    }
}

/// Write a report as pretty JSON, creating parent directories as needed.
pub(crate) fn export_json(path: &Path, report: &InvestigationReport) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create directory {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(report).context("serialize report")?;
    std::fs::write(path, json).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

/// Build the report for a finished investigation and run the configured export.
pub(crate) fn process_completion(
    cfg: &ClientConfig,
    export_path: Option<&Path>,
    snapshot: &Snapshot,
) -> ProcessedRun {
    let report = build_report(cfg, snapshot);

    let mut export_messages = Vec::new();
    if let Some(path) = export_path {
        match export_json(path, &report) {
            Ok(()) => export_messages.push(format!("Exported JSON: {}", path.display())),
            Err(e) => export_messages.push(format!("Export JSON failed: {e:#}")),
        }
    }

    ProcessedRun {
        report,
        export_messages,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::testing::investigation;
    use crate::model::{InvestigationStatus, PollPhase};
    use std::time::Duration;

    fn config() -> ClientConfig {
        ClientConfig {
            base_url: "http://localhost:8000/".into(),
            poll_interval: Duration::from_secs(3),
            request_timeout: Some(Duration::from_secs(30)),
            user_agent: "sentinel-cli/test".into(),
        }
    }

    fn settled() -> Snapshot {
        Snapshot {
            phase: PollPhase::Settled,
            busy: false,
            error: None,
            investigation: Some(investigation(
                "x1",
                "failed logins",
                InvestigationStatus::Completed,
                Some("3 failed logins found"),
            )),
            polls: 2,
            elapsed: Some(Duration::from_secs(6)),
        }
    }

    #[test]
    fn report_carries_outcome_and_timing() {
        let report = build_report(&config(), &settled());
        assert_eq!(report.outcome, PollPhase::Settled);
        assert_eq!(report.polls, 2);
        assert_eq!(report.elapsed, Duration::from_secs(6));

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["outcome"], "settled");
        assert_eq!(json["poll_interval"], "3s");
        assert_eq!(json["elapsed"], "6s");
        assert_eq!(json["investigation"]["status"], "COMPLETED");
    }

    #[test]
    fn export_writes_into_new_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("report.json");
        let processed = process_completion(&config(), Some(&path), &settled());

        assert_eq!(
            processed.export_messages,
            vec![format!("Exported JSON: {}", path.display())]
        );
        assert_eq!(
            processed.status_line(),
            format!("Exported JSON: {} (2 checks in 6s)", path.display())
        );
        let written: InvestigationReport =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(
            written.investigation.unwrap().summary.as_deref(),
            Some("3 failed logins found")
        );
    }

    #[test]
    fn export_failure_is_reported_not_raised() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, "x").unwrap();
        let path = blocker.join("report.json");

        let processed = process_completion(&config(), Some(&path), &settled());
        assert_eq!(processed.export_messages.len(), 1);
        assert!(processed.export_messages[0].starts_with("Export JSON failed"));

        let mut snapshot = settled();
        snapshot.elapsed = Some(Duration::from_millis(6_400));
        let processed = process_completion(&config(), None, &snapshot);
        assert_eq!(processed.status_line(), "2 checks in 6s");
    }
}
