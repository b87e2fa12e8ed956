//! Presentation model.
//!
//! `render` turns the current state into plain data; the TUI and the text
//! output both draw from it, so the status colours and the summary rules live
//! in one place.

use crate::model::{Investigation, InvestigationStatus};

pub const TITLE: &str = "Sentinel AI";
pub const TAGLINE: &str = "Agentic Security Log Analysis Copilot";
pub const INPUT_PLACEHOLDER: &str =
    "Enter your security query (e.g., 'Show me all failed login attempts or errors')";
pub const SUMMARY_PLACEHOLDER: &str = "No summary was generated.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

pub fn status_color(status: &InvestigationStatus) -> Rgb {
    match status {
        InvestigationStatus::Pending => Rgb(0xf0, 0xad, 0x4e),
        InvestigationStatus::InProgress => Rgb(0x02, 0x75, 0xd8),
        InvestigationStatus::Completed => Rgb(0x5c, 0xb8, 0x5c),
        InvestigationStatus::Failed => Rgb(0xd9, 0x53, 0x4f),
        InvestigationStatus::Unknown(_) => Rgb(0x6c, 0x75, 0x7d),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedView {
    pub query: String,
    pub input_enabled: bool,
    pub submit_label: &'static str,
    pub error: Option<String>,
    pub details: Option<DetailsView>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailsView {
    pub id: String,
    pub query: String,
    pub status: String,
    pub status_color: Rgb,
    pub created_at: Option<String>,
    /// Present only for terminal statuses.
    pub summary: Option<String>,
}

pub fn render(
    query: &str,
    busy: bool,
    error: Option<&str>,
    investigation: Option<&Investigation>,
) -> RenderedView {
    RenderedView {
        query: query.to_string(),
        input_enabled: !busy,
        submit_label: if busy {
            "Investigating..."
        } else {
            "Start Investigation"
        },
        error: error.filter(|e| !e.is_empty()).map(str::to_string),
        details: investigation.map(details),
    }
}

fn details(inv: &Investigation) -> DetailsView {
    let summary = inv
        .status
        .is_terminal()
        .then(|| inv.summary_text().unwrap_or(SUMMARY_PLACEHOLDER).to_string());
    DetailsView {
        id: inv.id.to_string(),
        query: inv.query.clone(),
        status: inv.status.to_string(),
        status_color: status_color(&inv.status),
        created_at: inv.created_at.clone(),
        summary,
    }
}

impl RenderedView {
    /// Plain-text rendering used outside the TUI.
    pub fn text_lines(&self) -> Vec<String> {
        let mut lines = Vec::new();
        if let Some(error) = self.error.as_deref() {
            lines.push(format!("Error: {error}"));
        }
        if let Some(d) = self.details.as_ref() {
            lines.push("Investigation Details".to_string());
            lines.push(format!("ID: {}", d.id));
            lines.push(format!("Query: {}", d.query));
            lines.push(format!("Status: {}", d.status));
            if let Some(created) = d.created_at.as_deref() {
                lines.push(format!("Created: {created}"));
            }
            if let Some(summary) = d.summary.as_deref() {
                lines.push(String::new());
                lines.push("AI Summary".to_string());
                lines.extend(summary.lines().map(str::to_string));
            }
        }
        lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::testing::investigation;

    #[test]
    fn completed_investigation_shows_summary_text() {
        let inv = investigation(
            "x1",
            "failed logins",
            InvestigationStatus::Completed,
            Some("3 failed logins found"),
        );
        let view = render("failed logins", false, None, Some(&inv));
        let d = view.details.unwrap();
        assert_eq!(d.status, "COMPLETED");
        assert_eq!(d.status_color, Rgb(0x5c, 0xb8, 0x5c));
        assert_eq!(d.summary.as_deref(), Some("3 failed logins found"));
        assert!(view.input_enabled);
        assert_eq!(view.submit_label, "Start Investigation");
    }

    #[test]
    fn failed_without_summary_uses_placeholder() {
        let inv = investigation("x1", "q", InvestigationStatus::Failed, None);
        let d = render("q", false, None, Some(&inv)).details.unwrap();
        assert_eq!(d.summary.as_deref(), Some(SUMMARY_PLACEHOLDER));

        let blank = investigation("x1", "q", InvestigationStatus::Completed, Some(""));
        let d = render("q", false, None, Some(&blank)).details.unwrap();
        assert_eq!(d.summary.as_deref(), Some(SUMMARY_PLACEHOLDER));
    }

    #[test]
    fn summary_hidden_until_terminal() {
        for status in [
            InvestigationStatus::Pending,
            InvestigationStatus::InProgress,
            InvestigationStatus::Unknown("QUEUED".into()),
        ] {
            let inv = investigation("x1", "q", status, Some("early"));
            let d = render("q", true, None, Some(&inv)).details.unwrap();
            assert!(d.summary.is_none());
        }
    }

    #[test]
    fn status_colours_fall_back_for_unknown_values() {
        assert_eq!(status_color(&InvestigationStatus::Pending), Rgb(0xf0, 0xad, 0x4e));
        assert_eq!(status_color(&InvestigationStatus::InProgress), Rgb(0x02, 0x75, 0xd8));
        assert_eq!(status_color(&InvestigationStatus::Failed), Rgb(0xd9, 0x53, 0x4f));
        assert_eq!(
            status_color(&InvestigationStatus::Unknown("ARCHIVED".into())),
            Rgb(0x6c, 0x75, 0x7d)
        );
    }

    #[test]
    fn busy_disables_input_and_error_is_shown() {
        let view = render("q", true, Some("Failed to fetch investigation status."), None);
        assert!(!view.input_enabled);
        assert_eq!(view.submit_label, "Investigating...");
        assert!(view.details.is_none());
        assert_eq!(
            view.text_lines(),
            vec!["Error: Failed to fetch investigation status.".to_string()]
        );
    }

    #[test]
    fn text_lines_for_settled_investigation() {
        let inv = investigation("x1", "q", InvestigationStatus::Failed, None);
        let lines = render("q", false, None, Some(&inv)).text_lines();
        assert_eq!(
            lines,
            vec![
                "Investigation Details",
                "ID: x1",
                "Query: q",
                "Status: FAILED",
                "",
                "AI Summary",
                SUMMARY_PLACEHOLDER,
            ]
        );
    }
}
