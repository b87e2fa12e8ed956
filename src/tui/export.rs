use crate::config::ClientConfig;
use crate::orchestrator::{self, Snapshot};
use anyhow::{Context, Result};
use std::sync::mpsc as std_mpsc;
use std::sync::OnceLock;
use std::time::Duration;

// Global clipboard manager channel - initialized once on first use
static CLIPBOARD_SENDER: OnceLock<std_mpsc::Sender<String>> = OnceLock::new();

/// Save the current investigation report into the working directory.
/// Returns the absolute path of the written file.
pub fn save_report(cfg: &ClientConfig, snapshot: &Snapshot) -> Result<std::path::PathBuf> {
    let inv = snapshot
        .investigation
        .as_ref()
        .context("no investigation to save yet")?;
    let report = orchestrator::build_report(cfg, snapshot);
    let file_name = report_file_name(inv.id.as_str(), &report.finished_utc);

    let current_dir = std::env::current_dir().context("get current directory")?;
    let path = current_dir.join(file_name);
    orchestrator::export_json(&path, &report)?;
    Ok(path)
}

fn report_file_name(id: &str, timestamp: &str) -> String {
    let safe_id: String = id
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
        .take(32)
        .collect();
    format!(
        "sentinel-investigation-{}-{}.json",
        safe_id,
        timestamp.replace(':', "-").replace('T', "_")
    )
}

/// Text put on the clipboard: the id, plus the summary once there is one.
pub fn clipboard_text(snapshot: &Snapshot) -> Option<String> {
    let inv = snapshot.investigation.as_ref()?;
    Some(match inv.summary_text() {
        Some(summary) => format!("Investigation {}\n{}", inv.id, summary),
        None => format!("Investigation {}", inv.id),
    })
}

/// Initialize the clipboard manager thread if not already initialized.
/// This creates a background thread that processes clipboard operations sequentially,
/// keeping each clipboard instance alive for a sufficient duration.
fn init_clipboard_manager() -> Result<&'static std_mpsc::Sender<String>> {
    CLIPBOARD_SENDER.get_or_init(|| {
        let (tx, rx) = std_mpsc::channel::<String>();

        std::thread::spawn(move || {
            use arboard::Clipboard;

            for text in rx {
                if let Ok(mut clipboard) = Clipboard::new() {
                    if clipboard.set_text(&text).is_ok() {
                        // Clipboard managers on Linux read lazily from the owning process.
                        std::thread::sleep(Duration::from_secs(2));
                    }
                }
            }
        });

        tx
    });

    CLIPBOARD_SENDER
        .get()
        .ok_or_else(|| anyhow::anyhow!("Failed to initialize clipboard manager"))
}

/// Copy text to clipboard without blocking the UI thread.
pub fn copy_to_clipboard(text: &str) -> Result<()> {
    let sender = init_clipboard_manager()?;
    sender
        .send(text.to_string())
        .map_err(|_| anyhow::anyhow!("Clipboard manager channel closed"))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::testing::investigation;
    use crate::model::InvestigationStatus;

    #[test]
    fn file_name_is_filesystem_safe() {
        assert_eq!(
            report_file_name("a/b 1", "2024-05-01T10:00:06Z"),
            "sentinel-investigation-a_b_1-2024-05-01_10-00-06Z.json"
        );
    }

    #[test]
    fn clipboard_text_includes_summary_when_present() {
        assert_eq!(clipboard_text(&Snapshot::default()), None);

        let mut snap = Snapshot {
            investigation: Some(investigation("7", "q", InvestigationStatus::InProgress, None)),
            ..Snapshot::default()
        };
        assert_eq!(clipboard_text(&snap).as_deref(), Some("Investigation 7"));

        snap.investigation = Some(investigation(
            "7",
            "q",
            InvestigationStatus::Completed,
            Some("3 failed logins found"),
        ));
        assert_eq!(
            clipboard_text(&snap).as_deref(),
            Some("Investigation 7\n3 failed logins found")
        );
    }
}
