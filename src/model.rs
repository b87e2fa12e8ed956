use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::time::Duration;

/// Opaque identifier assigned by the investigation service.
///
/// The service currently hands out integers; the client never does arithmetic
/// on ids, so both JSON numbers and strings are accepted and kept as text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct InvestigationId(String);

impl InvestigationId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InvestigationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for InvestigationId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Int(i64),
            Text(String),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Int(n) => Self::new(n.to_string()),
            Raw::Text(s) => Self::new(s),
        })
    }
}

/// Lifecycle status reported by the service.
///
/// The value comes off the wire, so anything outside the four known states is
/// kept verbatim in `Unknown` instead of failing the whole response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvestigationStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
    Unknown(String),
}

impl InvestigationStatus {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "PENDING" => Self::Pending,
            "IN_PROGRESS" => Self::InProgress,
            "COMPLETED" => Self::Completed,
            "FAILED" => Self::Failed,
            other => Self::Unknown(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Pending => "PENDING",
            Self::InProgress => "IN_PROGRESS",
            Self::Completed => "COMPLETED",
            Self::Failed => "FAILED",
            Self::Unknown(raw) => raw,
        }
    }

    /// `COMPLETED` and `FAILED` are final; unknown values are not, since the
    /// service never said the work is done.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

impl fmt::Display for InvestigationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for InvestigationStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for InvestigationStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::parse(&raw))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Investigation {
    pub id: InvestigationId,
    pub query: String,
    pub status: InvestigationStatus,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

impl Investigation {
    /// Summary text, if the service produced a non-blank one.
    pub fn summary_text(&self) -> Option<&str> {
        self.summary.as_deref().filter(|s| !s.trim().is_empty())
    }
}

/// Body of `POST /investigate`.
#[derive(Debug, Serialize)]
pub struct InvestigationRequest<'a> {
    pub query: &'a str,
}

/// Where the tracking of the current investigation stands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PollPhase {
    #[default]
    Idle,
    Polling,
    Settled,
    Errored,
}

/// Final record of one tracked investigation, printed by `--json` and written by exports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvestigationReport {
    pub finished_utc: String,
    pub base_url: String,
    #[serde(with = "humantime_serde")]
    pub poll_interval: Duration,
    pub polls: u32,
    #[serde(with = "humantime_serde")]
    pub elapsed: Duration,
    pub outcome: PollPhase,
    #[serde(default)]
    pub error: Option<String>,
    pub investigation: Option<Investigation>,
}
