//! Client configuration and base URL resolution.

use anyhow::{bail, Context, Result};
use serde::Serialize;
use std::path::Path;
use std::time::Duration;

pub const BASE_URL_ENV: &str = "SENTINEL_API_BASE_URL";
pub const IN_CONTAINER_ENV: &str = "SENTINEL_IN_CONTAINER";

const LOCAL_BASE_URL: &str = "http://localhost:8000";
const CONTAINER_BASE_URL: &str = "http://api:8000";

#[derive(Debug, Clone, Serialize)]
pub struct ClientConfig {
    /// Always ends with `/` so endpoint paths can be appended.
    pub base_url: String,
    #[serde(with = "humantime_serde")]
    pub poll_interval: Duration,
    #[serde(with = "humantime_serde")]
    pub request_timeout: Option<Duration>,
    pub user_agent: String,
}

/// Pick the service address: an explicit override wins, otherwise the
/// container-network name when running inside one, else localhost.
pub fn resolve_base_url(override_url: Option<&str>, in_container: bool) -> Result<String> {
    let raw = match override_url.map(str::trim).filter(|s| !s.is_empty()) {
        Some(url) => url,
        None if in_container => CONTAINER_BASE_URL,
        None => LOCAL_BASE_URL,
    };

    let url = reqwest::Url::parse(raw).with_context(|| format!("invalid base URL `{raw}`"))?;
    match url.scheme() {
        "http" | "https" => {}
        other => bail!("unsupported base URL scheme `{other}` (expected http or https)"),
    }

    let mut normalized = url.to_string();
    if !normalized.ends_with('/') {
        normalized.push('/');
    }
    Ok(normalized)
}

/// Detect whether the client runs inside a container network.
pub fn running_in_container() -> bool {
    let flagged = std::env::var(IN_CONTAINER_ENV)
        .map(|v| matches!(v.trim(), "1" | "true" | "yes"))
        .unwrap_or(false);
    flagged || Path::new("/.dockerenv").exists()
}

/// Reject intervals the poll timer cannot run with.
pub fn validate_poll_interval(interval: Duration) -> Result<Duration> {
    if interval.is_zero() {
        bail!("--poll-interval must be greater than zero");
    }
    Ok(interval)
}
