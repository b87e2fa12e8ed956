//! HTTP client for the investigation service.

use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::model::{Investigation, InvestigationId, InvestigationRequest};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Url;
use std::sync::Arc;

/// Operations the client needs from the investigation service.
#[async_trait]
pub trait InvestigationApi: Send + Sync {
    /// `POST /investigate`
    async fn start_investigation(&self, query: &str) -> Result<Investigation, ApiError>;

    /// `GET /investigations/{id}`
    async fn get_investigation(&self, id: &InvestigationId) -> Result<Investigation, ApiError>;
}

pub type SharedApi = Arc<dyn InvestigationApi>;

pub struct HttpInvestigationClient {
    http: reqwest::Client,
    base_url: Url,
}

impl HttpInvestigationClient {
    pub fn new(cfg: &ClientConfig) -> Result<Self> {
        let base_url = Url::parse(&cfg.base_url)
            .with_context(|| format!("invalid base URL `{}`", cfg.base_url))?;

        let mut builder = reqwest::Client::builder().user_agent(cfg.user_agent.clone());
        if let Some(timeout) = cfg.request_timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().context("build HTTP client")?;

        Ok(Self { http, base_url })
    }

    fn endpoint<'a>(&self, segments: impl IntoIterator<Item = &'a str>) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::Transport(format!("base URL `{}` cannot be a base", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

#[async_trait]
impl InvestigationApi for HttpInvestigationClient {
    async fn start_investigation(&self, query: &str) -> Result<Investigation, ApiError> {
        let url = self.endpoint(["investigate"])?;
        tracing::debug!(%url, "creating investigation");
        let resp = self
            .http
            .post(url)
            .json(&InvestigationRequest { query })
            .send()
            .await?;
        decode_investigation(resp).await
    }

    async fn get_investigation(&self, id: &InvestigationId) -> Result<Investigation, ApiError> {
        let url = self.endpoint(["investigations", id.as_str()])?;
        tracing::trace!(%url, "fetching investigation status");
        let resp = self.http.get(url).send().await?;
        decode_investigation(resp).await
    }
}

async fn decode_investigation(resp: reqwest::Response) -> Result<Investigation, ApiError> {
    let status = resp.status();
    let body = resp.bytes().await?;
    if !status.is_success() {
        return Err(ApiError::Status {
            status: status.as_u16(),
            detail: error_detail(&body),
        });
    }
    Ok(serde_json::from_slice(&body)?)
}

/// Pull a readable message out of an error body. The service answers with
/// `{"detail": ...}`; anything else is shown as (truncated) text.
fn error_detail(body: &[u8]) -> String {
    const MAX_CHARS: usize = 200;

    if let Ok(value) = serde_json::from_slice::<serde_json::Value>(body) {
        match value.get("detail") {
            Some(serde_json::Value::String(s)) => return s.clone(),
            Some(other) => return other.to_string(),
            None => {}
        }
    }

    let text = String::from_utf8_lossy(body);
    let text = text.trim();
    if text.is_empty() {
        return "empty response body".to_string();
    }
    if text.chars().count() > MAX_CHARS {
        let truncated: String = text.chars().take(MAX_CHARS).collect();
        format!("{truncated}…")
    } else {
        text.to_string()
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Scripted in-memory service used by controller tests.

    use super::*;
    use crate::model::InvestigationStatus;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;
    use tokio::time::Instant;

    pub(crate) fn investigation(
        id: &str,
        query: &str,
        status: InvestigationStatus,
        summary: Option<&str>,
    ) -> Investigation {
        Investigation {
            id: InvestigationId::new(id),
            query: query.to_string(),
            status,
            summary: summary.map(str::to_string),
            created_at: None,
        }
    }

    pub(crate) fn unavailable() -> ApiError {
        ApiError::Status {
            status: 503,
            detail: "service unavailable".into(),
        }
    }

    #[derive(Default)]
    pub(crate) struct ScriptedApi {
        starts: Mutex<VecDeque<Result<Investigation, ApiError>>>,
        polls: Mutex<VecDeque<Result<Investigation, ApiError>>>,
        start_queries: Mutex<Vec<String>>,
        poll_times: Mutex<Vec<Instant>>,
        start_latency: Duration,
        poll_latency: Duration,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
    }

    impl ScriptedApi {
        pub(crate) fn new() -> Self {
            Self::default()
        }

        pub(crate) fn with_start_latency(mut self, latency: Duration) -> Self {
            self.start_latency = latency;
            self
        }

        pub(crate) fn with_poll_latency(mut self, latency: Duration) -> Self {
            self.poll_latency = latency;
            self
        }

        pub(crate) fn start_reply(self, reply: Result<Investigation, ApiError>) -> Self {
            self.starts.lock().unwrap().push_back(reply);
            self
        }

        pub(crate) fn poll_reply(self, reply: Result<Investigation, ApiError>) -> Self {
            self.polls.lock().unwrap().push_back(reply);
            self
        }

        pub(crate) fn start_calls(&self) -> usize {
            self.start_queries.lock().unwrap().len()
        }

        pub(crate) fn start_queries(&self) -> Vec<String> {
            self.start_queries.lock().unwrap().clone()
        }

        pub(crate) fn poll_calls(&self) -> usize {
            self.poll_times.lock().unwrap().len()
        }

        pub(crate) fn poll_times(&self) -> Vec<Instant> {
            self.poll_times.lock().unwrap().clone()
        }

        pub(crate) fn max_polls_in_flight(&self) -> usize {
            self.max_in_flight.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl InvestigationApi for ScriptedApi {
        async fn start_investigation(&self, query: &str) -> Result<Investigation, ApiError> {
            self.start_queries.lock().unwrap().push(query.to_string());
            if !self.start_latency.is_zero() {
                tokio::time::sleep(self.start_latency).await;
            }
            self.starts
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(ApiError::Transport("no scripted start reply".into())))
        }

        async fn get_investigation(&self, _id: &InvestigationId) -> Result<Investigation, ApiError> {
            self.poll_times.lock().unwrap().push(Instant::now());
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            if !self.poll_latency.is_zero() {
                tokio::time::sleep(self.poll_latency).await;
            }
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            self.polls
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(ApiError::Transport("no scripted poll reply".into())))
        }
    }
}
