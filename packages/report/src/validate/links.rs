//! Source link accessibility.
//!
//! Each source url gets one HEAD request. Probes fan out with bounded
//! concurrency and share a single deadline; results are consumed only after
//! every probe has returned.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use tokio::time::{timeout_at, Instant};
use tracing::{debug, warn};

/// Outcome of probing one url.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkStatus {
    /// Final status after redirects was below 400.
    Accessible(u16),
    /// Final status after redirects was 400 or above.
    Status(u16),
    /// Request failed (DNS, TLS, connection, too many redirects).
    Failed(String),
    /// No response before the deadline.
    TimedOut,
}

impl LinkStatus {
    pub fn is_accessible(&self) -> bool {
        matches!(self, LinkStatus::Accessible(_))
    }

    pub fn from_status_code(code: u16) -> Self {
        if code < 400 {
            LinkStatus::Accessible(code)
        } else {
            LinkStatus::Status(code)
        }
    }

    pub fn describe(&self) -> String {
        match self {
            LinkStatus::Accessible(code) => format!("HTTP {}", code),
            LinkStatus::Status(code) => format!("HTTP {}", code),
            LinkStatus::Failed(reason) => reason.clone(),
            LinkStatus::TimedOut => "timed out".to_string(),
        }
    }
}

/// Something that can tell whether a url is reachable.
#[async_trait]
pub trait LinkProbe: Send + Sync {
    async fn probe(&self, url: &str) -> LinkStatus;
}

/// HEAD requests over `reqwest`, following redirects.
pub struct HttpLinkProbe {
    client: reqwest::Client,
}

impl HttpLinkProbe {
    pub const USER_AGENT: &'static str = "FactDeskLinkCheck/1.0";

    pub fn new(timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(10))
            .user_agent(Self::USER_AGENT)
            .build()
            .unwrap_or_else(|e| {
                warn!(error = %e, "Falling back to default HTTP client for link checks");
                reqwest::Client::new()
            });
        Self { client }
    }

    /// Use a preconfigured client.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl Default for HttpLinkProbe {
    fn default() -> Self {
        Self::new(Duration::from_secs(10))
    }
}

#[async_trait]
impl LinkProbe for HttpLinkProbe {
    async fn probe(&self, url: &str) -> LinkStatus {
        match self.client.head(url).send().await {
            Ok(response) => LinkStatus::from_status_code(response.status().as_u16()),
            Err(e) if e.is_timeout() => LinkStatus::TimedOut,
            Err(e) => LinkStatus::Failed(e.to_string()),
        }
    }
}

/// Canned responses, for tests and offline runs.
///
/// Urls without a canned answer are accessible unless `default_status` says
/// otherwise. A `delay` makes every probe sleep first, to exercise deadlines.
#[derive(Clone, Default)]
pub struct StaticLinkProbe {
    responses: Arc<RwLock<HashMap<String, LinkStatus>>>,
    default_status: Option<LinkStatus>,
    delay: Option<Duration>,
    calls: Arc<RwLock<Vec<String>>>,
}

impl StaticLinkProbe {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_status(self, url: impl Into<String>, status: LinkStatus) -> Self {
        if let Ok(mut responses) = self.responses.write() {
            responses.insert(url.into(), status);
        }
        self
    }

    pub fn with_default(mut self, status: LinkStatus) -> Self {
        self.default_status = Some(status);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Urls probed so far.
    pub fn calls(&self) -> Vec<String> {
        self.calls.read().map(|c| c.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl LinkProbe for StaticLinkProbe {
    async fn probe(&self, url: &str) -> LinkStatus {
        if let Ok(mut calls) = self.calls.write() {
            calls.push(url.to_string());
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let canned = self
            .responses
            .read()
            .ok()
            .and_then(|r| r.get(url).cloned());
        canned
            .or_else(|| self.default_status.clone())
            .unwrap_or(LinkStatus::Accessible(200))
    }
}

/// Probe every url, at most `max_parallel` at a time, all bounded by one
/// deadline `budget` from now. Results come back in input order.
pub async fn check_links(
    probe: &dyn LinkProbe,
    urls: &[String],
    max_parallel: usize,
    budget: Duration,
) -> Vec<(String, LinkStatus)> {
    let deadline = Instant::now() + budget;
    let max_parallel = max_parallel.clamp(1, urls.len().max(1));

    let mut results: Vec<(usize, String, LinkStatus)> = stream::iter(urls.iter().enumerate())
        .map(|(i, url)| async move {
            let status = match timeout_at(deadline, probe.probe(url)).await {
                Ok(status) => status,
                Err(_) => LinkStatus::TimedOut,
            };
            debug!(url = %url, status = %status.describe(), "Link probed");
            (i, url.clone(), status)
        })
        .buffer_unordered(max_parallel)
        .collect()
        .await;

    results.sort_by_key(|(i, _, _)| *i);
    results
        .into_iter()
        .map(|(_, url, status)| (url, status))
        .collect()
}
