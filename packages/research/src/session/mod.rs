//! Research provider sessions.
//!
//! A [`Session`] exposes the handful of verbs the research driver needs from a
//! deep-research provider. Everything provider-specific (endpoints, status
//! strings, where links live in a response) stays inside one adapter file per
//! provider, so a provider change is a single-file fix.

mod http;
pub mod openai;
pub mod perplexity;

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::SessionResult;

pub use openai::OpenAIDeepResearch;
pub use perplexity::PerplexityDeepResearch;

/// Which slot a provider fills in the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Primary,
    Fallback,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Primary => "primary",
            Provider::Fallback => "fallback",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An anchor found in a research response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub url: String,
    #[serde(default)]
    pub title: String,
}

impl Link {
    pub fn new(url: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
        }
    }
}

/// One authenticated conversation with a research provider.
#[async_trait]
pub trait Session: Send {
    /// Fail with `NotAuthenticated` when the provider rejects our credentials.
    async fn ensure_authenticated(&mut self) -> SessionResult<()>;

    /// Switch the conversation into deep-research mode.
    async fn enable_deep_research(&mut self) -> SessionResult<()>;

    async fn submit_prompt(&mut self, prompt: &str) -> SessionResult<()>;

    /// Accept a research plan if the provider asks for one. Returns whether a
    /// confirmation was needed.
    async fn confirm_plan(&mut self) -> SessionResult<bool>;

    /// `true` while the provider shows its "still researching" indicator.
    async fn is_researching(&mut self) -> SessionResult<bool>;

    /// Full response through the provider's export path, links preserved.
    async fn copy_response(&mut self) -> SessionResult<Option<String>>;

    /// Text of the last assistant turn.
    async fn last_turn_text(&mut self) -> SessionResult<String>;

    /// Every anchor in the response, provider-internal ones included.
    async fn links(&mut self) -> SessionResult<Vec<Link>>;

    /// Where an operator can inspect this session.
    fn session_url(&self) -> Option<String>;

    async fn close(&mut self) {}
}

/// Opens fresh sessions against one provider.
#[async_trait]
pub trait SessionFactory: Send + Sync {
    /// Short name used in logs and job records.
    fn name(&self) -> &str;

    fn provider(&self) -> Provider;

    /// The provider's own domain; links there are not research sources.
    fn home_domain(&self) -> &str;

    /// Longest a single research run may take.
    fn hard_cap(&self) -> Duration;

    async fn open(&self, headless: bool) -> SessionResult<Box<dyn Session>>;
}

/// Hard cap for the primary provider.
pub const PRIMARY_HARD_CAP: Duration = Duration::from_secs(40 * 60);
/// Hard cap for the fallback provider.
pub const FALLBACK_HARD_CAP: Duration = Duration::from_secs(30 * 60);
