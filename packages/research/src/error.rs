//! Typed errors for the research library.
//!
//! Uses `thiserror` for library errors (not `anyhow`). Drivers return these and
//! never touch the topic queue; the orchestrator decides what a failure means
//! for the topic.

use std::time::Duration;

use report::SchemaViolation;
use thiserror::Error;

/// Failures talking to a research provider session.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Credentials rejected or missing
    #[error("{provider} session is not authenticated")]
    NotAuthenticated { provider: String },

    /// Provider resource could not be reached (unknown job, bad endpoint)
    #[error("navigation failed: {0}")]
    Navigation(String),

    /// Expected element or field missing from the provider response
    #[error("element not found: {0}")]
    ElementNotFound(String),

    /// Network or server-side failure
    #[error("transport error: {0}")]
    Transport(String),

    /// Provider reported a failed job or rejected the request
    #[error("provider error: {0}")]
    Provider(String),
}

impl SessionError {
    /// Worth retrying with a fresh session.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            SessionError::Navigation(_) | SessionError::ElementNotFound(_) | SessionError::Transport(_)
        )
    }
}

/// Errors from the research driver.
#[derive(Debug, Error)]
pub enum ResearchError {
    #[error("session failed: {0}")]
    Session(#[from] SessionError),

    /// Provider did not finish within its hard cap
    #[error("{provider} research exceeded its {} minute cap", .limit.as_secs() / 60)]
    DeadlineExceeded { provider: String, limit: Duration },

    #[error("config error: {0}")]
    Config(String),

    /// Prompt template missing or malformed
    #[error("template error: {0}")]
    Template(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors from the extraction driver.
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// Response held no balanced JSON object, or the object is not valid JSON
    #[error("could not parse extractor output: {0}")]
    Parse(String),

    /// JSON parsed but is not a conformant report record
    #[error("extractor output violates the report schema: {}", summarize(.0))]
    Schema(Vec<SchemaViolation>),

    /// Extraction provider failed or returned nothing
    #[error("extraction provider error: {0}")]
    Provider(String),

    /// Research artifacts are missing, partial, or not completed
    #[error("research for '{slug}' is not usable: {reason}")]
    IncompleteResearch { slug: String, reason: String },

    #[error("config error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

fn summarize(violations: &[SchemaViolation]) -> String {
    match violations {
        [] => "no violations recorded".to_string(),
        [only] => only.to_string(),
        [first, rest @ ..] => format!("{} (and {} more)", first, rest.len()),
    }
}

impl From<report::ReportError> for ExtractionError {
    fn from(err: report::ReportError) -> Self {
        match err {
            report::ReportError::Schema(violations) => ExtractionError::Schema(violations),
            report::ReportError::JsonParse(e) => {
                ExtractionError::Schema(vec![SchemaViolation::new("$", e.to_string())])
            }
        }
    }
}

pub type SessionResult<T> = std::result::Result<T, SessionError>;
pub type Result<T> = std::result::Result<T, ResearchError>;
pub type ExtractionResult<T> = std::result::Result<T, ExtractionError>;
