//! Pipeline errors.
//!
//! `QueueError` covers the topic queue; `PipelineError` is what the
//! orchestrator and publisher return. The binary wraps both in `anyhow`.

use std::path::PathBuf;
use std::time::Duration;

use research::{ExtractionError, ResearchError};
use thiserror::Error;

use crate::queue::TopicStatus;

#[derive(Debug, Error)]
pub enum QueueError {
    #[error("a topic with slug '{0}' is already queued")]
    DuplicateSlug(String),

    #[error("no topic with slug '{0}'")]
    UnknownSlug(String),

    #[error("topic '{slug}' cannot move from {from} to {to}")]
    IllegalTransition {
        slug: String,
        from: TopicStatus,
        to: TopicStatus,
    },

    /// Name or slug unusable
    #[error("invalid topic: {0}")]
    InvalidTopic(String),

    /// Another process holds the lock file
    #[error("{} is locked by another run", .path.display())]
    Locked { path: PathBuf },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("config error: {0}")]
    Config(String),

    #[error(transparent)]
    Queue(#[from] QueueError),

    #[error("research failed: {0}")]
    Research(#[from] ResearchError),

    #[error("extraction failed: {0}")]
    Extraction(#[from] ExtractionError),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("publish failed: {0}")]
    Publish(String),

    #[error("{stage} exceeded its {} minute deadline", .limit.as_secs() / 60)]
    Deadline { stage: String, limit: Duration },

    /// Topic is failed or waiting on an editor
    #[error("topic '{slug}' is {status}; reset it before running again")]
    NotRunnable { slug: String, status: TopicStatus },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type QueueResult<T> = std::result::Result<T, QueueError>;
pub type Result<T> = std::result::Result<T, PipelineError>;
