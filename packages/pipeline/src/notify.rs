//! Operator notifications.
//!
//! Every published, failed or needs-review topic produces one
//! [`Notification`]. Delivery problems are logged and never fail the run.

use std::fmt;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

pub const MAX_TOPIC_CHARS: usize = 60;
pub const MAX_REASON_CHARS: usize = 200;

/// Pipeline stage a notification is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Research,
    Extraction,
    Validation,
    Publish,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Research => "research",
            Stage::Extraction => "extraction",
            Stage::Validation => "validation",
            Stage::Publish => "publish",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Published,
    NeedsReview,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    /// Topic name, cut to [`MAX_TOPIC_CHARS`]
    pub topic: String,
    pub slug: String,
    pub stage: Stage,
    pub outcome: Outcome,
    /// First line of the reason, cut to [`MAX_REASON_CHARS`]
    pub reason: String,
}

impl Notification {
    pub fn new(topic: &str, slug: &str, stage: Stage, outcome: Outcome, reason: &str) -> Self {
        let first_line = reason.lines().find(|l| !l.trim().is_empty()).unwrap_or("");
        Self {
            topic: truncate(topic.trim(), MAX_TOPIC_CHARS),
            slug: slug.to_string(),
            stage,
            outcome,
            reason: truncate(first_line.trim(), MAX_REASON_CHARS),
        }
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        None => text.to_string(),
        Some((byte, _)) => format!("{}...", text[..byte].trim_end()),
    }
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, notification: &Notification);
}

/// Writes notifications to the log.
#[derive(Debug, Clone, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, n: &Notification) {
        match n.outcome {
            Outcome::Published => {
                info!(topic = %n.topic, slug = %n.slug, "Report published")
            }
            Outcome::NeedsReview => warn!(
                topic = %n.topic,
                slug = %n.slug,
                stage = %n.stage,
                reason = %n.reason,
                "Topic needs editorial review"
            ),
            Outcome::Failed => error!(
                topic = %n.topic,
                slug = %n.slug,
                stage = %n.stage,
                reason = %n.reason,
                "Topic failed"
            ),
        }
    }
}

/// POSTs the notification as JSON.
#[derive(Clone)]
pub struct WebhookNotifier {
    client: Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(url: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn notify(&self, notification: &Notification) {
        let result = self.client.post(&self.url).json(notification).send().await;
        match result {
            Ok(response) if response.status().is_success() => {}
            Ok(response) => warn!(status = %response.status(), "Notification webhook rejected payload"),
            Err(e) => warn!(error = %e, "Notification webhook unreachable"),
        }
    }
}

/// Sends every notification to each inner notifier in turn.
#[derive(Clone, Default)]
pub struct FanoutNotifier {
    notifiers: Vec<Arc<dyn Notifier>>,
}

impl FanoutNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifiers.push(notifier);
        self
    }
}

#[async_trait]
impl Notifier for FanoutNotifier {
    async fn notify(&self, notification: &Notification) {
        for notifier in &self.notifiers {
            notifier.notify(notification).await;
        }
    }
}

/// Keeps notifications in memory.
#[derive(Clone, Default)]
pub struct RecordingNotifier {
    sent: Arc<RwLock<Vec<Notification>>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<Notification> {
        self.sent.read().map(|s| s.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, notification: &Notification) {
        if let Ok(mut sent) = self.sent.write() {
            sent.push(notification.clone());
        }
    }
}
