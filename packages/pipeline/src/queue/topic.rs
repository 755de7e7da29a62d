use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TopicStatus {
    Pending,
    Processing,
    Researching,
    Completed,
    Failed,
    NeedsReview,
}

impl TopicStatus {
    pub const ALL: [TopicStatus; 6] = [
        TopicStatus::Pending,
        TopicStatus::Processing,
        TopicStatus::Researching,
        TopicStatus::Completed,
        TopicStatus::Failed,
        TopicStatus::NeedsReview,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TopicStatus::Pending => "pending",
            TopicStatus::Processing => "processing",
            TopicStatus::Researching => "researching",
            TopicStatus::Completed => "completed",
            TopicStatus::Failed => "failed",
            TopicStatus::NeedsReview => "needs_review",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, TopicStatus::Completed | TopicStatus::Failed)
    }

    /// The queue state machine.
    ///
    /// pending → processing → researching → completed | needs_review | failed,
    /// any non-terminal state → failed, and failed → pending on reset.
    pub fn can_transition_to(&self, next: TopicStatus) -> bool {
        use TopicStatus::*;
        match (*self, next) {
            (Pending, Processing) => true,
            (Processing, Researching) => true,
            (Researching, Completed | NeedsReview) => true,
            (Failed, Pending) => true,
            (from, Failed) => !from.is_terminal(),
            _ => false,
        }
    }
}

impl fmt::Display for TopicStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TopicStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TopicStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("unknown status '{}'", s))
    }
}

/// Ordered so that `High < Medium < Low`; the smallest pending priority runs
/// first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    #[default]
    Medium,
    Low,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "high" => Ok(Priority::High),
            "medium" => Ok(Priority::Medium),
            "low" => Ok(Priority::Low),
            other => Err(format!("unknown priority '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topic {
    pub slug: String,
    pub name: String,
    pub category: String,
    #[serde(default)]
    pub priority: Priority,
    pub status: TopicStatus,
    pub added_date: NaiveDate,
    pub last_update: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

/// Input to [`super::QueueDocument::add`].
#[derive(Debug, Clone, Default)]
pub struct NewTopic {
    pub name: String,
    pub category: String,
    pub priority: Priority,
    pub template_id: Option<String>,
    /// Generated from the name and date when absent.
    pub slug: Option<String>,
}

impl NewTopic {
    pub fn new(name: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            category: category.into(),
            ..Self::default()
        }
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_template(mut self, template_id: impl Into<String>) -> Self {
        self.template_id = Some(template_id.into());
        self
    }

    pub fn with_slug(mut self, slug: impl Into<String>) -> Self {
        self.slug = Some(slug.into());
        self
    }
}

/// Optional fields recorded alongside a status change.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusExtras {
    pub session_url: Option<String>,
    pub last_error: Option<String>,
}

impl StatusExtras {
    pub fn error(reason: impl Into<String>) -> Self {
        Self {
            last_error: Some(reason.into()),
            ..Self::default()
        }
    }

    pub fn with_session_url(mut self, url: Option<String>) -> Self {
        self.session_url = url;
        self
    }
}

/// `queue list` filter. Empty fields match everything.
#[derive(Debug, Clone, Default)]
pub struct TopicFilter {
    pub status: Option<TopicStatus>,
    pub category: Option<String>,
}

impl TopicFilter {
    pub fn matches(&self, topic: &Topic) -> bool {
        self.status.map_or(true, |s| topic.status == s)
            && self
                .category
                .as_deref()
                .map_or(true, |c| topic.category.eq_ignore_ascii_case(c))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_machine_edges() {
        use TopicStatus::*;
        let allowed = [
            (Pending, Processing),
            (Processing, Researching),
            (Researching, Completed),
            (Researching, NeedsReview),
            (Researching, Failed),
            (Pending, Failed),
            (Processing, Failed),
            (NeedsReview, Failed),
            (Failed, Pending),
        ];
        for from in TopicStatus::ALL {
            for to in TopicStatus::ALL {
                assert_eq!(
                    from.can_transition_to(to),
                    allowed.contains(&(from, to)),
                    "{} -> {}",
                    from,
                    to
                );
            }
        }
    }

    #[test]
    fn priority_orders_high_first() {
        assert!(Priority::High < Priority::Medium);
        assert!(Priority::Medium < Priority::Low);
        assert_eq!("low".parse::<Priority>(), Ok(Priority::Low));
    }

    #[test]
    fn status_names_round_trip() {
        for status in TopicStatus::ALL {
            assert_eq!(status.as_str().parse::<TopicStatus>(), Ok(status));
            assert_eq!(
                serde_json::to_value(status).unwrap(),
                serde_json::json!(status.as_str())
            );
        }
    }
}
