//! Topic queue.
//!
//! [`QueueDocument`] is the whole queue as plain data with the pure
//! operations on it. [`TopicQueue`] persists a document on disk: every
//! mutation takes the queue lock, loads the document, applies the change, and
//! rewrites the file atomically.

pub mod slug;
pub mod topic;

use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{QueueError, QueueResult};
use crate::lockfile::{lock_path_for, LockFile};
pub use slug::{slugify, topic_slug};
pub use topic::{NewTopic, Priority, StatusExtras, Topic, TopicFilter, TopicStatus};

pub const QUEUE_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueDocument {
    pub version: u32,
    pub last_updated: DateTime<Utc>,
    #[serde(default)]
    pub topics: Vec<Topic>,
}

impl Default for QueueDocument {
    fn default() -> Self {
        Self {
            version: QUEUE_VERSION,
            last_updated: DateTime::<Utc>::UNIX_EPOCH,
            topics: Vec::new(),
        }
    }
}

impl QueueDocument {
    pub fn get(&self, slug: &str) -> Option<&Topic> {
        self.topics.iter().find(|t| t.slug == slug)
    }

    pub fn list(&self, filter: &TopicFilter) -> Vec<&Topic> {
        self.topics.iter().filter(|t| filter.matches(t)).collect()
    }

    /// Append a pending topic. The slug comes from the name and `today`
    /// unless given.
    pub fn add(&mut self, new: NewTopic, today: NaiveDate, now: DateTime<Utc>) -> QueueResult<&Topic> {
        let name = new.name.trim();
        if name.is_empty() {
            return Err(QueueError::InvalidTopic("topic name is empty".into()));
        }
        let slug = match new.slug {
            Some(slug) if report::schema::is_kebab_slug(&slug) => slug,
            Some(slug) => {
                return Err(QueueError::InvalidTopic(format!(
                    "slug '{}' must be lower-kebab-case",
                    slug
                )))
            }
            None => topic_slug(name, today).ok_or_else(|| {
                QueueError::InvalidTopic(format!("cannot derive a slug from '{}'", name))
            })?,
        };
        if self.get(&slug).is_some() {
            return Err(QueueError::DuplicateSlug(slug));
        }

        let now = self.stamp(now);
        self.topics.push(Topic {
            slug,
            name: name.to_string(),
            category: new.category,
            priority: new.priority,
            status: TopicStatus::Pending,
            added_date: today,
            last_update: now,
            session_url: None,
            template_id: new.template_id,
            last_error: None,
        });
        Ok(&self.topics[self.topics.len() - 1])
    }

    /// Highest-priority pending topic; earliest added wins a tie.
    pub fn next_pending(&self) -> Option<&Topic> {
        self.topics
            .iter()
            .enumerate()
            .filter(|(_, t)| t.status == TopicStatus::Pending)
            .min_by_key(|(position, t)| (t.priority, *position))
            .map(|(_, t)| t)
    }

    pub fn set_status(
        &mut self,
        slug: &str,
        status: TopicStatus,
        extras: StatusExtras,
        now: DateTime<Utc>,
    ) -> QueueResult<&Topic> {
        let position = self
            .topics
            .iter()
            .position(|t| t.slug == slug)
            .ok_or_else(|| QueueError::UnknownSlug(slug.to_string()))?;
        let from = self.topics[position].status;
        if !from.can_transition_to(status) {
            return Err(QueueError::IllegalTransition {
                slug: slug.to_string(),
                from,
                to: status,
            });
        }

        let now = self.stamp(now);
        let topic = &mut self.topics[position];
        topic.status = status;
        topic.last_update = now.max(topic.last_update);
        if extras.session_url.is_some() {
            topic.session_url = extras.session_url;
        }
        if extras.last_error.is_some() {
            topic.last_error = extras.last_error;
        } else if status == TopicStatus::Pending {
            topic.last_error = None;
        }
        Ok(&self.topics[position])
    }

    fn stamp(&mut self, now: DateTime<Utc>) -> DateTime<Utc> {
        self.last_updated = now.max(self.last_updated);
        self.last_updated
    }
}

/// File-backed queue.
#[derive(Debug, Clone)]
pub struct TopicQueue {
    path: PathBuf,
}

impl TopicQueue {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current document. A missing file is an empty queue.
    pub fn load(&self) -> QueueResult<QueueDocument> {
        match std::fs::read_to_string(&self.path) {
            Ok(text) => Ok(serde_json::from_str(&text)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(QueueDocument::default()),
            Err(e) => Err(e.into()),
        }
    }

    pub fn save(&self, document: &QueueDocument) -> QueueResult<()> {
        let mut json = serde_json::to_string_pretty(document)?;
        json.push('\n');
        research::artifacts::write_atomic(&self.path, json.as_bytes())?;
        Ok(())
    }

    /// Load, apply `change`, persist, all under the queue lock. Nothing is
    /// written when `change` fails.
    pub fn update<T>(&self, change: impl FnOnce(&mut QueueDocument) -> QueueResult<T>) -> QueueResult<T> {
        let _lock = LockFile::acquire(lock_path_for(&self.path))?;
        let mut document = self.load()?;
        let value = change(&mut document)?;
        self.save(&document)?;
        Ok(value)
    }

    pub fn get(&self, slug: &str) -> QueueResult<Option<Topic>> {
        Ok(self.load()?.get(slug).cloned())
    }

    pub fn list(&self, filter: &TopicFilter) -> QueueResult<Vec<Topic>> {
        Ok(self.load()?.list(filter).into_iter().cloned().collect())
    }

    pub fn next_pending(&self) -> QueueResult<Option<Topic>> {
        Ok(self.load()?.next_pending().cloned())
    }

    pub fn add(&self, new: NewTopic) -> QueueResult<Topic> {
        let now = Utc::now();
        let topic = self.update(|doc| doc.add(new, now.date_naive(), now).cloned())?;
        info!(slug = %topic.slug, name = %topic.name, priority = %topic.priority, "Topic queued");
        Ok(topic)
    }

    pub fn set_status(&self, slug: &str, status: TopicStatus, extras: StatusExtras) -> QueueResult<Topic> {
        let topic = self.update(|doc| doc.set_status(slug, status, extras, Utc::now()).cloned())?;
        info!(slug = %slug, status = %status, "Topic status changed");
        Ok(topic)
    }

    /// Put a failed or needs-review topic back in line.
    pub fn reset(&self, slug: &str) -> QueueResult<Topic> {
        let topic = self.update(|doc| {
            let now = Utc::now();
            if doc.get(slug).map(|t| t.status) == Some(TopicStatus::NeedsReview) {
                doc.set_status(slug, TopicStatus::Failed, StatusExtras::default(), now)?;
            }
            doc.set_status(slug, TopicStatus::Pending, StatusExtras::default(), now)
                .cloned()
        })?;
        info!(slug = %slug, "Topic reset to pending");
        Ok(topic)
    }
}
