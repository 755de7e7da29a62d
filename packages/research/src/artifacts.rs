//! Per-slug research artifacts and the job record.
//!
//! For slug `s` the store holds `s.raw` (research text), `s-sources.json`
//! (external links), `s-job.json` (job record) and `s.json` (report record).
//! Writes go through a temp file in the same directory and a rename.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use report::Report;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::warn;

use crate::session::{Link, Provider};

/// Raw research shorter than this is not trusted for extraction.
pub const MIN_COMPLETE_CHARS: usize = 2000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Researching,
    Completed,
    NeedsReview,
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Researching => "researching",
            JobStatus::Completed => "completed",
            JobStatus::NeedsReview => "needs_review",
            JobStatus::Failed => "failed",
        }
    }

    /// Classification of harvested research text.
    pub fn for_raw_chars(raw_chars: usize) -> Self {
        if raw_chars >= MIN_COMPLETE_CHARS {
            JobStatus::Completed
        } else {
            JobStatus::NeedsReview
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptOutcome {
    Running,
    Completed,
    NeedsReview,
    TimedOut,
    Failed,
}

/// One provider run for a topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attempt {
    pub provider: Provider,
    pub provider_name: String,
    pub started_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
    pub outcome: AttemptOutcome,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Research job metadata, `<slug>-job.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRecord {
    pub slug: String,
    pub topic: String,
    pub template_id: String,
    /// Provider of the latest attempt.
    pub provider: Provider,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_url: Option<String>,
    pub started_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub harvested_at: Option<DateTime<Utc>>,
    pub status: JobStatus,
    #[serde(default)]
    pub raw_chars: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verdict_hint: Option<String>,
    #[serde(default)]
    pub attempts: Vec<Attempt>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

impl JobRecord {
    pub fn new(
        slug: impl Into<String>,
        topic: impl Into<String>,
        template_id: impl Into<String>,
        provider: Provider,
    ) -> Self {
        Self {
            slug: slug.into(),
            topic: topic.into(),
            template_id: template_id.into(),
            provider,
            session_url: None,
            started_at: Utc::now(),
            harvested_at: None,
            status: JobStatus::Researching,
            raw_chars: 0,
            verdict_hint: None,
            attempts: Vec::new(),
            last_error: None,
        }
    }

    /// Open a new attempt and make its provider current.
    pub fn begin_attempt(&mut self, provider: Provider, provider_name: &str) {
        self.provider = provider;
        self.status = JobStatus::Researching;
        self.attempts.push(Attempt {
            provider,
            provider_name: provider_name.to_string(),
            started_at: Utc::now(),
            finished_at: None,
            outcome: AttemptOutcome::Running,
            error: None,
        });
    }

    /// Close the open attempt, if any, and mirror its result onto the record.
    pub fn finish_attempt(&mut self, outcome: AttemptOutcome, error: Option<String>) {
        if let Some(attempt) = self
            .attempts
            .iter_mut()
            .rev()
            .find(|a| a.outcome == AttemptOutcome::Running)
        {
            attempt.finished_at = Some(Utc::now());
            attempt.outcome = outcome;
            attempt.error = error.clone();
        }
        self.status = match outcome {
            AttemptOutcome::Running => JobStatus::Researching,
            AttemptOutcome::Completed => JobStatus::Completed,
            AttemptOutcome::NeedsReview | AttemptOutcome::TimedOut => JobStatus::NeedsReview,
            AttemptOutcome::Failed => JobStatus::Failed,
        };
        if error.is_some() {
            self.last_error = error;
        }
    }
}

/// Filesystem home of every per-slug artifact.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn raw_path(&self, slug: &str) -> PathBuf {
        self.dir.join(format!("{}.raw", slug))
    }

    pub fn sources_path(&self, slug: &str) -> PathBuf {
        self.dir.join(format!("{}-sources.json", slug))
    }

    pub fn job_path(&self, slug: &str) -> PathBuf {
        self.dir.join(format!("{}-job.json", slug))
    }

    pub fn report_path(&self, slug: &str) -> PathBuf {
        self.dir.join(format!("{}.json", slug))
    }

    pub fn write_raw(&self, slug: &str, text: &str) -> std::io::Result<()> {
        self.write_atomic(&self.raw_path(slug), text.as_bytes())
    }

    pub fn read_raw(&self, slug: &str) -> std::io::Result<Option<String>> {
        read_optional(&self.raw_path(slug))
    }

    pub fn write_sources(&self, slug: &str, links: &[Link]) -> std::io::Result<()> {
        self.write_json(&self.sources_path(slug), links)
    }

    pub fn read_sources(&self, slug: &str) -> std::io::Result<Vec<Link>> {
        Ok(self.read_json(&self.sources_path(slug))?.unwrap_or_default())
    }

    pub fn write_job(&self, job: &JobRecord) -> std::io::Result<()> {
        self.write_json(&self.job_path(&job.slug), job)
    }

    pub fn read_job(&self, slug: &str) -> std::io::Result<Option<JobRecord>> {
        self.read_json(&self.job_path(slug))
    }

    pub fn report_exists(&self, slug: &str) -> bool {
        self.report_path(slug).is_file()
    }

    pub fn write_report(&self, report: &Report) -> std::io::Result<()> {
        self.write_json(&self.report_path(&report.slug), report)
    }

    /// Load and schema-check a report record. `Ok(None)` when absent.
    pub fn read_report(&self, slug: &str) -> std::io::Result<Option<report::Result<Report>>> {
        Ok(read_optional(&self.report_path(slug))?.map(|json| Report::from_json(&json)))
    }

    /// Every readable job record, sorted by slug. Unreadable ones are logged
    /// and skipped.
    pub fn list_jobs(&self) -> std::io::Result<Vec<JobRecord>> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };
        let mut jobs = Vec::new();
        for entry in entries {
            let path = entry?.path();
            let is_job = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.ends_with("-job.json"));
            if !is_job {
                continue;
            }
            match self.read_json::<JobRecord>(&path) {
                Ok(Some(job)) => jobs.push(job),
                Ok(None) => {}
                Err(e) => warn!(path = %path.display(), error = %e, "Skipping unreadable job record"),
            }
        }
        jobs.sort_by(|a, b| a.slug.cmp(&b.slug));
        Ok(jobs)
    }

    fn write_json<T: Serialize + ?Sized>(&self, path: &Path, value: &T) -> std::io::Result<()> {
        let mut json = serde_json::to_string_pretty(value)?;
        json.push('\n');
        self.write_atomic(path, json.as_bytes())
    }

    fn read_json<T: DeserializeOwned>(&self, path: &Path) -> std::io::Result<Option<T>> {
        match read_optional(path)? {
            Some(text) => Ok(Some(serde_json::from_str(&text)?)),
            None => Ok(None),
        }
    }

    fn write_atomic(&self, path: &Path, bytes: &[u8]) -> std::io::Result<()> {
        write_atomic(path, bytes)
    }
}

/// Write via a sibling temp file and rename, creating parent directories.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent)?;
    let mut tmp = NamedTempFile::new_in(parent)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

fn read_optional(path: &Path) -> std::io::Result<Option<String>> {
    match fs::read_to_string(path) {
        Ok(text) => Ok(Some(text)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification_threshold() {
        assert_eq!(JobStatus::for_raw_chars(2000), JobStatus::Completed);
        assert_eq!(JobStatus::for_raw_chars(1999), JobStatus::NeedsReview);
    }

    #[test]
    fn attempts_track_outcomes() {
        let mut job = JobRecord::new("a-20260215", "A", "fact-check", Provider::Primary);
        job.begin_attempt(Provider::Primary, "openai-deep-research");
        job.finish_attempt(AttemptOutcome::TimedOut, Some("cap reached".into()));
        assert_eq!(job.status, JobStatus::NeedsReview);
        job.begin_attempt(Provider::Fallback, "perplexity-deep-research");
        job.finish_attempt(AttemptOutcome::Completed, None);
        assert_eq!(job.status, JobStatus::Completed);
        assert_eq!(job.provider, Provider::Fallback);
        assert_eq!(job.attempts.len(), 2);
        assert_eq!(job.attempts[0].outcome, AttemptOutcome::TimedOut);
        assert_eq!(job.last_error.as_deref(), Some("cap reached"));
    }

    #[test]
    fn store_round_trips_and_lists_jobs() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path().join("artifacts"));
        assert_eq!(store.read_job("missing").unwrap(), None);
        assert!(store.list_jobs().unwrap().is_empty());

        let job = JobRecord::new("b-20260215", "B", "fact-check", Provider::Fallback);
        store.write_job(&job).unwrap();
        store.write_job(&JobRecord::new("a-20260215", "A", "fact-check", Provider::Primary)).unwrap();
        store.write_raw("b-20260215", "text").unwrap();
        store
            .write_sources("b-20260215", &[Link::new("https://x.example", "X")])
            .unwrap();

        assert_eq!(store.read_job("b-20260215").unwrap(), Some(job));
        assert_eq!(store.read_raw("b-20260215").unwrap().as_deref(), Some("text"));
        assert_eq!(store.read_sources("b-20260215").unwrap().len(), 1);
        let slugs: Vec<String> = store.list_jobs().unwrap().into_iter().map(|j| j.slug).collect();
        assert_eq!(slugs, vec!["a-20260215", "b-20260215"]);
    }

    #[test]
    fn job_status_uses_snake_case() {
        let json = serde_json::to_string(&JobStatus::NeedsReview).unwrap();
        assert_eq!(json, "\"needs_review\"");
    }
}
