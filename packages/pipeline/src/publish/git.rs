//! Version control for published reports.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};

use tracing::info;

use crate::error::{PipelineError, Result};

pub fn branch_name(slug: &str) -> String {
    format!("report/{}", slug)
}

pub fn commit_message(topic_name: &str) -> String {
    format!("Add fact-check report: {}", topic_name)
}

pub trait VersionControl: Send + Sync {
    /// Commit `paths` on the report's branch. Returns the branch name.
    fn commit_report(&self, slug: &str, topic_name: &str, paths: &[PathBuf]) -> Result<String>;
}

/// Shells out to `git` in `repo_root`.
#[derive(Debug, Clone)]
pub struct GitCli {
    repo_root: PathBuf,
}

impl GitCli {
    pub fn new(repo_root: impl Into<PathBuf>) -> Self {
        Self {
            repo_root: repo_root.into(),
        }
    }

    pub fn repo_root(&self) -> &Path {
        &self.repo_root
    }

    fn git(&self, args: &[&str]) -> Result<String> {
        let output = Command::new("git")
            .args(args)
            .current_dir(&self.repo_root)
            .output()
            .map_err(|e| PipelineError::Publish(format!("cannot run git: {}", e)))?;

        if !output.status.success() {
            return Err(PipelineError::Publish(format!(
                "git {} failed: {}",
                args.first().copied().unwrap_or_default(),
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

impl VersionControl for GitCli {
    fn commit_report(&self, slug: &str, topic_name: &str, paths: &[PathBuf]) -> Result<String> {
        let branch = branch_name(slug);
        self.git(&["checkout", "-B", &branch])?;

        let mut add = vec!["add".to_string(), "--".to_string()];
        add.extend(paths.iter().map(|p| p.display().to_string()));
        let add: Vec<&str> = add.iter().map(String::as_str).collect();
        self.git(&add)?;

        let mut status = vec!["status".to_string(), "--porcelain".to_string(), "--".to_string()];
        status.extend(paths.iter().map(|p| p.display().to_string()));
        let status: Vec<&str> = status.iter().map(String::as_str).collect();
        if self.git(&status)?.is_empty() {
            info!(slug = %slug, branch = %branch, "Report already committed");
            return Ok(branch);
        }

        self.git(&["commit", "-m", &commit_message(topic_name)])?;
        info!(slug = %slug, branch = %branch, files = paths.len(), "Report committed");
        Ok(branch)
    }
}

/// One recorded call to [`RecordingVcs::commit_report`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitRecord {
    pub branch: String,
    pub message: String,
    pub paths: Vec<PathBuf>,
}

/// Records commits instead of making them.
///
/// Like git, a commit whose files are unchanged since the last recorded
/// commit is skipped.
#[derive(Clone, Default)]
pub struct RecordingVcs {
    commits: Arc<RwLock<Vec<CommitRecord>>>,
    committed: Arc<RwLock<HashMap<PathBuf, Vec<u8>>>>,
    failures: Arc<AtomicUsize>,
}

impl RecordingVcs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject the next `times` commits.
    pub fn failing(self, times: usize) -> Self {
        self.failures.store(times, Ordering::SeqCst);
        self
    }

    pub fn commits(&self) -> Vec<CommitRecord> {
        self.commits.read().map(|c| c.clone()).unwrap_or_default()
    }
}

impl VersionControl for RecordingVcs {
    fn commit_report(&self, slug: &str, topic_name: &str, paths: &[PathBuf]) -> Result<String> {
        let branch = branch_name(slug);
        let rejected = self
            .failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if rejected {
            return Err(PipelineError::Publish(format!("commit on {} rejected", branch)));
        }

        let snapshot: Vec<(PathBuf, Vec<u8>)> = paths
            .iter()
            .map(|p| (p.clone(), std::fs::read(p).unwrap_or_default()))
            .collect();
        if let Ok(mut committed) = self.committed.write() {
            if snapshot.iter().all(|(p, bytes)| committed.get(p) == Some(bytes)) {
                return Ok(branch);
            }
            committed.extend(snapshot);
        }
        if let Ok(mut commits) = self.commits.write() {
            commits.push(CommitRecord {
                branch: branch.clone(),
                message: commit_message(topic_name),
                paths: paths.to_vec(),
            });
        }
        Ok(branch)
    }
}
