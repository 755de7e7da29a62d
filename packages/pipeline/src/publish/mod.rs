//! Publishing: page file, site index, optional commit and mirror.

pub mod git;
pub mod index;
pub mod mirror;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use report::Report;
use tracing::{debug, info};

use crate::error::Result;
pub use git::{branch_name, commit_message, CommitRecord, GitCli, RecordingVcs, VersionControl};
pub use index::{IndexEntry, SiteIndex};
pub use mirror::{
    BlobEntry, BlobStore, HttpBlobStore, KvStore, MemoryBlobStore, MemoryKvStore, Mirror,
    RestKvStore,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishOutcome {
    pub html_path: PathBuf,
    /// False when an existing page was kept as is
    pub page_written: bool,
    /// Set when commits are enabled
    pub branch: Option<String>,
    /// Set when the page was mirrored
    pub mirror_url: Option<String>,
}

pub struct Publisher {
    reports_dir: PathBuf,
    index_path: PathBuf,
    vcs: Option<Arc<dyn VersionControl>>,
    mirror: Option<Mirror>,
}

impl Publisher {
    pub fn new(reports_dir: impl Into<PathBuf>, index_path: impl Into<PathBuf>) -> Self {
        Self {
            reports_dir: reports_dir.into(),
            index_path: index_path.into(),
            vcs: None,
            mirror: None,
        }
    }

    pub fn with_vcs(mut self, vcs: Arc<dyn VersionControl>) -> Self {
        self.vcs = Some(vcs);
        self
    }

    pub fn with_mirror(mut self, mirror: Mirror) -> Self {
        self.mirror = Some(mirror);
        self
    }

    pub fn index_path(&self) -> &Path {
        &self.index_path
    }

    pub fn html_path(&self, slug: &str) -> PathBuf {
        self.reports_dir.join(format!("{}.html", slug))
    }

    pub fn is_published(&self, slug: &str) -> bool {
        self.html_path(slug).exists()
    }

    /// Write the page, list it, then commit and mirror it.
    ///
    /// Every step can be repeated, so a publish cut short by a failure is
    /// finished by calling this again. Without `force` an existing page is
    /// kept and only the steps it still lacks take effect. The index never
    /// gains a second entry for a slug.
    pub async fn publish(
        &self,
        report: &Report,
        html: &str,
        topic_name: &str,
        force: bool,
    ) -> Result<PublishOutcome> {
        let html_path = self.html_path(&report.slug);
        let page_written = force || !html_path.exists();
        let html = if page_written {
            research::artifacts::write_atomic(&html_path, html.as_bytes())?;
            html.to_string()
        } else {
            info!(slug = %report.slug, path = %html_path.display(), "Page exists, finishing publish");
            std::fs::read_to_string(&html_path)?
        };

        let entry = IndexEntry::from_report(report);
        let mut site_index = SiteIndex::load(&self.index_path)?;
        if site_index.prepend(entry.clone()) {
            site_index.save(&self.index_path)?;
        } else {
            debug!(slug = %report.slug, "Slug already listed in site index");
        }

        let branch = match &self.vcs {
            Some(vcs) => Some(vcs.commit_report(
                &report.slug,
                topic_name,
                &[html_path.clone(), self.index_path.clone()],
            )?),
            None => None,
        };

        let mirror_url = match &self.mirror {
            Some(mirror) => Some(mirror.publish(&entry, &html).await?),
            None => None,
        };

        info!(
            slug = %report.slug,
            path = %html_path.display(),
            page_written,
            branch = ?branch,
            mirrored = mirror_url.is_some(),
            "Report published"
        );
        Ok(PublishOutcome {
            html_path,
            page_written,
            branch,
            mirror_url,
        })
    }
}
