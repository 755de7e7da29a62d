//! Site report index: newest first, one entry per slug.

use std::path::Path;

use chrono::NaiveDate;
use report::Report;
use serde::{Deserialize, Serialize};

pub const EXCERPT_CHARS: usize = 220;

/// Display metadata for one published report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexEntry {
    /// Position in the listing; 0 is the newest.
    pub index: usize,
    pub slug: String,
    pub title: String,
    pub category: String,
    pub tag: String,
    pub tag_class: String,
    pub publish_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verdict: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verdict_class: Option<String>,
    pub read_time_minutes: usize,
    pub excerpt: String,
}

impl IndexEntry {
    pub fn from_report(report: &Report) -> Self {
        Self {
            index: 0,
            slug: report.slug.clone(),
            title: report.title.clone(),
            category: report.category.clone(),
            tag: report.tag_label.clone(),
            tag_class: report.tag_color.css_class(),
            publish_date: report.publish_date,
            verdict: report.verdict.map(|v| v.label().to_string()),
            verdict_class: report.verdict.map(|v| v.css_class().to_string()),
            read_time_minutes: report::read_time_minutes(report),
            excerpt: report::excerpt(report, EXCERPT_CHARS),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SiteIndex {
    entries: Vec<IndexEntry>,
}

impl SiteIndex {
    /// Missing file is an empty index.
    pub fn load(path: &Path) -> std::io::Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(text) => Ok(serde_json::from_str(&text)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e),
        }
    }

    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        let mut json = serde_json::to_string_pretty(self)?;
        json.push('\n');
        research::artifacts::write_atomic(path, json.as_bytes())
    }

    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    pub fn contains(&self, slug: &str) -> bool {
        self.entries.iter().any(|e| e.slug == slug)
    }

    /// Insert `entry` at index 0 and shift the rest down. Returns `false`,
    /// leaving the index untouched, when the slug is already listed.
    pub fn prepend(&mut self, mut entry: IndexEntry) -> bool {
        if self.contains(&entry.slug) {
            return false;
        }
        for existing in &mut self.entries {
            existing.index += 1;
        }
        entry.index = 0;
        self.entries.insert(0, entry);
        true
    }
}
