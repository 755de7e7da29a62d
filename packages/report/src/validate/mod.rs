//! Pre-publish gate.
//!
//! A report is publishable when no finding has error severity. Offline rules
//! run first; the optional link check then probes every source url.

pub mod links;
pub mod policy;
pub mod rules;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::types::report::Report;
pub use links::{check_links, HttpLinkProbe, LinkProbe, LinkStatus, StaticLinkProbe};

/// Aggregate deadline for all link probes of one report.
pub const LINK_CHECK_DEADLINE: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Structure,
    Sources,
    Claims,
    Style,
    Trust,
    Content,
    Verdict,
    Links,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Structure => "structure",
            Category::Sources => "sources",
            Category::Claims => "claims",
            Category::Style => "style",
            Category::Trust => "trust",
            Category::Content => "content",
            Category::Verdict => "verdict",
            Category::Links => "links",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    pub category: Category,
    pub severity: Severity,
    pub message: String,
}

impl Finding {
    pub fn error(category: Category, message: impl Into<String>) -> Self {
        Self {
            category,
            severity: Severity::Error,
            message: message.into(),
        }
    }

    pub fn warning(category: Category, message: impl Into<String>) -> Self {
        Self {
            category,
            severity: Severity::Warning,
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let severity = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        write!(f, "[{}/{}] {}", severity, self.category.as_str(), self.message)
    }
}

/// Everything the validator found about one report.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub findings: Vec<Finding>,
    /// Whether link probing ran.
    pub links_checked: bool,
}

impl ValidationReport {
    pub fn is_publishable(&self) -> bool {
        !self.findings.iter().any(Finding::is_error)
    }

    pub fn errors(&self) -> impl Iterator<Item = &Finding> {
        self.findings.iter().filter(|f| f.is_error())
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Finding> {
        self.findings.iter().filter(|f| !f.is_error())
    }

    pub fn error_count(&self) -> usize {
        self.errors().count()
    }

    pub fn warning_count(&self) -> usize {
        self.warnings().count()
    }

    /// One line per error, for notifications and job records.
    pub fn error_summary(&self) -> String {
        self.errors()
            .map(|f| f.to_string())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Offline rules only. Equivalent to a [`Validator`] with link checks off.
pub fn validate_offline(report: &Report, html: Option<&str>) -> ValidationReport {
    ValidationReport {
        findings: rules::check(report, html),
        links_checked: false,
    }
}

/// Validator with pluggable link probing.
///
/// # Example
///
/// ```rust,ignore
/// let validator = Validator::new(Arc::new(HttpLinkProbe::default()));
/// let outcome = validator.validate(&report, Some(&html)).await;
/// if !outcome.is_publishable() { /* abort publish */ }
/// ```
#[derive(Clone)]
pub struct Validator {
    probe: Arc<dyn LinkProbe>,
    link_check: bool,
    max_parallel: Option<usize>,
    deadline: Duration,
}

impl Validator {
    pub fn new(probe: Arc<dyn LinkProbe>) -> Self {
        Self {
            probe,
            link_check: true,
            max_parallel: None,
            deadline: LINK_CHECK_DEADLINE,
        }
    }

    /// Skip link probing (faster editorial iteration).
    pub fn without_link_check(mut self) -> Self {
        self.link_check = false;
        self
    }

    pub fn with_link_check(mut self, enabled: bool) -> Self {
        self.link_check = enabled;
        self
    }

    /// Cap on concurrent probes. Defaults to the number of sources.
    pub fn with_max_parallel(mut self, max_parallel: usize) -> Self {
        self.max_parallel = Some(max_parallel.max(1));
        self
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    pub async fn validate(&self, report: &Report, html: Option<&str>) -> ValidationReport {
        let mut outcome = validate_offline(report, html);

        if self.link_check {
            let urls: Vec<String> = report.sources.iter().map(|s| s.url.clone()).collect();
            let max_parallel = self.max_parallel.unwrap_or(urls.len());
            let results = check_links(self.probe.as_ref(), &urls, max_parallel, self.deadline).await;
            for (i, (url, status)) in results.into_iter().enumerate() {
                if !status.is_accessible() {
                    warn!(slug = %report.slug, url = %url, status = %status.describe(), "Source link unreachable");
                    outcome.findings.push(Finding::error(
                        Category::Links,
                        format!("source {} is not accessible ({}): {}", i + 1, status.describe(), url),
                    ));
                }
            }
            outcome.links_checked = true;
        }

        info!(
            slug = %report.slug,
            errors = outcome.error_count(),
            warnings = outcome.warning_count(),
            links_checked = outcome.links_checked,
            "Validation finished"
        );
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::sample_report;

    #[tokio::test]
    async fn unreachable_link_blocks_publish() {
        let report = sample_report();
        let probe = StaticLinkProbe::new().with_status(
            report.sources[2].url.clone(),
            LinkStatus::Status(404),
        );
        let outcome = Validator::new(Arc::new(probe)).validate(&report, None).await;
        assert!(!outcome.is_publishable());
        assert_eq!(outcome.error_count(), 1);
        let finding = outcome.errors().next().unwrap();
        assert_eq!(finding.category, Category::Links);
        assert!(finding.message.contains("source 3"));
    }

    #[tokio::test]
    async fn link_check_is_opt_out() {
        let report = sample_report();
        let probe = StaticLinkProbe::new().with_default(LinkStatus::Failed("dns".into()));
        let outcome = Validator::new(Arc::new(probe.clone()))
            .without_link_check()
            .validate(&report, None)
            .await;
        assert!(outcome.is_publishable());
        assert!(!outcome.links_checked);
        assert!(probe.calls().is_empty());
    }

    #[test]
    fn finding_display_names_severity_and_category() {
        let finding = Finding::warning(Category::Trust, "too trusting");
        assert_eq!(finding.to_string(), "[warning/trust] too trusting");
    }
}
