//! Schema invariants for report records.
//!
//! `serde` enforces the shape (required keys, enum values, no unknown fields);
//! this module enforces the invariants a type cannot express.

use std::collections::HashSet;

use url::Url;

use crate::error::{ReportError, Result, SchemaViolation};
use crate::types::report::Report;

pub const MIN_SOURCES: usize = 3;
pub const MIN_SECTIONS: usize = 1;
pub const MIN_KEY_POINTS: usize = 2;
pub const MAX_TRUST_SCORE: u8 = 100;

/// Check a report against every schema invariant, collecting all violations.
pub fn check(report: &Report) -> Vec<SchemaViolation> {
    let mut violations = Vec::new();

    if !is_kebab_slug(&report.slug) {
        violations.push(SchemaViolation::new(
            "slug",
            format!("'{}' is not lower-kebab-case", report.slug),
        ));
    }

    if report.sources.len() < MIN_SOURCES {
        violations.push(SchemaViolation::new(
            "sources",
            format!(
                "at least {} sources required, found {}",
                MIN_SOURCES,
                report.sources.len()
            ),
        ));
    }
    if report.sections.len() < MIN_SECTIONS {
        violations.push(SchemaViolation::new(
            "sections",
            format!("at least {} section required", MIN_SECTIONS),
        ));
    }
    if report.executive_summary.key_points.len() < MIN_KEY_POINTS {
        violations.push(SchemaViolation::new(
            "executive_summary.key_points",
            format!("at least {} key points required", MIN_KEY_POINTS),
        ));
    }

    if report.verdict.is_some() && report.verdict_summary.is_none() {
        violations.push(SchemaViolation::new(
            "verdict_summary",
            "required when verdict is set",
        ));
    }
    if let Some(confidence) = report.confidence {
        if !(0.0..=1.0).contains(&confidence) {
            violations.push(SchemaViolation::new(
                "confidence",
                format!("{} is outside [0, 1]", confidence),
            ));
        }
    }

    check_sources(report, &mut violations);
    check_claims(report, &mut violations);
    check_sections(report, &mut violations);

    violations
}

/// Fail with [`ReportError::Schema`] if any invariant is violated.
pub fn ensure_valid(report: &Report) -> Result<()> {
    let violations = check(report);
    if violations.is_empty() {
        Ok(())
    } else {
        Err(ReportError::Schema(violations))
    }
}

fn check_sources(report: &Report, violations: &mut Vec<SchemaViolation>) {
    let mut seen_ids = HashSet::new();

    for (i, source) in report.sources.iter().enumerate() {
        let path = format!("sources[{}]", i);

        if source.trust_score > MAX_TRUST_SCORE {
            violations.push(SchemaViolation::new(
                format!("{}.trust_score", path),
                format!("{} is outside [0, 100]", source.trust_score),
            ));
        }

        match url_host(&source.url) {
            Some(host) => {
                if !host.eq_ignore_ascii_case(&source.domain) {
                    violations.push(SchemaViolation::new(
                        format!("{}.domain", path),
                        format!("'{}' does not match url host '{}'", source.domain, host),
                    ));
                }
            }
            None => violations.push(SchemaViolation::new(
                format!("{}.url", path),
                format!("'{}' is not an absolute http(s) url", source.url),
            )),
        }

        if !seen_ids.insert(source.effective_id(i)) {
            violations.push(SchemaViolation::new(
                format!("{}.id", path),
                format!("duplicate source id '{}'", source.effective_id(i)),
            ));
        }
    }
}

fn check_claims(report: &Report, violations: &mut Vec<SchemaViolation>) {
    let known: HashSet<String> = report.source_ids().into_iter().collect();
    let mut claim_ids = HashSet::new();

    for (i, claim) in report.claims.iter().enumerate() {
        let path = format!("claims[{}]", i);

        if !claim_ids.insert(claim.id.as_str()) {
            violations.push(SchemaViolation::new(
                format!("{}.id", path),
                format!("duplicate claim id '{}'", claim.id),
            ));
        }
        if claim.source_ids.is_empty() {
            violations.push(SchemaViolation::new(
                format!("{}.source_ids", path),
                "must cite at least one source",
            ));
        }
        for id in &claim.source_ids {
            if !known.contains(id) {
                violations.push(SchemaViolation::new(
                    format!("{}.source_ids", path),
                    format!("'{}' does not resolve to a source", id),
                ));
            }
        }
    }
}

fn check_sections(report: &Report, violations: &mut Vec<SchemaViolation>) {
    for (i, section) in report.sections.iter().enumerate() {
        let Some(chart) = &section.chart else {
            continue;
        };
        let path = format!("sections[{}].chart", i);

        if chart.labels.is_empty() {
            violations.push(SchemaViolation::new(
                format!("{}.labels", path),
                "must not be empty",
            ));
        }
        if chart.datasets.is_empty() {
            violations.push(SchemaViolation::new(
                format!("{}.datasets", path),
                "must not be empty",
            ));
        }
        for (j, dataset) in chart.datasets.iter().enumerate() {
            if dataset.data.len() != chart.labels.len() {
                violations.push(SchemaViolation::new(
                    format!("{}.datasets[{}].data", path, j),
                    format!(
                        "has {} values for {} labels",
                        dataset.data.len(),
                        chart.labels.len()
                    ),
                ));
            }
        }
    }
}

/// Hostname of an absolute http(s) url.
pub fn url_host(raw: &str) -> Option<String> {
    let url = Url::parse(raw).ok()?;
    if !matches!(url.scheme(), "http" | "https") {
        return None;
    }
    url.host_str().map(|h| h.to_ascii_lowercase())
}

/// `true` for lower-kebab-case identifiers (`flat-earth-20260215`).
pub fn is_kebab_slug(slug: &str) -> bool {
    !slug.is_empty()
        && !slug.starts_with('-')
        && !slug.ends_with('-')
        && !slug.contains("--")
        && slug
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::sample_report;

    #[test]
    fn sample_report_is_valid() {
        assert_eq!(check(&sample_report()), vec![]);
    }

    #[test]
    fn detects_domain_host_mismatch() {
        let mut report = sample_report();
        report.sources[0].domain = "example.org".to_string();
        let violations = check(&report);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].path, "sources[0].domain");
    }

    #[test]
    fn detects_dangling_citation() {
        let mut report = sample_report();
        report.claims[0].source_ids = vec!["s_7".to_string()];
        let violations = check(&report);
        assert!(violations
            .iter()
            .any(|v| v.path == "claims[0].source_ids" && v.message.contains("s_7")));
    }

    #[test]
    fn detects_chart_length_mismatch() {
        let mut report = sample_report();
        let chart = report.sections[0].chart.as_mut().unwrap();
        chart.datasets[0].data.pop();
        let violations = check(&report);
        assert_eq!(violations.len(), 1);
        assert!(violations[0].path.ends_with("datasets[0].data"));
    }

    #[test]
    fn rejects_non_http_urls() {
        assert_eq!(url_host("ftp://example.com/file"), None);
        assert_eq!(url_host("not a url"), None);
        assert_eq!(
            url_host("https://WWW.Example.com/path").as_deref(),
            Some("www.example.com")
        );
    }

    #[test]
    fn kebab_slug_rules() {
        assert!(is_kebab_slug("flat-earth-20260215"));
        assert!(!is_kebab_slug("Flat-earth"));
        assert!(!is_kebab_slug("flat--earth"));
        assert!(!is_kebab_slug("-flat"));
        assert!(!is_kebab_slug(""));
    }

    #[test]
    fn verdict_requires_summary() {
        let mut report = sample_report();
        report.verdict_summary = None;
        let violations = check(&report);
        assert_eq!(violations[0].path, "verdict_summary");
    }
}
