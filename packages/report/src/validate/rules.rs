//! Offline validation rules. Everything here is pure; link probing lives in
//! `links`.

use std::collections::{HashMap, HashSet};

use super::policy::{
    forbidden_colors_in, is_banned_host, is_reputable, REPUTABLE_TRUST_THRESHOLD,
};
use super::{Category, Finding};
use crate::schema::{url_host, MAX_TRUST_SCORE, MIN_KEY_POINTS, MIN_SOURCES};
use crate::types::report::Report;

pub const MIN_SECTIONS: usize = 2;
pub const MAX_TITLE_CHARS: usize = 100;
pub const MIN_BOTTOM_LINE_CHARS: usize = 100;

/// Run every offline rule against a report and, optionally, its HTML.
pub fn check(report: &Report, html: Option<&str>) -> Vec<Finding> {
    let mut findings = Vec::new();
    structure(report, &mut findings);
    sources(report, &mut findings);
    claims(report, &mut findings);
    verdict(report, &mut findings);
    content(report, &mut findings);
    style(report, html, &mut findings);
    findings
}

fn structure(report: &Report, findings: &mut Vec<Finding>) {
    if report.sources.len() < MIN_SOURCES {
        findings.push(Finding::error(
            Category::Structure,
            format!(
                "report has {} sources; at least {} are required",
                report.sources.len(),
                MIN_SOURCES
            ),
        ));
    }
    if report.sections.len() < MIN_SECTIONS {
        findings.push(Finding::error(
            Category::Structure,
            format!(
                "report has {} sections; at least {} are required",
                report.sections.len(),
                MIN_SECTIONS
            ),
        ));
    }
    let key_points = report.executive_summary.key_points.len();
    if key_points < MIN_KEY_POINTS {
        findings.push(Finding::error(
            Category::Structure,
            format!(
                "executive summary has {} key points; at least {} are required",
                key_points, MIN_KEY_POINTS
            ),
        ));
    }
}

fn sources(report: &Report, findings: &mut Vec<Finding>) {
    let mut urls_seen: HashMap<&str, usize> = HashMap::new();

    for (i, source) in report.sources.iter().enumerate() {
        let label = format!("source {} ({})", i + 1, source.name);

        match url_host(&source.url) {
            Some(host) => {
                if is_banned_host(&host) {
                    findings.push(Finding::error(
                        Category::Sources,
                        format!("{} links to Wikipedia: {}", label, source.url),
                    ));
                }
                if !host.eq_ignore_ascii_case(&source.domain) {
                    findings.push(Finding::error(
                        Category::Sources,
                        format!(
                            "{} declares domain '{}' but its url host is '{}'",
                            label, source.domain, host
                        ),
                    ));
                }
            }
            None => findings.push(Finding::error(
                Category::Sources,
                format!("{} has no absolute http(s) url: '{}'", label, source.url),
            )),
        }

        if source.trust_score > MAX_TRUST_SCORE {
            findings.push(Finding::error(
                Category::Trust,
                format!(
                    "{} has trust score {} outside [0, 100]",
                    label, source.trust_score
                ),
            ));
        } else if source.trust_score >= REPUTABLE_TRUST_THRESHOLD && !is_reputable(&source.domain)
        {
            findings.push(Finding::warning(
                Category::Trust,
                format!(
                    "{} scores {} but '{}' is not on the reputable-tier allowlist",
                    label, source.trust_score, source.domain
                ),
            ));
        }

        if let Some(first) = urls_seen.insert(source.url.as_str(), i) {
            findings.push(Finding::warning(
                Category::Sources,
                format!("{} repeats the url of source {}", label, first + 1),
            ));
        }
    }
}

fn claims(report: &Report, findings: &mut Vec<Finding>) {
    let known: HashSet<String> = report.source_ids().into_iter().collect();
    let mut claim_ids = HashSet::new();

    for claim in &report.claims {
        if !claim_ids.insert(claim.id.as_str()) {
            findings.push(Finding::error(
                Category::Claims,
                format!("duplicate claim id '{}'", claim.id),
            ));
        }
        if claim.source_ids.is_empty() {
            findings.push(Finding::error(
                Category::Claims,
                format!("claim '{}' cites no sources", claim.id),
            ));
        }
        for id in claim.source_ids.iter().filter(|id| !known.contains(*id)) {
            findings.push(Finding::error(
                Category::Claims,
                format!("claim '{}' cites unknown source '{}'", claim.id, id),
            ));
        }
    }
}

fn verdict(report: &Report, findings: &mut Vec<Finding>) {
    if let Some(confidence) = report.confidence {
        if !(0.0..=1.0).contains(&confidence) {
            findings.push(Finding::error(
                Category::Verdict,
                format!("confidence {} is outside [0, 1]", confidence),
            ));
        }
    }

    let Some(verdict) = report.verdict else {
        return;
    };
    if report.verdict_summary.is_none() {
        findings.push(Finding::error(
            Category::Verdict,
            format!("verdict {} has no verdict_summary", verdict),
        ));
    }
    if report.confidence.is_none() {
        findings.push(Finding::warning(
            Category::Verdict,
            format!("verdict {} has no confidence", verdict),
        ));
    }
    if report.claims.is_empty() {
        findings.push(Finding::warning(
            Category::Verdict,
            format!("verdict {} is not backed by any claims", verdict),
        ));
    }
}

fn content(report: &Report, findings: &mut Vec<Finding>) {
    let title_chars = report.title.chars().count();
    if title_chars > MAX_TITLE_CHARS {
        findings.push(Finding::warning(
            Category::Content,
            format!(
                "title is {} characters; keep it to {} or fewer",
                title_chars, MAX_TITLE_CHARS
            ),
        ));
    }
    let bottom_line_chars = report.bottom_line.chars().count();
    if bottom_line_chars < MIN_BOTTOM_LINE_CHARS {
        findings.push(Finding::warning(
            Category::Content,
            format!(
                "bottom line is {} characters; aim for at least {}",
                bottom_line_chars, MIN_BOTTOM_LINE_CHARS
            ),
        ));
    }
}

fn style(report: &Report, html: Option<&str>, findings: &mut Vec<Finding>) {
    match serde_json::to_string(report) {
        Ok(serialised) => {
            for color in forbidden_colors_in(&serialised) {
                findings.push(Finding::error(
                    Category::Style,
                    format!("report record contains forbidden colour '{}'", color),
                ));
            }
        }
        Err(e) => findings.push(Finding::error(
            Category::Style,
            format!("report record could not be serialised for the colour scan: {}", e),
        )),
    }

    if let Some(html) = html {
        for color in forbidden_colors_in(html) {
            findings.push(Finding::error(
                Category::Style,
                format!("rendered HTML contains forbidden colour '{}'", color),
            ));
        }
    }
}
