//! Validator scenarios, boundaries, and invariants over rendered reports.

use std::sync::Arc;

use proptest::prelude::*;
use proptest::test_runner::Config;
use report::testing::{sample_report, source};
use report::validate::policy::{forbidden_colors_in, is_reputable};
use report::{
    render, validate_offline, Category, LinkStatus, Report, Severity, StaticLinkProbe, Validator,
};

fn validator() -> Validator {
    Validator::new(Arc::new(StaticLinkProbe::new()))
}

fn error_categories(report: &Report) -> Vec<Category> {
    validate_offline(report, None)
        .errors()
        .map(|f| f.category)
        .collect()
}

/// Keep the first `n` sources and drop claim citations that no longer resolve.
fn with_sources(mut report: Report, n: usize) -> Report {
    report.sources.truncate(n);
    let known = report.source_ids();
    for claim in &mut report.claims {
        claim.source_ids.retain(|id| known.contains(id));
        if claim.source_ids.is_empty() {
            claim.source_ids.push(known[0].clone());
        }
    }
    report
}

#[tokio::test]
async fn happy_path_is_clean() {
    let report = sample_report();
    let html = render(&report);
    let outcome = validator().validate(&report, Some(&html)).await;
    assert!(outcome.is_publishable(), "{:?}", outcome.findings);
    assert_eq!(outcome.warning_count(), 0, "{:?}", outcome.findings);
    assert!(outcome.links_checked);
}

#[tokio::test]
async fn wikipedia_source_blocks_publish() {
    let mut report = sample_report();
    report.sources[1] = source("Wikipedia", "https://en.wikipedia.org/wiki/X", 70);
    let html = render(&report);
    let outcome = validator().validate(&report, Some(&html)).await;
    assert!(!outcome.is_publishable());
    let errors: Vec<_> = outcome.errors().collect();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].category, Category::Sources);
}

#[tokio::test]
async fn forbidden_colour_in_content_blocks_publish() {
    let mut report = sample_report();
    report.sections[0].content = "The chart uses #8b5cf6 for emphasis.".to_string();
    let html = render(&report);
    let outcome = validator().validate(&report, Some(&html)).await;
    assert!(!outcome.is_publishable());
    assert!(outcome.errors().all(|f| f.category == Category::Style));
}

#[tokio::test]
async fn inflated_trust_warns_but_publishes() {
    let mut report = sample_report();
    report.sources[0] = source("Random blog", "https://randomblog.example/post", 96);
    let html = render(&report);
    let outcome = validator().validate(&report, Some(&html)).await;
    assert!(outcome.is_publishable());
    let warnings: Vec<_> = outcome.warnings().collect();
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].category, Category::Trust);
}

#[test]
fn dangling_citation_fails_schema_and_validation() {
    let mut report = sample_report();
    report.claims[0].source_ids = vec!["s_7".to_string()];
    assert_eq!(error_categories(&report), vec![Category::Claims]);

    let json = serde_json::to_string(&report).unwrap();
    assert!(Report::from_json(&json).is_err());
}

#[tokio::test]
async fn unreachable_and_slow_links_are_link_errors() {
    let report = sample_report();
    let probe = StaticLinkProbe::new()
        .with_status(report.sources[0].url.clone(), LinkStatus::TimedOut)
        .with_status(report.sources[4].url.clone(), LinkStatus::Status(500));
    let outcome = Validator::new(Arc::new(probe))
        .validate(&report, None)
        .await;
    let links: Vec<_> = outcome
        .errors()
        .filter(|f| f.category == Category::Links)
        .collect();
    assert_eq!(links.len(), 2);
    assert!(links[0].message.contains("timed out"));
    assert!(links[1].message.contains("HTTP 500"));
}

#[test]
fn three_sources_pass_two_fail() {
    let three = with_sources(sample_report(), 3);
    assert!(validate_offline(&three, None).is_publishable());

    let two = with_sources(sample_report(), 2);
    assert_eq!(error_categories(&two), vec![Category::Structure]);
}

#[test]
fn two_sections_pass_one_fails() {
    let mut report = sample_report();
    report.sections.truncate(2);
    assert!(validate_offline(&report, None).is_publishable());

    report.sections.truncate(1);
    assert_eq!(error_categories(&report), vec![Category::Structure]);
}

#[test]
fn one_key_point_fails() {
    let mut report = sample_report();
    report.executive_summary.key_points.truncate(1);
    assert_eq!(error_categories(&report), vec![Category::Structure]);
}

#[test]
fn title_boundary() {
    let mut report = sample_report();
    report.title = "t".repeat(100);
    assert_eq!(validate_offline(&report, None).warning_count(), 0);
    report.title = "t".repeat(101);
    let outcome = validate_offline(&report, None);
    assert_eq!(outcome.warning_count(), 1);
    assert_eq!(outcome.findings[0].category, Category::Content);
}

#[test]
fn bottom_line_boundary() {
    let mut report = sample_report();
    report.bottom_line = "b".repeat(100);
    assert_eq!(validate_offline(&report, None).warning_count(), 0);
    report.bottom_line = "b".repeat(99);
    assert_eq!(validate_offline(&report, None).warning_count(), 1);
}

#[test]
fn verdict_without_summary_is_an_error() {
    let mut report = sample_report();
    report.verdict_summary = None;
    assert_eq!(error_categories(&report), vec![Category::Verdict]);
}

#[test]
fn out_of_range_confidence_is_an_error() {
    let mut report = sample_report();
    report.confidence = Some(1.5);
    assert_eq!(error_categories(&report), vec![Category::Verdict]);
}

#[test]
fn domain_mismatch_is_a_sources_error() {
    let mut report = sample_report();
    report.sources[2].domain = "nasa.gov".to_string();
    assert_eq!(error_categories(&report), vec![Category::Sources]);
}

#[test]
fn rendered_page_is_free_of_forbidden_colours() {
    let html = render(&sample_report());
    assert!(forbidden_colors_in(&html).is_empty());
}

fn clean_source(i: usize, score: u8) -> report::Source {
    source(
        &format!("Outlet {i}"),
        &format!("https://outlet{i}.example/story"),
        score,
    )
}

fn arbitrary_report() -> impl Strategy<Value = Report> {
    (
        proptest::collection::vec(0u8..=100, 1..9),
        proptest::collection::vec(proptest::collection::vec(1usize..12, 0..4), 0..4),
        1usize..4,
        "[a-z #0-9]{0,40}",
    )
        .prop_map(|(scores, citations, sections, extra)| {
            let mut report = sample_report();
            report.sources = scores
                .iter()
                .enumerate()
                .map(|(i, s)| clean_source(i, *s))
                .collect();
            for (claim, ids) in report.claims.iter_mut().zip(citations) {
                claim.source_ids = ids.iter().map(|n| format!("s_{n}")).collect();
            }
            report.sections.truncate(sections);
            report.sections[0].content.push_str(&extra);
            report
        })
}

proptest! {
    #![proptest_config(Config::with_cases(128))]

    #[test]
    fn removing_a_source_never_removes_errors(
        report in arbitrary_report(),
        pick in any::<prop::sample::Index>(),
    ) {
        let before = validate_offline(&report, None).error_count();
        let mut smaller = report.clone();
        smaller.sources.remove(pick.index(report.sources.len()));
        let after = validate_offline(&smaller, None).error_count();
        prop_assert!(after >= before, "before {} after {}", before, after);
    }

    #[test]
    fn clean_reports_render_clean_pages(report in arbitrary_report()) {
        let html = render(&report);
        let outcome = validate_offline(&report, Some(&html));
        let record_only = validate_offline(&report, None);
        if record_only.is_publishable() {
            prop_assert!(outcome.is_publishable());
            prop_assert!(forbidden_colors_in(&html).is_empty());
        }
    }

    #[test]
    fn high_trust_without_warnings_means_reputable(
        report in arbitrary_report(),
        reputable in any::<bool>(),
    ) {
        let mut report = report;
        if reputable {
            report.sources[0] = source("Reuters", "https://www.reuters.com/world/x", 97);
        } else {
            report.sources[0] = source("Blog", "https://blog.example/x", 97);
        }
        let outcome = validate_offline(&report, None);
        let trust_warnings = outcome
            .warnings()
            .filter(|f| f.category == Category::Trust)
            .count();
        for s in report.sources.iter().filter(|s| s.trust_score >= 95) {
            if trust_warnings == 0 {
                prop_assert!(is_reputable(&s.domain));
            }
        }
        prop_assert_eq!(trust_warnings > 0, !reputable || report.sources.iter().skip(1).any(|s| s.trust_score >= 95));
    }

    #[test]
    fn schema_valid_records_round_trip(report in arbitrary_report(), quarter in 0u8..=4) {
        let mut report = report;
        report.confidence = Some(f64::from(quarter) / 4.0);
        if report::schema::check(&report).is_empty() {
            let json = report.to_json_pretty().unwrap();
            prop_assert_eq!(Report::from_json(&json).unwrap(), report);
        }
    }
}

#[test]
fn finding_severity_serialises_lowercase() {
    let outcome = validate_offline(&with_sources(sample_report(), 2), None);
    let json = serde_json::to_value(&outcome.findings[0]).unwrap();
    assert_eq!(json["severity"], serde_json::json!(Severity::Error));
    assert_eq!(json["severity"], "error");
    assert_eq!(json["category"], "structure");
}
