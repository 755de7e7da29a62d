//! Report variants for the pipeline scenarios.

use chrono::NaiveDate;
use report::testing::{sample_report, source};
use report::Report;
use research::testing::{research_links, research_text, SessionScript};

pub use report::testing::SAMPLE_SLUG;

pub const TOPIC_NAME: &str = "Flat earth resurgence";
pub const CATEGORY: &str = "Science";

pub fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 2, 15).unwrap()
}

/// Research that completes after two polls with enough text and five
/// external sources.
pub fn good_research(home_domain: &str) -> SessionScript {
    SessionScript::completes_with(research_text(2500), 2).with_links(research_links(home_domain))
}

pub fn short_research() -> SessionScript {
    SessionScript::completes_with(research_text(500), 0)
}

/// One source replaced by a Wikipedia article.
pub fn wikipedia_report() -> Report {
    let mut report = sample_report();
    report.sources[1] = source("Wikipedia", "https://en.wikipedia.org/wiki/Flat_Earth", 70);
    report
}

pub fn forbidden_colour_report() -> Report {
    let mut report = sample_report();
    report.sections[0].content.push_str(" Highlighted in #8b5cf6.");
    report
}

/// A blog scored like a top-tier outlet.
pub fn inflated_trust_report() -> Report {
    let mut report = sample_report();
    report.sources[0] = source("Random Blog", "https://randomblog.example/flat-earth", 96);
    report
}

pub fn dangling_citation_report() -> Report {
    let mut report = sample_report();
    report.claims[0].source_ids = vec!["s_7".to_string()];
    report
}
