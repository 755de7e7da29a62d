//! Extraction driver against a mock model and a real artifact directory.

use std::sync::Arc;

use chrono::NaiveDate;
use report::testing::{sample_report, SAMPLE_SLUG};
use research::artifacts::AttemptOutcome;
use research::extract::TRUNCATION_MARKER;
use research::testing::{research_links, research_text, MockAI};
use research::{
    ArtifactStore, ExtractionDriver, ExtractionError, ExtractionRequest, JobRecord, Provider,
};
use tempfile::TempDir;

fn request() -> ExtractionRequest {
    ExtractionRequest {
        slug: SAMPLE_SLUG.to_string(),
        category: Some("Science".to_string()),
        publish_date: NaiveDate::from_ymd_opt(2026, 2, 15).unwrap(),
    }
}

/// Store with a finished research job for the sample slug.
fn researched_store(dir: &TempDir, raw_chars: usize, outcome: AttemptOutcome) -> ArtifactStore {
    let store = ArtifactStore::new(dir.path());
    let mut job = JobRecord::new(SAMPLE_SLUG, "Flat earth resurgence", "fact-check", Provider::Primary);
    job.begin_attempt(Provider::Primary, "mock-primary");
    job.raw_chars = raw_chars;
    job.finish_attempt(outcome, None);
    store.write_job(&job).unwrap();
    store.write_raw(SAMPLE_SLUG, &research_text(raw_chars)).unwrap();
    store
        .write_sources(SAMPLE_SLUG, &research_links("primary.example")[..5])
        .unwrap();
    store
}

#[tokio::test]
async fn extraction_writes_the_report_record() {
    let dir = TempDir::new().unwrap();
    let store = researched_store(&dir, 5000, AttemptOutcome::Completed);
    let ai = MockAI::new().with_report(&sample_report());
    let driver = ExtractionDriver::new(Arc::new(ai.clone()), store.clone());

    let report = driver.extract(&request()).await.unwrap();
    assert_eq!(report, sample_report());
    assert!(store.report_exists(SAMPLE_SLUG));
    assert_eq!(
        store.read_report(SAMPLE_SLUG).unwrap().unwrap().unwrap(),
        sample_report()
    );

    let prompts = ai.prompts();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains("Flat earth resurgence"));
    assert!(prompts[0].contains("\"category\": \"Science\""));
    assert!(prompts[0].contains("skepticalinquirer.org"));
    assert!(!prompts[0].contains(TRUNCATION_MARKER));
}

#[tokio::test]
async fn long_research_is_truncated_with_a_marker() {
    let dir = TempDir::new().unwrap();
    let store = researched_store(&dir, 5000, AttemptOutcome::Completed);
    let ai = MockAI::new().with_report(&sample_report());
    let driver = ExtractionDriver::new(Arc::new(ai.clone()), store).with_max_raw_chars(3000);

    driver.extract(&request()).await.unwrap();
    assert!(ai.prompts()[0].contains(TRUNCATION_MARKER));
}

#[tokio::test]
async fn refuses_research_that_needs_review() {
    let dir = TempDir::new().unwrap();
    let store = researched_store(&dir, 5000, AttemptOutcome::TimedOut);
    let ai = MockAI::new().with_report(&sample_report());
    let driver = ExtractionDriver::new(Arc::new(ai.clone()), store.clone());

    let err = driver.extract(&request()).await.unwrap_err();
    assert!(matches!(err, ExtractionError::IncompleteResearch { .. }));
    assert!(err.to_string().contains("needs_review"));
    assert!(ai.prompts().is_empty());
    assert!(!store.report_exists(SAMPLE_SLUG));
}

#[tokio::test]
async fn refuses_short_raw_text_even_when_marked_complete() {
    let dir = TempDir::new().unwrap();
    let store = researched_store(&dir, 5000, AttemptOutcome::Completed);
    store.write_raw(SAMPLE_SLUG, &research_text(1500)).unwrap();
    let driver = ExtractionDriver::new(Arc::new(MockAI::new()), store);

    let err = driver.extract(&request()).await.unwrap_err();
    assert!(matches!(err, ExtractionError::IncompleteResearch { .. }));
}

#[tokio::test]
async fn missing_job_is_incomplete_research() {
    let dir = TempDir::new().unwrap();
    let driver = ExtractionDriver::new(Arc::new(MockAI::new()), ArtifactStore::new(dir.path()));

    assert!(matches!(
        driver.extract(&request()).await,
        Err(ExtractionError::IncompleteResearch { .. })
    ));
}

#[tokio::test]
async fn non_conformant_output_writes_nothing() {
    let dir = TempDir::new().unwrap();
    let store = researched_store(&dir, 5000, AttemptOutcome::Completed);
    let mut report = sample_report();
    report.sources.truncate(2);
    let ai = MockAI::new().with_response(serde_json::to_string(&report).unwrap());
    let driver = ExtractionDriver::new(Arc::new(ai), store.clone());

    let err = driver.extract(&request()).await.unwrap_err();
    assert!(matches!(err, ExtractionError::Schema(_)));
    assert!(!store.report_exists(SAMPLE_SLUG));
}

#[tokio::test]
async fn provider_errors_surface() {
    let dir = TempDir::new().unwrap();
    let store = researched_store(&dir, 5000, AttemptOutcome::Completed);
    let driver = ExtractionDriver::new(Arc::new(MockAI::new().failing("rate limited")), store);

    assert!(matches!(
        driver.extract(&request()).await,
        Err(ExtractionError::Provider(_))
    ));
}

mod properties {
    use proptest::prelude::*;
    use research::extract::{first_json_object, truncate_raw, TRUNCATION_MARKER};

    proptest! {
        #[test]
        fn truncation_keeps_a_char_prefix(raw in "\\PC{0,300}", max in 0usize..200) {
            let (out, truncated) = truncate_raw(&raw, max);
            let chars = raw.chars().count();
            prop_assert_eq!(truncated, chars > max);
            if truncated {
                let kept: String = raw.chars().take(max).collect();
                prop_assert_eq!(out.into_owned(), format!("{}\n\n{}", kept, TRUNCATION_MARKER));
            } else {
                prop_assert_eq!(out.as_ref(), raw.as_str());
            }
        }

        #[test]
        fn serialized_object_is_found_inside_prose(
            before in "[a-zA-Z .,:\n]{0,40}",
            after in "[a-zA-Z .,:\n]{0,40}",
            fields in prop::collection::btree_map("[a-z]{1,8}", "\\PC{0,20}", 0..6),
        ) {
            let json = serde_json::to_string(&fields).unwrap();
            let text = format!("{}{}{}", before, json, after);
            prop_assert_eq!(first_json_object(&text), Some(json.as_str()));
        }
    }
}
