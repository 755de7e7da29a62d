//! Extraction driver: research text to a report record.
//!
//! The extractor's output is parsed and checked, never repaired. A response
//! that is not a conformant record fails loudly so an editor looks at it.

pub mod json;
pub mod prompt;

use std::sync::Arc;

use chrono::NaiveDate;
use report::{Report, SchemaViolation};
use tracing::{info, warn};

use crate::ai::AI;
use crate::artifacts::{ArtifactStore, JobStatus, MIN_COMPLETE_CHARS};
use crate::error::{ExtractionError, ExtractionResult};
pub use json::first_json_object;
pub use prompt::{build_prompt, truncate_raw, PromptInput, TRUNCATION_MARKER};

/// Characters of research text sent to the extractor.
pub const DEFAULT_MAX_RAW_CHARS: usize = 120_000;

/// Per-topic inputs the job record does not carry.
#[derive(Debug, Clone)]
pub struct ExtractionRequest {
    pub slug: String,
    pub category: Option<String>,
    pub publish_date: NaiveDate,
}

pub struct ExtractionDriver {
    ai: Arc<dyn AI>,
    store: ArtifactStore,
    max_raw_chars: usize,
}

impl ExtractionDriver {
    pub fn new(ai: Arc<dyn AI>, store: ArtifactStore) -> Self {
        Self {
            ai,
            store,
            max_raw_chars: DEFAULT_MAX_RAW_CHARS,
        }
    }

    pub fn with_max_raw_chars(mut self, max_raw_chars: usize) -> Self {
        self.max_raw_chars = max_raw_chars.max(1);
        self
    }

    /// Produce and persist `<slug>.json`.
    pub async fn extract(&self, request: &ExtractionRequest) -> ExtractionResult<Report> {
        let slug = request.slug.as_str();
        let incomplete = |reason: String| ExtractionError::IncompleteResearch {
            slug: slug.to_string(),
            reason,
        };

        let job = self
            .store
            .read_job(slug)?
            .ok_or_else(|| incomplete("no job record".into()))?;
        if job.status != JobStatus::Completed {
            return Err(incomplete(format!("job status is {}", job.status.as_str())));
        }
        let raw = self
            .store
            .read_raw(slug)?
            .ok_or_else(|| incomplete("no raw research text".into()))?;
        let raw_chars = raw.chars().count();
        if raw_chars < MIN_COMPLETE_CHARS {
            return Err(incomplete(format!(
                "raw research is {} characters, below {}",
                raw_chars, MIN_COMPLETE_CHARS
            )));
        }
        let sources = self.store.read_sources(slug)?;

        let (_, truncated) = truncate_raw(&raw, self.max_raw_chars);
        if truncated {
            warn!(slug = %slug, raw_chars, max = self.max_raw_chars, "Research text truncated for extraction");
        }
        let prompt = build_prompt(&PromptInput {
            slug,
            topic: &job.topic,
            category: request.category.as_deref(),
            publish_date: request.publish_date,
            raw: &raw,
            sources: &sources,
            max_raw_chars: self.max_raw_chars,
        });

        info!(slug = %slug, model = %self.ai.model(), prompt_chars = prompt.len(), "Requesting extraction");
        let response = self.ai.complete(&prompt).await?;
        let report = parse_report(&response, slug)?;

        self.store.write_report(&report)?;
        info!(
            slug = %slug,
            sources = report.sources.len(),
            sections = report.sections.len(),
            verdict = ?report.verdict,
            "Report record written"
        );
        Ok(report)
    }
}

/// Find, parse and check the report record in an extractor response.
pub fn parse_report(response: &str, expected_slug: &str) -> ExtractionResult<Report> {
    let object = first_json_object(response)
        .ok_or_else(|| ExtractionError::Parse("no JSON object in response".into()))?;
    let value: serde_json::Value =
        serde_json::from_str(object).map_err(|e| ExtractionError::Parse(e.to_string()))?;
    let report: Report = serde_json::from_value(value)
        .map_err(|e| ExtractionError::Schema(vec![SchemaViolation::new("$", e.to_string())]))?;

    let mut violations = report::schema::check(&report);
    if report.slug != expected_slug {
        violations.push(SchemaViolation::new(
            "slug",
            format!("expected '{}', got '{}'", expected_slug, report.slug),
        ));
    }
    if violations.is_empty() {
        Ok(report)
    } else {
        Err(ExtractionError::Schema(violations))
    }
}
