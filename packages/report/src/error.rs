//! Typed errors for the report crate.
//!
//! Uses `thiserror` for library errors (not `anyhow`) so callers can tell a
//! malformed record apart from one that parsed but broke a schema invariant.

use std::fmt;

use thiserror::Error;

/// A single schema invariant that a report record failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaViolation {
    /// Dotted path to the offending field, e.g. `sources[2].domain`.
    pub path: String,
    pub message: String,
}

impl SchemaViolation {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for SchemaViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// Errors that can occur while loading or checking a report record.
#[derive(Debug, Error)]
pub enum ReportError {
    /// Record parsed but does not satisfy the schema invariants
    #[error("report does not conform to schema: {}", summarize(.0))]
    Schema(Vec<SchemaViolation>),

    /// JSON parsing error (syntax, unknown field, wrong type)
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),
}

fn summarize(violations: &[SchemaViolation]) -> String {
    match violations {
        [] => "no violations recorded".to_string(),
        [only] => only.to_string(),
        [first, rest @ ..] => format!("{} (and {} more)", first, rest.len()),
    }
}

/// Result type alias for report operations.
pub type Result<T> = std::result::Result<T, ReportError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_error_summarizes_first_violation() {
        let err = ReportError::Schema(vec![
            SchemaViolation::new("sources", "at least 3 sources required"),
            SchemaViolation::new("sections", "at least 1 section required"),
        ]);
        let text = err.to_string();
        assert!(text.contains("sources: at least 3 sources required"));
        assert!(text.contains("and 1 more"));
    }
}
