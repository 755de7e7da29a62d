use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::verdict::Verdict;

/// An individual checked claim with its evidence trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct Claim {
    /// Unique within the report.
    pub id: String,
    pub text: String,
    pub verdict: Verdict,
    pub evidence: String,
    /// Non-empty; every entry must resolve to a source id.
    pub source_ids: Vec<String>,
}
