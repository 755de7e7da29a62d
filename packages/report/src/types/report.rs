use chrono::NaiveDate;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::{chart::ChartDescriptor, claim::Claim, source::Source, verdict::Verdict};

/// Root of a fact-check report record.
///
/// Produced by extraction, consumed read-only by the renderer and validator.
/// There are no style or markup fields: appearance belongs to the renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct Report {
    pub slug: String,
    /// 100 chars or fewer recommended.
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    pub category: String,
    pub tag_label: String,
    pub tag_color: TagColor,
    pub publish_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verdict: Option<Verdict>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verdict_summary: Option<String>,
    /// In [0, 1].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    pub executive_summary: ExecutiveSummary,
    pub sections: Vec<Section>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub claims: Vec<Claim>,
    pub sources: Vec<Source>,
    /// 100 chars or more recommended.
    pub bottom_line: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct ExecutiveSummary {
    pub claim: String,
    pub reality: String,
    pub key_points: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct Section {
    pub heading: String,
    /// Prose. Blank lines separate paragraphs; `[N]` cites `sources[N-1]`.
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chart: Option<ChartDescriptor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quote: Option<QuoteBox>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeline: Option<Vec<TimelineEvent>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub float_position: Option<FloatPosition>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct QuoteBox {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribution: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct TimelineEvent {
    /// Free-form date text ("March 2021", "2019-05-02").
    pub date: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum FloatPosition {
    Left,
    Right,
}

/// Tag tint. A closed set the renderer maps onto its own palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum TagColor {
    Red,
    Orange,
    Amber,
    Green,
    Blue,
    Teal,
    Slate,
}

impl TagColor {
    pub fn as_str(&self) -> &'static str {
        match self {
            TagColor::Red => "red",
            TagColor::Orange => "orange",
            TagColor::Amber => "amber",
            TagColor::Green => "green",
            TagColor::Blue => "blue",
            TagColor::Teal => "teal",
            TagColor::Slate => "slate",
        }
    }

    /// CSS class shared by report tags and site-index entries.
    pub fn css_class(&self) -> String {
        format!("tag-{}", self.as_str())
    }
}

impl Report {
    /// Parse a record and check it against the schema invariants.
    pub fn from_json(json: &str) -> crate::Result<Self> {
        let report: Report = serde_json::from_str(json)?;
        crate::schema::ensure_valid(&report)?;
        Ok(report)
    }

    /// Serialise without schema checks.
    pub fn to_json_pretty(&self) -> crate::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Source ids in positional order, explicit ids where given.
    pub fn source_ids(&self) -> Vec<String> {
        self.sources
            .iter()
            .enumerate()
            .map(|(i, s)| s.effective_id(i))
            .collect()
    }

    /// Index of the source a claim id refers to, if any.
    pub fn find_source(&self, id: &str) -> Option<usize> {
        self.sources
            .iter()
            .enumerate()
            .position(|(i, s)| s.effective_id(i) == id)
    }

    /// JSON Schema for the record, used to brief the extraction provider.
    pub fn json_schema() -> serde_json::Value {
        let schema = schemars::schema_for!(Report);
        serde_json::to_value(schema).unwrap_or(serde_json::Value::Null)
    }
}
