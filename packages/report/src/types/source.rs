use chrono::NaiveDate;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A cited source. Reports carry sources by value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct Source {
    /// Explicit id. When absent the positional id `s_<N>` applies (1-based).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    /// Absolute http(s) URL.
    pub url: String,
    /// Hostname of `url`.
    pub domain: String,
    /// Editorial credibility, 0-100.
    pub trust_score: u8,
    pub accessed_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quote: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub source_type: Option<SourceType>,
}

impl Source {
    /// Id a claim uses to cite this source at `position` (0-based).
    pub fn effective_id(&self, position: usize) -> String {
        match &self.id {
            Some(id) => id.clone(),
            None => positional_id(position),
        }
    }

    pub fn tier(&self) -> TrustTier {
        TrustTier::for_score(self.trust_score)
    }
}

/// Positional source id for 0-based `position`.
pub fn positional_id(position: usize) -> String {
    format!("s_{}", position + 1)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    Primary,
    Secondary,
    Tertiary,
}

/// Display tier derived from a trust score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum TrustTier {
    /// score >= 90
    Tier1,
    /// score >= 80
    Tier2,
    /// score < 80
    Tier3,
}

impl TrustTier {
    pub fn for_score(score: u8) -> Self {
        match score {
            90.. => TrustTier::Tier1,
            80..=89 => TrustTier::Tier2,
            _ => TrustTier::Tier3,
        }
    }

    pub fn css_class(&self) -> &'static str {
        match self {
            TrustTier::Tier1 => "trust-tier-1",
            TrustTier::Tier2 => "trust-tier-2",
            TrustTier::Tier3 => "trust-tier-3",
        }
    }
}
