use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Fact-check verdict labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Verdict {
    True,
    False,
    MostlyTrue,
    MostlyFalse,
    Mixed,
    Unverifiable,
    NeedsContext,
}

impl Verdict {
    pub const ALL: [Verdict; 7] = [
        Verdict::True,
        Verdict::False,
        Verdict::MostlyTrue,
        Verdict::MostlyFalse,
        Verdict::Mixed,
        Verdict::Unverifiable,
        Verdict::NeedsContext,
    ];

    /// Wire form, as it appears in report records.
    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::True => "TRUE",
            Verdict::False => "FALSE",
            Verdict::MostlyTrue => "MOSTLY_TRUE",
            Verdict::MostlyFalse => "MOSTLY_FALSE",
            Verdict::Mixed => "MIXED",
            Verdict::Unverifiable => "UNVERIFIABLE",
            Verdict::NeedsContext => "NEEDS_CONTEXT",
        }
    }

    /// Human-facing label used on badges and in the site index.
    pub fn label(&self) -> &'static str {
        match self {
            Verdict::True => "True",
            Verdict::False => "False",
            Verdict::MostlyTrue => "Mostly True",
            Verdict::MostlyFalse => "Mostly False",
            Verdict::Mixed => "Mixed",
            Verdict::Unverifiable => "Unverifiable",
            Verdict::NeedsContext => "Needs Context",
        }
    }

    /// CSS class carried by verdict badges and index entries.
    pub fn css_class(&self) -> &'static str {
        match self {
            Verdict::True => "verdict-true",
            Verdict::False => "verdict-false",
            Verdict::MostlyTrue => "verdict-mostly-true",
            Verdict::MostlyFalse => "verdict-mostly-false",
            Verdict::Mixed => "verdict-mixed",
            Verdict::Unverifiable => "verdict-unverifiable",
            Verdict::NeedsContext => "verdict-needs-context",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_form_matches_serde() {
        for verdict in Verdict::ALL {
            let json = serde_json::to_string(&verdict).unwrap();
            assert_eq!(json, format!("\"{}\"", verdict.as_str()));
        }
    }

    #[test]
    fn css_classes_are_unique() {
        let mut classes: Vec<_> = Verdict::ALL.iter().map(|v| v.css_class()).collect();
        classes.sort();
        classes.dedup();
        assert_eq!(classes.len(), Verdict::ALL.len());
    }
}
