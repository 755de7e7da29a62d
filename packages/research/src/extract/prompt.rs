//! Extraction prompt.

use std::borrow::Cow;

use report::render::theme::BRAND_NAME;
use report::{ChartType, Report, TagColor, Verdict};

use crate::session::Link;

pub const TRUNCATION_MARKER: &str = "[CONTENT TRUNCATED]";

/// Cut `raw` to at most `max_chars` chars, marking the cut.
pub fn truncate_raw(raw: &str, max_chars: usize) -> (Cow<'_, str>, bool) {
    match raw.char_indices().nth(max_chars) {
        None => (Cow::Borrowed(raw), false),
        Some((byte, _)) => (
            Cow::Owned(format!("{}\n\n{}", &raw[..byte], TRUNCATION_MARKER)),
            true,
        ),
    }
}

pub struct PromptInput<'a> {
    pub slug: &'a str,
    pub topic: &'a str,
    pub category: Option<&'a str>,
    pub publish_date: chrono::NaiveDate,
    pub raw: &'a str,
    pub sources: &'a [Link],
    pub max_raw_chars: usize,
}

pub fn build_prompt(input: &PromptInput<'_>) -> String {
    let (raw, _) = truncate_raw(input.raw, input.max_raw_chars);
    let schema = serde_json::to_string_pretty(&Report::json_schema()).unwrap_or_default();
    let verdicts: Vec<&str> = Verdict::ALL.iter().map(Verdict::as_str).collect();
    let chart_types = [
        ChartType::Bar,
        ChartType::Line,
        ChartType::Doughnut,
        ChartType::Pie,
        ChartType::Radar,
    ]
    .map(|c| c.as_str());
    let tag_colors = [
        TagColor::Red,
        TagColor::Orange,
        TagColor::Amber,
        TagColor::Green,
        TagColor::Blue,
        TagColor::Teal,
        TagColor::Slate,
    ]
    .map(|c| c.as_str());

    let sources = if input.sources.is_empty() {
        "(none listed; take sources from the research text)".to_string()
    } else {
        input
            .sources
            .iter()
            .enumerate()
            .map(|(i, s)| format!("{}. {} {}", i + 1, s.url, s.title))
            .collect::<Vec<_>>()
            .join("\n")
    };

    format!(
        r#"Convert the research below into one {brand} fact-check report record.

Return exactly one JSON object and nothing else. It must validate against this JSON Schema:

{schema}

Fixed values:
- "slug": "{slug}"
- "publish_date": "{date}"
- "category": {category}

Rules:
- "verdict" and every claim "verdict" must be one of: {verdicts}.
- "tag_color" must be one of: {tag_colors}. "chart_type" must be one of: {chart_types}.
- Include at least 3 sources, at least 2 sections, and at least 2 executive summary key points.
- Every source needs an absolute http(s) "url", "domain" equal to that url's hostname, and an integer "trust_score" from 0 to 100. Use 95 or more only for government, university, wire-service and major newspaper sources.
- Keep the research's sources. Do not invent sources and never use Wikipedia.
- Citation numbers [N] in any text refer to sources[N-1]. Number them to match the "sources" array exactly.
- Claims cite sources by id; a source without an "id" has the id "s_N" where N is its 1-based position.
- Charts need non-empty "labels" and one "data" value per label in every dataset.
- If "verdict" is set, also set "verdict_summary", "confidence" (0 to 1) and "claims".
- Title at most 100 characters. "bottom_line" at least 100 characters.
- Data only: no HTML, no CSS, no colour names or colour codes anywhere.

Topic: {topic}

Research sources:
{sources}

Research:
{raw}
"#,
        brand = BRAND_NAME,
        schema = schema,
        slug = input.slug,
        date = input.publish_date.format("%Y-%m-%d"),
        category = match input.category {
            Some(c) => format!("\"{}\"", c.replace('"', "'")),
            None => "choose a short subject category such as \"Science\" or \"Politics\"".to_string(),
        },
        verdicts = verdicts.join(", "),
        tag_colors = tag_colors.join(", "),
        chart_types = chart_types.join(", "),
        topic = input.topic,
        sources = sources,
        raw = raw,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input<'a>(raw: &'a str, sources: &'a [Link]) -> PromptInput<'a> {
        PromptInput {
            slug: "flat-earth-20260215",
            topic: "Flat earth resurgence",
            category: Some("Science"),
            publish_date: chrono::NaiveDate::from_ymd_opt(2026, 2, 15).unwrap(),
            raw,
            sources,
            max_raw_chars: 50,
        }
    }

    #[test]
    fn truncation_marks_the_cut_on_char_boundaries() {
        let input = "é".repeat(60);
        let (text, cut) = truncate_raw(&input, 50);
        assert!(cut);
        assert!(text.starts_with(&"é".repeat(50)));
        assert!(text.ends_with(TRUNCATION_MARKER));

        let (text, cut) = truncate_raw("short", 50);
        assert!(!cut);
        assert_eq!(text, "short");
    }

    #[test]
    fn prompt_carries_schema_enums_and_sources() {
        let sources = vec![Link::new("https://www.cdc.gov/a", "CDC")];
        let raw = "x".repeat(80);
        let prompt = build_prompt(&input(&raw, &sources));
        assert!(prompt.contains("\"slug\": \"flat-earth-20260215\""));
        assert!(prompt.contains("MOSTLY_FALSE"));
        assert!(prompt.contains("NEEDS_CONTEXT"));
        assert!(prompt.contains("doughnut"));
        assert!(prompt.contains("1. https://www.cdc.gov/a CDC"));
        assert!(prompt.contains("sources[N-1]"));
        assert!(prompt.contains(TRUNCATION_MARKER));
        assert!(prompt.contains("\"executive_summary\""));
    }
}
