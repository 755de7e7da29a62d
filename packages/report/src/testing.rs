//! Report fixtures for tests across the workspace.
//!
//! `sample_report` is the canonical happy-path record: five non-Wikipedia
//! sources, three sections (the first with a chart), three key points, a
//! FALSE verdict with summary, confidence and claims. It passes the validator
//! with no findings.

use chrono::NaiveDate;

use crate::types::{
    chart::{ChartDescriptor, ChartType, Dataset},
    claim::Claim,
    report::{
        ExecutiveSummary, FloatPosition, QuoteBox, Report, Section, TagColor, TimelineEvent,
    },
    source::{Source, SourceType},
    verdict::Verdict,
};

pub const SAMPLE_SLUG: &str = "flat-earth-20260215";

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default()
}

/// Build a source; `domain` is derived from the url host.
pub fn source(name: &str, url: &str, trust_score: u8) -> Source {
    let domain = crate::schema::url_host(url).unwrap_or_default();
    Source {
        id: None,
        name: name.to_string(),
        url: url.to_string(),
        domain,
        trust_score,
        accessed_date: date(2026, 2, 14),
        quote: None,
        source_type: None,
    }
}

/// The five sources of the happy-path scenario.
pub fn sample_sources() -> Vec<Source> {
    let mut sources = vec![
        source(
            "Skeptical Inquirer",
            "https://skepticalinquirer.org/2025/09/the-flat-earth-revival/",
            78,
        ),
        source(
            "Scientific American",
            "https://www.scientificamerican.com/article/why-the-earth-is-round/",
            82,
        ),
        source(
            "NASA Earth Observatory",
            "https://earthobservatory.nasa.gov/images/blue-marble",
            90,
        ),
        source(
            "BBC News",
            "https://bbc.com/news/science-environment-flat-earth",
            95,
        ),
        source(
            "Centers for Disease Control and Prevention",
            "https://www.cdc.gov/misinformation/index.html",
            98,
        ),
    ];
    sources[2].source_type = Some(SourceType::Primary);
    sources[3].quote = Some("Interest in the idea has grown online since 2016.".to_string());
    sources
}

/// Canonical happy-path report record.
pub fn sample_report() -> Report {
    Report {
        slug: SAMPLE_SLUG.to_string(),
        title: "Is the Earth flat? Examining the resurgence of a debunked idea".to_string(),
        subtitle: Some("Why a centuries-old misconception is trending again".to_string()),
        category: "Science".to_string(),
        tag_label: "Misinformation".to_string(),
        tag_color: TagColor::Red,
        publish_date: date(2026, 2, 15),
        verdict: Some(Verdict::False),
        verdict_summary: Some(
            "Every independent line of evidence shows the Earth is an oblate spheroid."
                .to_string(),
        ),
        confidence: Some(0.97),
        executive_summary: ExecutiveSummary {
            claim: "The Earth is flat and space agencies hide the truth.".to_string(),
            reality: "Satellite imagery, circumnavigation, and basic physics all show a \
                      spherical Earth; the claim relies on misread observations."
                .to_string(),
            key_points: vec![
                "Ships disappear hull-first over the horizon [2].".to_string(),
                "Satellite imagery shows a globe in real time [3].".to_string(),
                "Online interest spiked after 2016 [4].".to_string(),
            ],
        },
        sections: vec![
            Section {
                heading: "Where the claim comes from".to_string(),
                content: "Flat-earth content circulates mainly through video platforms [1].\n\n\
                          Researchers link the revival to wider distrust in institutions [5]."
                    .to_string(),
                chart: Some(ChartDescriptor {
                    chart_type: ChartType::Bar,
                    title: "Search interest by year".to_string(),
                    labels: vec!["2015".into(), "2017".into(), "2019".into(), "2021".into()],
                    datasets: vec![Dataset {
                        label: "Relative interest".to_string(),
                        data: vec![12.0, 100.0, 64.0, 41.0],
                        colors: vec![],
                    }],
                    options: None,
                }),
                quote: None,
                timeline: None,
                float_position: Some(FloatPosition::Right),
            },
            Section {
                heading: "What the evidence shows".to_string(),
                content: "Direct imagery from orbit has been available since 1946 [3]. \
                          Navigation systems depend on a spherical model [2]."
                    .to_string(),
                chart: None,
                quote: Some(QuoteBox {
                    text: "Interest in the idea has grown online since 2016.".to_string(),
                    attribution: Some("BBC News".to_string()),
                    source_id: Some("s_4".to_string()),
                }),
                timeline: Some(vec![
                    TimelineEvent {
                        date: "1946".to_string(),
                        title: "First photo from space".to_string(),
                        description: None,
                    },
                    TimelineEvent {
                        date: "1972".to_string(),
                        title: "Blue Marble photograph".to_string(),
                        description: Some("Taken by the Apollo 17 crew.".to_string()),
                    },
                ]),
                float_position: None,
            },
            Section {
                heading: "Why it matters".to_string(),
                content: "Public-health agencies treat science denial as a gateway to \
                          other misinformation [5]."
                    .to_string(),
                chart: None,
                quote: None,
                timeline: None,
                float_position: None,
            },
        ],
        claims: vec![
            Claim {
                id: "c_1".to_string(),
                text: "The Earth is flat.".to_string(),
                verdict: Verdict::False,
                evidence: "Orbital imagery and navigation data contradict it.".to_string(),
                source_ids: vec!["s_2".to_string(), "s_3".to_string()],
            },
            Claim {
                id: "c_2".to_string(),
                text: "Space agencies fake globe imagery.".to_string(),
                verdict: Verdict::False,
                evidence: "Imagery is independently reproduced by many countries.".to_string(),
                source_ids: vec!["s_3".to_string(), "s_4".to_string()],
            },
        ],
        sources: sample_sources(),
        bottom_line: "The flat-earth claim is false. It persists because it thrives on \
                      distrust rather than evidence, and every measurement anyone can \
                      repeat points to a round planet."
            .to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_meets_recommended_lengths() {
        let report = sample_report();
        assert!(report.title.chars().count() <= 100);
        assert!(report.bottom_line.chars().count() >= 100);
        assert_eq!(report.sources.len(), 5);
    }
}
