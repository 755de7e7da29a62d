//! Report → HTML.
//!
//! [`render`] is a pure, total function: no IO, no clock, and identical input
//! gives byte-identical output. Layout, palette, fonts, navigation, footer,
//! watermark and the share/feedback furniture come from this module alone;
//! the record only supplies text and data.
//!
//! Page order: header, executive summary, content sections, bottom line,
//! sources grid, feedback form. A sticky banner above the article repeats the
//! eight most trusted sources.

pub mod escape;
pub mod script;
pub mod style;
pub mod theme;

use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::types::{
    report::{FloatPosition, QuoteBox, Report, Section, TimelineEvent},
    source::Source,
};
use escape::{href, html, truncate_chars};
use script::{page_script, ChartEntry};
use theme::{palette, BRAND_HOME, BRAND_NAME, BRAND_TAGLINE, REPORTS_PATH};

/// Sources shown in the sticky banner.
pub const BANNER_SOURCE_COUNT: usize = 8;
/// Upper bound for the meta description.
pub const META_DESCRIPTION_MAX: usize = 160;
const WORDS_PER_MINUTE: usize = 200;

static CITATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[(\d{1,3})\]").expect("citation pattern is valid"));
static PARAGRAPH_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n[ \t]*\n").expect("paragraph pattern is valid"));

/// Render a report record into a single self-contained HTML document.
pub fn render(report: &Report) -> String {
    let mut page = Page::new(report);
    page.head();
    page.body();
    page.finish()
}

/// Sources for the banner: highest trust first, ties in record order.
pub fn banner_sources(report: &Report) -> Vec<(usize, &Source)> {
    let mut ranked: Vec<(usize, &Source)> = report.sources.iter().enumerate().collect();
    // `sort_by` is stable, so equal scores keep insertion order.
    ranked.sort_by(|a, b| b.1.trust_score.cmp(&a.1.trust_score));
    ranked.truncate(BANNER_SOURCE_COUNT);
    ranked
}

/// Meta description derived from the executive summary's reality statement.
pub fn meta_description(report: &Report) -> String {
    truncate_chars(&report.executive_summary.reality, META_DESCRIPTION_MAX)
}

/// Estimated read time in whole minutes (never zero).
pub fn read_time_minutes(report: &Report) -> usize {
    let words: usize = std::iter::once(report.executive_summary.reality.as_str())
        .chain(std::iter::once(report.executive_summary.claim.as_str()))
        .chain(report.executive_summary.key_points.iter().map(String::as_str))
        .chain(report.sections.iter().map(|s| s.content.as_str()))
        .chain(std::iter::once(report.bottom_line.as_str()))
        .map(|text| text.split_whitespace().count())
        .sum();
    words.div_ceil(WORDS_PER_MINUTE).max(1)
}

/// Short plain-text excerpt for listings.
pub fn excerpt(report: &Report, max_chars: usize) -> String {
    let text = report
        .verdict_summary
        .as_deref()
        .unwrap_or(&report.executive_summary.reality);
    truncate_chars(text, max_chars)
}

struct Page<'a> {
    report: &'a Report,
    out: String,
    charts: Vec<ChartEntry>,
}

impl<'a> Page<'a> {
    fn new(report: &'a Report) -> Self {
        Self {
            report,
            out: String::with_capacity(32 * 1024),
            charts: Vec::new(),
        }
    }

    fn push(&mut self, text: &str) {
        self.out.push_str(text);
    }

    fn line(&mut self, text: &str) {
        self.out.push_str(text);
        self.out.push('\n');
    }

    fn head(&mut self) {
        let r = self.report;
        self.line("<!DOCTYPE html>");
        self.line("<html lang=\"en\">");
        self.line("<head>");
        self.line("<meta charset=\"utf-8\">");
        self.line("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">");
        self.line(&format!(
            "<title>{} | {}</title>",
            html(&r.title),
            BRAND_NAME
        ));
        let description = meta_description(r);
        self.line(&format!(
            "<meta name=\"description\" content=\"{}\">",
            html(&description)
        ));
        self.line(&format!(
            "<meta property=\"og:title\" content=\"{}\">",
            html(&r.title)
        ));
        self.line(&format!(
            "<meta property=\"og:description\" content=\"{}\">",
            html(&description)
        ));
        self.line("<meta property=\"og:type\" content=\"article\">");
        self.line(&format!(
            "<meta property=\"og:site_name\" content=\"{}\">",
            BRAND_NAME
        ));
        self.line(&format!(
            "<meta property=\"article:published_time\" content=\"{}\">",
            r.publish_date.format("%Y-%m-%d")
        ));
        self.line(&format!(
            "<link rel=\"canonical\" href=\"{}{}.html\">",
            REPORTS_PATH,
            html(&r.slug)
        ));
        self.line(&format!(
            "<link rel=\"preconnect\" href=\"{}\">",
            theme::FONT_PRECONNECT[0]
        ));
        self.line(&format!(
            "<link rel=\"preconnect\" href=\"{}\" crossorigin>",
            theme::FONT_PRECONNECT[1]
        ));
        self.line(&format!(
            "<link rel=\"stylesheet\" href=\"{}\">",
            html(theme::FONT_STYLESHEET_URL)
        ));
        // Not deferred: the inline script at the end of <body> calls `Chart`
        // while the page is still parsing.
        self.line(&format!(
            "<script src=\"{}\"></script>",
            theme::CHART_LIBRARY_URL
        ));
        self.push("<style>");
        self.push(style::STYLESHEET);
        self.line("</style>");
        self.line("</head>");
    }

    fn body(&mut self) {
        self.line("<body>");
        self.line(&format!(
            "<div class=\"watermark-bg\" aria-hidden=\"true\">{}</div>",
            BRAND_NAME
        ));
        self.navbar();
        self.line("<div class=\"mobile-notice\">Best viewed on a larger screen: charts and the source list are condensed on mobile.</div>");
        self.sources_banner();
        self.line("<main class=\"report\">");
        self.header();
        self.executive_summary();
        let report = self.report;
        for (i, section) in report.sections.iter().enumerate() {
            self.section(i, section);
        }
        self.bottom_line();
        self.sources_grid();
        self.feedback();
        self.line("</main>");
        self.footer();
        self.share_modal();
        self.push("<script>");
        let script = page_script(&self.charts);
        self.push(&script);
        self.line("</script>");
        self.line("</body>");
        self.line("</html>");
    }

    fn finish(self) -> String {
        self.out
    }

    fn navbar(&mut self) {
        self.line("<header class=\"navbar\">");
        self.line(&format!(
            "<a class=\"wordmark\" href=\"{}\">{}</a>",
            BRAND_HOME, BRAND_NAME
        ));
        self.line("<nav>");
        self.line(&format!("<a href=\"{}\">Reports</a>", REPORTS_PATH));
        self.line("<a href=\"/methodology.html\">Methodology</a>");
        self.line("<a href=\"/about.html\">About</a>");
        self.line(
            "<button type=\"button\" class=\"share-button\" data-action=\"share\">Share</button>",
        );
        self.line("</nav>");
        self.line("</header>");
    }

    fn sources_banner(&mut self) {
        let ranked = banner_sources(self.report);
        self.line("<aside class=\"sources-banner collapsed\" id=\"sources-banner\">");
        self.line(&format!(
            "<button type=\"button\" aria-expanded=\"false\" aria-controls=\"sources-banner-list\">Sources ({}) &middot; most trusted first</button>",
            self.report.sources.len()
        ));
        self.line("<ol id=\"sources-banner-list\">");
        for (position, source) in ranked {
            self.line(&format!(
                "<li><a href=\"#source-{}\">{}</a> <span class=\"trust-badge {}\">{}</span></li>",
                position + 1,
                html(&source.name),
                source.tier().css_class(),
                source.trust_score
            ));
        }
        self.line("</ol>");
        self.line("</aside>");
    }

    fn header(&mut self) {
        let r = self.report;
        self.line("<header class=\"report-header\">");
        self.line(&format!(
            "<span class=\"tag {}\" style=\"background: {}\">{}</span>",
            r.tag_color.css_class(),
            theme::tag_color(r.tag_color),
            html(&r.tag_label)
        ));
        self.line(&format!("<h1>{}</h1>", html(&r.title)));
        if let Some(subtitle) = &r.subtitle {
            self.line(&format!("<p class=\"subtitle\">{}</p>", html(subtitle)));
        }
        self.line(&format!(
            "<p class=\"meta\"><time datetime=\"{}\">{}</time> &middot; {} &middot; {} min read</p>",
            r.publish_date.format("%Y-%m-%d"),
            r.publish_date.format("%B %-d, %Y"),
            html(&r.category),
            read_time_minutes(r)
        ));
        if let Some(verdict) = r.verdict {
            self.line(&format!(
                "<div class=\"verdict-badge {}\" style=\"--verdict: {}\">",
                verdict.css_class(),
                theme::verdict_color(verdict)
            ));
            self.line(&format!(
                "<span class=\"verdict-label\">{}</span>",
                verdict.label()
            ));
            self.push("<div>");
            if let Some(summary) = &r.verdict_summary {
                self.push(&format!(
                    "<p class=\"verdict-summary\">{}</p>",
                    self.prose_inline(summary)
                ));
            }
            if let Some(confidence) = r.confidence {
                self.push(&format!(
                    "<p class=\"confidence\">Confidence: {}%</p>",
                    (confidence.clamp(0.0, 1.0) * 100.0).round() as u32
                ));
            }
            self.line("</div>");
            self.line("</div>");
        }
        self.line("</header>");
    }

    fn executive_summary(&mut self) {
        let report = self.report;
        let summary = &report.executive_summary;
        self.line("<section class=\"executive-summary\" id=\"summary\">");
        self.line("<h2>Executive summary</h2>");
        self.line(&format!(
            "<p class=\"summary-claim\"><strong>The claim:</strong> {}</p>",
            self.prose_inline(&summary.claim)
        ));
        self.line(&format!(
            "<p class=\"summary-reality\"><strong>The reality:</strong> {}</p>",
            self.prose_inline(&summary.reality)
        ));
        self.line("<ul class=\"key-points\">");
        for point in &summary.key_points {
            self.line(&format!("<li>{}</li>", self.prose_inline(point)));
        }
        self.line("</ul>");
        self.claims_table();
        self.line("</section>");
    }

    fn claims_table(&mut self) {
        let report = self.report;
        if report.claims.is_empty() {
            return;
        }
        self.line("<table class=\"claims-table\">");
        self.line("<thead><tr><th>Claim</th><th>Verdict</th><th>Evidence</th><th>Sources</th></tr></thead>");
        self.line("<tbody>");
        for claim in &report.claims {
            let cites: Vec<String> = claim
                .source_ids
                .iter()
                .map(|id| match report.find_source(id) {
                    Some(i) => format!("<a href=\"#source-{}\">[{}]</a>", i + 1, i + 1),
                    None => html(id).into_owned(),
                })
                .collect();
            self.line(&format!(
                "<tr id=\"claim-{}\"><td>{}</td><td><span class=\"{}\" style=\"color: {}\">{}</span></td><td>{}</td><td>{}</td></tr>",
                html(&claim.id),
                html(&claim.text),
                claim.verdict.css_class(),
                theme::verdict_color(claim.verdict),
                claim.verdict.label(),
                html(&claim.evidence),
                cites.join(" ")
            ));
        }
        self.line("</tbody>");
        self.line("</table>");
    }

    fn section(&mut self, index: usize, section: &Section) {
        let number = index + 1;
        self.line(&format!(
            "<section class=\"content-section\" id=\"section-{}\">",
            number
        ));
        self.line(&format!("<h2>{}</h2>", html(&section.heading)));

        if let Some(chart) = &section.chart {
            let canvas_id = format!("chart-{}", number);
            let placement = match section.float_position {
                Some(FloatPosition::Left) => "chart-float chart-left",
                Some(FloatPosition::Right) => "chart-float chart-right",
                None => "chart-block",
            };
            self.line(&format!("<figure class=\"chart-figure {}\">", placement));
            self.line(&format!(
                "<div class=\"chart-canvas\"><canvas id=\"{}\" role=\"img\" aria-label=\"{}\"></canvas></div>",
                canvas_id,
                html(&chart.title)
            ));
            self.line(&format!(
                "<figcaption>{} &middot; Chart: {}</figcaption>",
                html(&chart.title),
                BRAND_NAME
            ));
            self.line("</figure>");
            self.charts.push(ChartEntry::new(canvas_id, chart));
        }

        for paragraph in PARAGRAPH_BREAK.split(&section.content) {
            let paragraph = paragraph.trim();
            if !paragraph.is_empty() {
                self.line(&format!("<p>{}</p>", self.prose_inline(paragraph)));
            }
        }

        if let Some(quote) = &section.quote {
            self.quote(quote);
        }
        if let Some(events) = &section.timeline {
            self.timeline(events);
        }
        self.line("</section>");
    }

    fn quote(&mut self, quote: &QuoteBox) {
        self.line("<blockquote class=\"quote-box\">");
        self.line(&format!("<p>{}</p>", html(&quote.text)));
        let cite = quote
            .source_id
            .as_deref()
            .and_then(|id| self.report.find_source(id))
            .map(|i| format!(" <a href=\"#source-{}\">[{}]</a>", i + 1, i + 1))
            .unwrap_or_default();
        match &quote.attribution {
            Some(attribution) => self.line(&format!(
                "<footer>&mdash; {}{}</footer>",
                html(attribution),
                cite
            )),
            None if !cite.is_empty() => self.line(&format!("<footer>{}</footer>", cite.trim())),
            None => {}
        }
        self.line("</blockquote>");
    }

    fn timeline(&mut self, events: &[TimelineEvent]) {
        if events.is_empty() {
            return;
        }
        self.line("<ol class=\"timeline\">");
        for event in events {
            self.push(&format!(
                "<li><span class=\"timeline-date\">{}</span> <strong>{}</strong>",
                html(&event.date),
                html(&event.title)
            ));
            if let Some(description) = &event.description {
                self.push(&format!("<p>{}</p>", self.prose_inline(description)));
            }
            self.line("</li>");
        }
        self.line("</ol>");
    }

    fn bottom_line(&mut self) {
        self.line("<section class=\"bottom-line\" id=\"bottom-line\">");
        self.line("<h2>The bottom line</h2>");
        self.line(&format!(
            "<p>{}</p>",
            self.prose_inline(&self.report.bottom_line)
        ));
        self.line("</section>");
    }

    fn sources_grid(&mut self) {
        self.line("<section class=\"sources-grid\" id=\"sources\">");
        self.line("<h2>Sources</h2>");
        self.line("<div class=\"grid\">");
        let report = self.report;
        for (i, source) in report.sources.iter().enumerate() {
            self.line(&format!(
                "<article class=\"source-card\" id=\"source-{}\">",
                i + 1
            ));
            self.line(&format!(
                "<p><span class=\"trust-badge {}\" title=\"Trust score\">{}</span> <span class=\"source-index\">[{}]</span></p>",
                source.tier().css_class(),
                source.trust_score,
                i + 1
            ));
            self.line(&format!(
                "<p class=\"source-name\"><a href=\"{}\" target=\"_blank\" rel=\"noopener noreferrer\">{}</a></p>",
                href(&source.url),
                html(&source.name)
            ));
            self.line(&format!(
                "<p class=\"source-domain\">{} &middot; accessed {}</p>",
                html(&source.domain),
                source.accessed_date.format("%Y-%m-%d")
            ));
            if let Some(quote) = &source.quote {
                self.line(&format!("<blockquote>{}</blockquote>", html(quote)));
            }
            self.line("</article>");
        }
        self.line("</div>");
        self.line("</section>");
    }

    fn feedback(&mut self) {
        self.line("<section class=\"feedback\" id=\"feedback\">");
        self.line("<h2>Spot an error?</h2>");
        self.line("<form class=\"feedback-form\" method=\"post\" action=\"/api/feedback\">");
        self.line(&format!(
            "<input type=\"hidden\" name=\"slug\" value=\"{}\">",
            html(&self.report.slug)
        ));
        self.line("<label for=\"feedback-text\">Tell our editors what we got wrong or missed.</label>");
        self.line("<textarea id=\"feedback-text\" name=\"message\" required maxlength=\"2000\"></textarea>");
        self.line("<button type=\"submit\">Send feedback</button>");
        self.line("<p class=\"feedback-status\" role=\"status\"></p>");
        self.line("</form>");
        self.line("</section>");
    }

    fn footer(&mut self) {
        self.line("<footer class=\"site-footer\">");
        self.line(&format!("<p class=\"wordmark\">{}</p>", BRAND_NAME));
        self.line(&format!("<p>{}</p>", BRAND_TAGLINE));
        self.line(&format!(
            "<p>&copy; {} {} &middot; <a href=\"{}\" style=\"color: {}\">All reports</a></p>",
            self.report.publish_date.format("%Y"),
            BRAND_NAME,
            REPORTS_PATH,
            palette::PAPER
        ));
        self.line("</footer>");
    }

    fn share_modal(&mut self) {
        self.line("<div class=\"share-modal\" id=\"share-modal\" role=\"dialog\" aria-modal=\"true\" aria-labelledby=\"share-title\" hidden>");
        self.line("<div class=\"dialog\">");
        self.line("<h2 id=\"share-title\">Share this report</h2>");
        self.line("<input id=\"share-url\" type=\"text\" readonly value=\"\">");
        self.line("<p><button type=\"button\" data-share=\"copy\">Copy link</button> <a data-share=\"x\" href=\"#\" target=\"_blank\" rel=\"noopener\">Post on X</a> <a data-share=\"email\" href=\"#\">Email</a></p>");
        self.line("<button type=\"button\" data-share=\"close\">Close</button>");
        self.line("</div>");
        self.line("</div>");
    }

    /// Escape prose and turn in-range `[N]` markers into source links.
    fn prose_inline(&self, text: &str) -> String {
        let escaped = html(text);
        let count = self.report.sources.len();
        CITATION
            .replace_all(&escaped, |caps: &Captures<'_>| {
                match caps[1].parse::<usize>() {
                    Ok(n) if (1..=count).contains(&n) => format!(
                        "<sup class=\"cite\"><a href=\"#source-{n}\">[{n}]</a></sup>"
                    ),
                    _ => caps[0].to_string(),
                }
            })
            .into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::sample_report;

    #[test]
    fn banner_sorts_by_trust_with_stable_ties() {
        let mut report = sample_report();
        report.sources[0].trust_score = 98;
        let order: Vec<usize> = banner_sources(&report).iter().map(|(i, _)| *i).collect();
        // sources[0] and sources[4] tie at 98; record order wins.
        assert_eq!(order, vec![0, 4, 3, 2, 1]);
    }

    #[test]
    fn banner_caps_at_eight() {
        let mut report = sample_report();
        let extra = report.sources[0].clone();
        for _ in 0..6 {
            report.sources.push(extra.clone());
        }
        assert_eq!(banner_sources(&report).len(), BANNER_SOURCE_COUNT);
    }

    #[test]
    fn citations_link_only_when_in_range() {
        let report = sample_report();
        let page = Page::new(&report);
        let out = page.prose_inline("see [2] and [9] <b>");
        assert!(out.contains("<a href=\"#source-2\">[2]</a>"));
        assert!(out.contains("[9]"));
        assert!(!out.contains("#source-9"));
        assert!(out.contains("&lt;b&gt;"));
    }

    #[test]
    fn read_time_is_at_least_one_minute() {
        assert_eq!(read_time_minutes(&sample_report()), 1);
    }

    #[test]
    fn excerpt_prefers_verdict_summary() {
        let report = sample_report();
        assert!(excerpt(&report, 200).starts_with("Every independent line"));
    }
}
