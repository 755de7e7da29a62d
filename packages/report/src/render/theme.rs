//! Fixed visual identity. Nothing in a report record can change these.

use crate::types::report::TagColor;
use crate::types::verdict::Verdict;

pub const BRAND_NAME: &str = "FactDesk";
pub const BRAND_TAGLINE: &str = "Independent, source-first fact-checking";
pub const BRAND_HOME: &str = "/";
pub const REPORTS_PATH: &str = "/reports/";

/// Chart watermark plugin id, registered once per page.
pub const WATERMARK_PLUGIN_ID: &str = "factdeskWatermark";

pub const CHART_LIBRARY_URL: &str =
    "https://cdn.jsdelivr.net/npm/chart.js@4.4.1/dist/chart.umd.min.js";
pub const FONT_STYLESHEET_URL: &str = "https://fonts.googleapis.com/css2?family=Inter:wght@400;600;700&family=Source+Serif+4:wght@400;600&display=swap";
pub const FONT_PRECONNECT: [&str; 2] = [
    "https://fonts.googleapis.com",
    "https://fonts.gstatic.com",
];

pub mod palette {
    pub const INK: &str = "#0f172a";
    pub const PAPER: &str = "#f8fafc";
    pub const ACCENT: &str = "#0e7490";
    pub const ACCENT_DARK: &str = "#155e75";
    pub const MUTED: &str = "#64748b";
    pub const RULE: &str = "#e2e8f0";
    pub const TIER_1: &str = "#15803d";
    pub const TIER_2: &str = "#b45309";
    pub const TIER_3: &str = "#b91c1c";
}

/// Series colours handed to charts whose datasets carry none.
pub const CHART_SERIES: [&str; 6] = [
    "#0e7490", "#f59e0b", "#16a34a", "#dc2626", "#2563eb", "#475569",
];

pub fn verdict_color(verdict: Verdict) -> &'static str {
    match verdict {
        Verdict::True => "#15803d",
        Verdict::MostlyTrue => "#65a30d",
        Verdict::Mixed => "#d97706",
        Verdict::NeedsContext => "#0284c7",
        Verdict::MostlyFalse => "#ea580c",
        Verdict::False => "#dc2626",
        Verdict::Unverifiable => "#6b7280",
    }
}

pub fn tag_color(color: TagColor) -> &'static str {
    match color {
        TagColor::Red => "#b91c1c",
        TagColor::Orange => "#c2410c",
        TagColor::Amber => "#b45309",
        TagColor::Green => "#15803d",
        TagColor::Blue => "#1d4ed8",
        TagColor::Teal => "#0f766e",
        TagColor::Slate => "#334155",
    }
}
