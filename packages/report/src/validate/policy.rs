//! Editorial policy tables: forbidden colours, the reputable-tier allowlist,
//! and banned source hosts.

/// Brand-violating colour strings. Matched case-insensitively; the `rgb(...)`
/// form also ignores whitespace.
pub const FORBIDDEN_COLORS: [&str; 5] = [
    "#8b5cf6",
    "#7c3aed",
    "#6d28d9",
    "rgb(139,92,246)",
    "purple",
];

/// Domains whose content justifies a trust score of 95 or more. A bare
/// `gov`/`edu` entry covers every host under that TLD.
pub const REPUTABLE_DOMAINS: [&str; 11] = [
    "gov",
    "edu",
    "reuters.com",
    "apnews.com",
    "bbc.com",
    "bbc.co.uk",
    "nytimes.com",
    "wsj.com",
    "washingtonpost.com",
    "nature.com",
    "science.org",
];

/// Trust score at or above which the allowlist applies.
pub const REPUTABLE_TRUST_THRESHOLD: u8 = 95;

const BANNED_HOSTS: [&str; 1] = ["wikipedia.org"];

/// Forbidden colour strings present in `text`, in table order.
pub fn forbidden_colors_in(text: &str) -> Vec<&'static str> {
    let lower = text.to_lowercase();
    let compact: String = lower.chars().filter(|c| !c.is_whitespace()).collect();
    FORBIDDEN_COLORS
        .iter()
        .copied()
        .filter(|needle| {
            if needle.starts_with("rgb(") {
                compact.contains(needle)
            } else {
                lower.contains(needle)
            }
        })
        .collect()
}

/// `true` when `host` equals `domain` or is a subdomain of it.
fn host_matches(host: &str, domain: &str) -> bool {
    host == domain
        || host
            .strip_suffix(domain)
            .is_some_and(|prefix| prefix.ends_with('.'))
}

pub fn is_reputable(domain: &str) -> bool {
    let domain = domain.trim_end_matches('.').to_ascii_lowercase();
    REPUTABLE_DOMAINS.iter().any(|d| host_matches(&domain, d))
}

pub fn is_banned_host(host: &str) -> bool {
    let host = host.trim_end_matches('.').to_ascii_lowercase();
    BANNED_HOSTS.iter().any(|d| host_matches(&host, d))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_colours_regardless_of_case_and_spacing() {
        assert_eq!(forbidden_colors_in("color: #8B5CF6"), vec!["#8b5cf6"]);
        assert_eq!(
            forbidden_colors_in("fill: RGB( 139, 92 ,246 )"),
            vec!["rgb(139,92,246)"]
        );
        assert_eq!(forbidden_colors_in("a Purple haze"), vec!["purple"]);
        assert!(forbidden_colors_in("#0e7490 and teal").is_empty());
    }

    #[test]
    fn allowlist_matches_suffixes_not_substrings() {
        assert!(is_reputable("www.cdc.gov"));
        assert!(is_reputable("cdc.gov"));
        assert!(is_reputable("news.bbc.co.uk"));
        assert!(is_reputable("bbc.com"));
        assert!(is_reputable("mit.edu"));
        assert!(!is_reputable("notbbc.com"));
        assert!(!is_reputable("randomblog.example"));
        assert!(!is_reputable("gov.example.com"));
    }

    #[test]
    fn wikipedia_is_banned_on_every_subdomain() {
        assert!(is_banned_host("en.wikipedia.org"));
        assert!(is_banned_host("wikipedia.org"));
        assert!(!is_banned_host("wikipedia.org.example.com"));
        assert!(!is_banned_host("notwikipedia.org"));
    }
}
