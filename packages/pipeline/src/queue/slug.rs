//! Deterministic topic slugs: `<kebab name, at most 40 chars>-<YYYYMMDD>`.

use chrono::NaiveDate;

pub const MAX_SLUG_BASE_CHARS: usize = 40;

/// Lower-kebab-case form of `name`, cut to [`MAX_SLUG_BASE_CHARS`].
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    slug.truncate(MAX_SLUG_BASE_CHARS);
    slug.trim_end_matches('-').to_string()
}

/// Slug for a topic added on `date`. `None` when the name has no ASCII
/// letters or digits.
pub fn topic_slug(name: &str, date: NaiveDate) -> Option<String> {
    let base = slugify(name);
    if base.is_empty() {
        return None;
    }
    Some(format!("{}-{}", base, date.format("%Y%m%d")))
}
