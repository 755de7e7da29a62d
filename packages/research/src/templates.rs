//! Research prompt templates.
//!
//! A template is markdown with `{{topic}}` and `{{date}}` placeholders. Custom
//! templates live in `<dir>/<template_id>.md`; `fact-check` is compiled in.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;

use crate::error::{ResearchError, Result};

pub const DEFAULT_TEMPLATE_ID: &str = "fact-check";

const BUILTIN: &[(&str, &str)] = &[(DEFAULT_TEMPLATE_ID, include_str!("../templates/fact-check.md"))];

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{\s*([A-Za-z0-9_]+)\s*\}\}").expect("placeholder pattern is valid"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    pub id: String,
    pub body: String,
}

impl PromptTemplate {
    /// Parse a template, rejecting unknown placeholders and a missing `{{topic}}`.
    pub fn parse(id: impl Into<String>, body: impl Into<String>) -> Result<Self> {
        let id = id.into();
        let body = body.into();
        let mut has_topic = false;
        for caps in PLACEHOLDER.captures_iter(&body) {
            match &caps[1] {
                "topic" => has_topic = true,
                "date" => {}
                other => {
                    return Err(ResearchError::Template(format!(
                        "template '{}' uses unknown placeholder '{{{{{}}}}}'",
                        id, other
                    )))
                }
            }
        }
        if !has_topic {
            return Err(ResearchError::Template(format!(
                "template '{}' never mentions {{{{topic}}}}",
                id
            )));
        }
        Ok(Self { id, body })
    }

    pub fn render(&self, topic: &str, date: NaiveDate) -> String {
        let date = date.format("%B %-d, %Y").to_string();
        PLACEHOLDER
            .replace_all(&self.body, |caps: &regex::Captures<'_>| match &caps[1] {
                "topic" => topic.to_string(),
                _ => date.clone(),
            })
            .into_owned()
    }
}

/// Looks templates up on disk first, then among the built-ins.
#[derive(Debug, Clone, Default)]
pub struct TemplateLibrary {
    dir: Option<PathBuf>,
}

impl TemplateLibrary {
    pub fn builtin() -> Self {
        Self { dir: None }
    }

    pub fn with_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: Some(dir.into()),
        }
    }

    pub fn dir(&self) -> Option<&Path> {
        self.dir.as_deref()
    }

    pub fn load(&self, template_id: &str) -> Result<PromptTemplate> {
        if !report::schema::is_kebab_slug(template_id) {
            return Err(ResearchError::Config(format!(
                "template id '{}' must be lower-kebab-case",
                template_id
            )));
        }
        if let Some(dir) = &self.dir {
            let path = dir.join(format!("{}.md", template_id));
            if path.is_file() {
                let body = std::fs::read_to_string(&path)?;
                return PromptTemplate::parse(template_id, body);
            }
        }
        BUILTIN
            .iter()
            .find(|(id, _)| *id == template_id)
            .ok_or_else(|| ResearchError::Config(format!("unknown template '{}'", template_id)))
            .and_then(|(id, body)| PromptTemplate::parse(*id, *body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 2, 15).unwrap()
    }

    #[test]
    fn builtin_template_renders_topic_and_date() {
        let template = TemplateLibrary::builtin().load("fact-check").unwrap();
        let prompt = template.render("Flat earth resurgence", date());
        assert!(prompt.contains("**Flat earth resurgence**"));
        assert!(prompt.contains("February 15, 2026"));
        assert!(!prompt.contains("{{"));
    }

    #[test]
    fn unknown_placeholder_is_rejected() {
        let err = PromptTemplate::parse("x", "{{topic}} for {{audience}}").unwrap_err();
        assert!(err.to_string().contains("audience"));
    }

    #[test]
    fn topic_placeholder_is_required() {
        assert!(PromptTemplate::parse("x", "Research something on {{date}}").is_err());
    }

    #[test]
    fn disk_templates_override_builtins() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("fact-check.md"), "Check {{ topic }} now").unwrap();
        let template = TemplateLibrary::with_dir(dir.path()).load("fact-check").unwrap();
        assert_eq!(template.render("vaccines", date()), "Check vaccines now");
    }

    #[test]
    fn template_ids_cannot_escape_the_directory() {
        assert!(TemplateLibrary::builtin().load("../secrets").is_err());
        assert!(TemplateLibrary::builtin().load("missing").is_err());
    }
}
