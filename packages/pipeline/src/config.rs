//! Pipeline configuration.
//!
//! Settings come from an optional `factdesk.toml`; every field has a default,
//! so an empty or missing file is a working configuration. Credentials come
//! from the environment (a `.env` file is loaded first) and are only required
//! when the capability that needs them is used.

use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use research::driver::MIN_POLL_INTERVAL;
use research::{PollSettings, SecretString, DEFAULT_TEMPLATE_ID};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{PipelineError, Result};

pub const DEFAULT_CONFIG_PATH: &str = "factdesk.toml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub paths: PathsConfig,
    pub research: ResearchConfig,
    pub extraction: ExtractionConfig,
    pub validation: ValidationConfig,
    pub publish: PublishConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PathsConfig {
    pub queue: PathBuf,
    /// Per-slug research and report artifacts
    pub artifacts: PathBuf,
    /// Where published `<slug>.html` files go
    pub site_reports: PathBuf,
    pub site_index: PathBuf,
    /// Custom prompt templates (`<id>.md`)
    pub templates: PathBuf,
    /// Run lock and other process state
    pub state: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            queue: PathBuf::from("data/queue.json"),
            artifacts: PathBuf::from("output"),
            site_reports: PathBuf::from("site/reports"),
            site_index: PathBuf::from("site/reports/index.json"),
            templates: PathBuf::from("templates"),
            state: PathBuf::from("data"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResearchConfig {
    pub primary_deadline_mins: u64,
    pub fallback_deadline_mins: u64,
    pub poll_interval_secs: u64,
    pub settle_polls: u32,
    pub max_session_retries: u32,
    pub default_template: String,
    pub headless: bool,
    pub primary_model: Option<String>,
    pub fallback_model: Option<String>,
}

impl Default for ResearchConfig {
    fn default() -> Self {
        Self {
            primary_deadline_mins: 60,
            fallback_deadline_mins: 30,
            poll_interval_secs: MIN_POLL_INTERVAL.as_secs(),
            settle_polls: 1,
            max_session_retries: research::driver::MAX_SESSION_RETRIES,
            default_template: DEFAULT_TEMPLATE_ID.to_string(),
            headless: true,
            primary_model: None,
            fallback_model: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExtractionConfig {
    pub model: String,
    pub max_raw_chars: usize,
    pub deadline_mins: u64,
    /// Extra attempts after a provider error. Parse and schema failures are
    /// never retried.
    pub stage_retries: u32,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            model: research::ai::DEFAULT_MODEL.to_string(),
            max_raw_chars: research::extract::DEFAULT_MAX_RAW_CHARS,
            deadline_mins: 10,
            stage_retries: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ValidationConfig {
    pub link_check: bool,
    pub link_timeout_secs: u64,
    /// Defaults to the report's source count.
    pub max_parallel_links: Option<usize>,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            link_check: true,
            link_timeout_secs: report::validate::LINK_CHECK_DEADLINE.as_secs(),
            max_parallel_links: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PublishConfig {
    /// Commit each report on a `report/<slug>` branch
    pub git_commit: bool,
    pub repo_root: PathBuf,
    /// Also push to the blob store and KV index
    pub mirror: bool,
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            git_commit: false,
            repo_root: PathBuf::from("."),
            mirror: false,
        }
    }
}

impl Config {
    /// Load `path`, or `factdesk.toml` when `None`. An explicit path must
    /// exist; the default one may be absent.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (path, required) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_PATH), false),
        };
        let text = match std::fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound && !required => {
                return Ok(Self::default().normalized())
            }
            Err(e) => {
                return Err(PipelineError::Config(format!(
                    "cannot read {}: {}",
                    path.display(),
                    e
                )))
            }
        };
        Self::from_toml_str(&text)
            .map_err(|e| PipelineError::Config(format!("{}: {}", path.display(), e)))
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Config =
            toml::from_str(text).map_err(|e| PipelineError::Config(e.to_string()))?;
        Ok(config.normalized())
    }

    fn normalized(mut self) -> Self {
        let min = MIN_POLL_INTERVAL.as_secs();
        if self.research.poll_interval_secs < min {
            warn!(
                configured = self.research.poll_interval_secs,
                min, "Poll interval below minimum, clamping"
            );
            self.research.poll_interval_secs = min;
        }
        self.research.settle_polls = self.research.settle_polls.max(1);
        self
    }

    pub fn primary_deadline(&self) -> Duration {
        Duration::from_secs(self.research.primary_deadline_mins * 60)
    }

    pub fn fallback_deadline(&self) -> Duration {
        Duration::from_secs(self.research.fallback_deadline_mins * 60)
    }

    pub fn extraction_deadline(&self) -> Duration {
        Duration::from_secs(self.extraction.deadline_mins * 60)
    }

    pub fn poll_settings(&self) -> PollSettings {
        PollSettings {
            interval: Duration::from_secs(self.research.poll_interval_secs),
            settle_polls: self.research.settle_polls,
            max_session_retries: self.research.max_session_retries,
            ..PollSettings::default()
        }
    }

    /// The run lock lives in the state directory.
    pub fn run_lock_path(&self) -> PathBuf {
        self.paths.state.join("pipeline.lock")
    }
}

/// Something the pipeline does that needs a credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    PrimaryResearch,
    FallbackResearch,
    Extraction,
    BlobStore,
    KvStore,
}

impl Capability {
    pub fn env_var(&self) -> &'static str {
        match self {
            Capability::PrimaryResearch => "OPENAI_API_KEY",
            Capability::FallbackResearch => "PERPLEXITY_API_KEY",
            Capability::Extraction => "EXTRACTOR_API_KEY",
            Capability::BlobStore => "BLOB_READ_WRITE_TOKEN",
            Capability::KvStore => "KV_REST_API_TOKEN",
        }
    }

    fn describe(&self) -> &'static str {
        match self {
            Capability::PrimaryResearch => "primary research",
            Capability::FallbackResearch => "fallback research",
            Capability::Extraction => "extraction",
            Capability::BlobStore => "blob store mirror",
            Capability::KvStore => "KV index mirror",
        }
    }

    /// Error for using this capability without its credential.
    pub fn missing(&self) -> PipelineError {
        let hint = match self {
            Capability::Extraction => " (or OPENAI_API_KEY)",
            Capability::KvStore => " and KV_REST_API_URL",
            _ => "",
        };
        PipelineError::Config(format!(
            "{} needs {}{} to be set",
            self.describe(),
            self.env_var(),
            hint
        ))
    }
}

/// API credentials, redacted in `Debug`.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub openai_api_key: Option<SecretString>,
    pub perplexity_api_key: Option<SecretString>,
    pub extractor_api_key: Option<SecretString>,
    pub blob_token: Option<SecretString>,
    pub kv_url: Option<String>,
    pub kv_token: Option<SecretString>,
    pub notify_webhook_url: Option<String>,
}

impl Credentials {
    /// Load `.env` if present, then read the process environment.
    pub fn from_env() -> Self {
        // Load .env file if present (development)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build from any variable lookup. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let secret = |name: &str| var(name).map(SecretString::from);

        let openai_api_key = secret("OPENAI_API_KEY");
        let extractor_api_key = secret("EXTRACTOR_API_KEY").or_else(|| openai_api_key.clone());
        Self {
            openai_api_key,
            perplexity_api_key: secret("PERPLEXITY_API_KEY"),
            extractor_api_key,
            blob_token: secret("BLOB_READ_WRITE_TOKEN"),
            kv_url: var("KV_REST_API_URL"),
            kv_token: secret("KV_REST_API_TOKEN"),
            notify_webhook_url: var("NOTIFY_WEBHOOK_URL"),
        }
    }

    /// The credential for `capability`, or a config error naming the variable.
    pub fn require(&self, capability: Capability) -> Result<&SecretString> {
        let found = match capability {
            Capability::PrimaryResearch => self.openai_api_key.as_ref(),
            Capability::FallbackResearch => self.perplexity_api_key.as_ref(),
            Capability::Extraction => self.extractor_api_key.as_ref(),
            Capability::BlobStore => self.blob_token.as_ref(),
            Capability::KvStore => self.kv_token.as_ref().filter(|_| self.kv_url.is_some()),
        };
        found.ok_or_else(|| capability.missing())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn empty_file_is_all_defaults() {
        let config = Config::from_toml_str("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.primary_deadline(), Duration::from_secs(3600));
        assert_eq!(config.fallback_deadline(), Duration::from_secs(1800));
        assert_eq!(config.extraction_deadline(), Duration::from_secs(600));
        assert!(config.validation.link_check);
    }

    #[test]
    fn sections_override_defaults() {
        let config = Config::from_toml_str(
            r#"
            [paths]
            queue = "q.json"

            [research]
            primary_deadline_mins = 45
            primary_model = "o4-mini-deep-research"

            [validation]
            link_check = false
            max_parallel_links = 4
            "#,
        )
        .unwrap();
        assert_eq!(config.paths.queue, PathBuf::from("q.json"));
        assert_eq!(config.paths.artifacts, PathBuf::from("output"));
        assert_eq!(config.primary_deadline(), Duration::from_secs(45 * 60));
        assert_eq!(config.research.primary_model.as_deref(), Some("o4-mini-deep-research"));
        assert!(!config.validation.link_check);
        assert_eq!(config.validation.max_parallel_links, Some(4));
    }

    #[test]
    fn poll_interval_is_clamped() {
        let config = Config::from_toml_str("[research]\npoll_interval_secs = 5\n").unwrap();
        assert_eq!(config.poll_settings().interval, MIN_POLL_INTERVAL);
    }

    #[test]
    fn unknown_keys_are_config_errors() {
        assert!(matches!(
            Config::from_toml_str("[research]\npoll_every = 5\n"),
            Err(PipelineError::Config(_))
        ));
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Config::load(Some(&dir.path().join("nope.toml"))).is_err());
    }

    #[test]
    fn extractor_key_falls_back_to_openai() {
        let creds = Credentials::from_lookup(lookup(&[("OPENAI_API_KEY", "sk-1")]));
        assert_eq!(creds.require(Capability::Extraction).unwrap().expose(), "sk-1");

        let creds = Credentials::from_lookup(lookup(&[
            ("OPENAI_API_KEY", "sk-1"),
            ("EXTRACTOR_API_KEY", "sk-2"),
        ]));
        assert_eq!(creds.require(Capability::Extraction).unwrap().expose(), "sk-2");
    }

    #[test]
    fn missing_credentials_name_the_variable() {
        let creds = Credentials::from_lookup(lookup(&[("PERPLEXITY_API_KEY", "  ")]));
        let err = creds.require(Capability::FallbackResearch).unwrap_err();
        assert!(err.to_string().contains("PERPLEXITY_API_KEY"));

        let creds = Credentials::from_lookup(lookup(&[("KV_REST_API_TOKEN", "t")]));
        assert!(creds.require(Capability::KvStore).is_err());
    }

    #[test]
    fn debug_output_is_redacted() {
        let creds = Credentials::from_lookup(lookup(&[("OPENAI_API_KEY", "sk-very-secret")]));
        assert!(!format!("{:?}", creds).contains("sk-very-secret"));
    }
}
