//! Provider API keys.
//!
//! Research sessions, the extractor and the publish mirror all authenticate
//! with bearer tokens read from the environment. Keys stay inside a
//! `secrecy` box and are only unwrapped while a request header is built.

use secrecy::{ExposeSecret, SecretBox};
use std::fmt;

const REDACTED: &str = "[REDACTED]";

/// Bearer token for a provider. Prints as `[REDACTED]`.
pub struct SecretString(SecretBox<str>);

impl SecretString {
    pub fn new(value: impl Into<String>) -> Self {
        Self(SecretBox::new(value.into().into_boxed_str()))
    }

    /// The raw key, for request headers.
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }

    /// Whitespace-only keys count as unset.
    pub fn is_empty(&self) -> bool {
        self.expose().trim().is_empty()
    }
}

impl Clone for SecretString {
    fn clone(&self) -> Self {
        Self(SecretBox::new(self.expose().into()))
    }
}

impl fmt::Debug for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(REDACTED)
    }
}

impl fmt::Display for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(REDACTED)
    }
}

impl From<String> for SecretString {
    fn from(key: String) -> Self {
        Self::new(key)
    }
}

impl From<&str> for SecretString {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

/// Where one provider lives and which model it runs. The endpoint is kept
/// without a trailing slash so paths can be appended directly.
#[derive(Clone)]
pub struct ApiCredentials {
    pub api_key: SecretString,
    pub model: String,
    pub base_url: String,
}

impl ApiCredentials {
    pub fn new(
        api_key: impl Into<SecretString>,
        model: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            base_url: trim_endpoint(base_url.into()),
        }
    }

    /// Point at another deployment of the same API (a proxy or a mock
    /// server in tests).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = trim_endpoint(url.into());
        self
    }

    /// `Authorization` header value.
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.api_key.expose())
    }
}

fn trim_endpoint(url: String) -> String {
    url.trim_end_matches('/').to_string()
}

impl fmt::Debug for ApiCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiCredentials")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_key_never_prints() {
        let key = SecretString::new("sk-deep-research-key");
        assert_eq!(format!("{:?}", key), REDACTED);
        assert_eq!(key.to_string(), REDACTED);
        assert_eq!(key.expose(), "sk-deep-research-key");
        assert!(SecretString::from("  ").is_empty());
    }

    #[test]
    fn credentials_debug_hides_key() {
        let creds = ApiCredentials::new("pplx-secret", "sonar-deep-research", "https://api.perplexity.ai/");
        let debug = format!("{:?}", creds);
        assert!(!debug.contains("pplx-secret"));
        assert!(debug.contains("sonar-deep-research"));
        assert_eq!(creds.base_url, "https://api.perplexity.ai");
        assert_eq!(creds.bearer(), "Bearer pplx-secret");
    }
}
