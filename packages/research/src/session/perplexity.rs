//! Fallback provider: Perplexity deep research via async chat completions.
//!
//! Jobs report `CREATED` or `IN_PROGRESS` while researching. Sources come from
//! `search_results`, with bare `citations` urls as a fallback.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;

use super::http::ApiClient;
use super::{Link, Provider, Session, SessionFactory, FALLBACK_HARD_CAP};
use crate::error::{SessionError, SessionResult};
use crate::security::{ApiCredentials, SecretString};

pub const DEFAULT_BASE_URL: &str = "https://api.perplexity.ai";
pub const DEFAULT_MODEL: &str = "sonar-deep-research";
const NAME: &str = "perplexity-deep-research";

#[derive(Clone)]
pub struct PerplexityDeepResearch {
    api: ApiClient,
    provider: Provider,
    hard_cap: Duration,
}

impl PerplexityDeepResearch {
    pub fn new(api_key: impl Into<SecretString>) -> Self {
        Self::with_credentials(ApiCredentials::new(api_key, DEFAULT_MODEL, DEFAULT_BASE_URL))
    }

    pub fn with_credentials(credentials: ApiCredentials) -> Self {
        Self {
            api: ApiClient::new(NAME, credentials),
            provider: Provider::Fallback,
            hard_cap: FALLBACK_HARD_CAP,
        }
    }

    pub fn as_provider(mut self, provider: Provider) -> Self {
        self.provider = provider;
        self
    }

    pub fn with_hard_cap(mut self, hard_cap: Duration) -> Self {
        self.hard_cap = hard_cap;
        self
    }
}

#[async_trait]
impl SessionFactory for PerplexityDeepResearch {
    fn name(&self) -> &str {
        NAME
    }

    fn provider(&self) -> Provider {
        self.provider
    }

    fn home_domain(&self) -> &str {
        "perplexity.ai"
    }

    fn hard_cap(&self) -> Duration {
        self.hard_cap
    }

    async fn open(&self, _headless: bool) -> SessionResult<Box<dyn Session>> {
        Ok(Box::new(PerplexitySession {
            api: self.api.clone(),
            reasoning_effort: "medium",
            request_id: None,
            latest: Value::Null,
        }))
    }
}

struct PerplexitySession {
    api: ApiClient,
    reasoning_effort: &'static str,
    request_id: Option<String>,
    latest: Value,
}

#[async_trait]
impl Session for PerplexitySession {
    async fn ensure_authenticated(&mut self) -> SessionResult<()> {
        let _: Value = self.api.get("/async/chat/completions").await?;
        Ok(())
    }

    async fn enable_deep_research(&mut self) -> SessionResult<()> {
        self.reasoning_effort = "high";
        Ok(())
    }

    async fn submit_prompt(&mut self, prompt: &str) -> SessionResult<()> {
        let body = json!({
            "request": {
                "model": self.api.model(),
                "messages": [{ "role": "user", "content": prompt }],
                "reasoning_effort": self.reasoning_effort,
            }
        });
        let response: Value = self.api.post("/async/chat/completions", &body).await?;
        let id = response["id"]
            .as_str()
            .ok_or_else(|| SessionError::ElementNotFound("request id".into()))?;
        debug!(request_id = %id, "Deep research job submitted");
        self.request_id = Some(id.to_string());
        self.latest = response;
        Ok(())
    }

    async fn confirm_plan(&mut self) -> SessionResult<bool> {
        Ok(false)
    }

    async fn is_researching(&mut self) -> SessionResult<bool> {
        let id = self
            .request_id
            .as_deref()
            .ok_or_else(|| SessionError::ElementNotFound("no request submitted yet".into()))?;
        self.latest = self.api.get(&format!("/async/chat/completions/{}", id)).await?;
        job_state(&self.latest)
    }

    async fn copy_response(&mut self) -> SessionResult<Option<String>> {
        Ok(message_content(&self.latest))
    }

    async fn last_turn_text(&mut self) -> SessionResult<String> {
        Ok(message_content(&self.latest).unwrap_or_default())
    }

    async fn links(&mut self) -> SessionResult<Vec<Link>> {
        Ok(search_results(&self.latest))
    }

    fn session_url(&self) -> Option<String> {
        self.request_id
            .as_ref()
            .map(|id| self.api.url(&format!("/async/chat/completions/{}", id)))
    }
}

fn job_state(response: &Value) -> SessionResult<bool> {
    match response["status"].as_str() {
        Some("CREATED") | Some("IN_PROGRESS") => Ok(true),
        Some("COMPLETED") => Ok(false),
        Some(other) => {
            let reason = response["error_message"].as_str().unwrap_or("no reason given");
            Err(SessionError::Provider(format!("job {}: {}", other, reason)))
        }
        None => Err(SessionError::ElementNotFound("job status".into())),
    }
}

fn completion(response: &Value) -> &Value {
    &response["response"]
}

fn message_content(response: &Value) -> Option<String> {
    completion(response)["choices"][0]["message"]["content"]
        .as_str()
        .map(strip_reasoning)
        .filter(|text| !text.trim().is_empty())
}

/// Deep-research answers open with a `<think>` block that is not part of the
/// report.
fn strip_reasoning(text: &str) -> String {
    match (text.find("<think>"), text.find("</think>")) {
        (Some(start), Some(end)) if start < end => {
            let mut out = String::with_capacity(text.len());
            out.push_str(&text[..start]);
            out.push_str(&text[end + "</think>".len()..]);
            out.trim().to_string()
        }
        _ => text.trim().to_string(),
    }
}

fn search_results(response: &Value) -> Vec<Link> {
    let body = completion(response);
    let results: Vec<Link> = body["search_results"]
        .as_array()
        .into_iter()
        .flatten()
        .filter_map(|r| {
            let url = r["url"].as_str()?;
            Some(Link::new(url, r["title"].as_str().unwrap_or_default()))
        })
        .collect();
    if !results.is_empty() {
        return results;
    }
    body["citations"]
        .as_array()
        .into_iter()
        .flatten()
        .filter_map(Value::as_str)
        .map(|url| Link::new(url, ""))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn finished() -> Value {
        json!({
            "id": "req_1",
            "status": "COMPLETED",
            "response": {
                "choices": [{ "message": { "role": "assistant",
                    "content": "<think>plan the search</think>\n## Findings\nVerdict: MIXED" } }],
                "search_results": [
                    { "title": "CDC", "url": "https://www.cdc.gov/a" },
                    { "title": "Perplexity", "url": "https://www.perplexity.ai/hub" }
                ]
            }
        })
    }

    #[test]
    fn status_maps_to_researching_indicator() {
        assert!(job_state(&json!({"status": "CREATED"})).unwrap());
        assert!(job_state(&json!({"status": "IN_PROGRESS"})).unwrap());
        assert!(!job_state(&finished()).unwrap());
        assert!(job_state(&json!({"status": "FAILED"})).is_err());
    }

    #[test]
    fn drops_reasoning_block() {
        assert_eq!(
            message_content(&finished()).as_deref(),
            Some("## Findings\nVerdict: MIXED")
        );
    }

    #[test]
    fn falls_back_to_bare_citations() {
        let response = json!({
            "response": { "citations": ["https://a.example/1", "https://b.example/2"] }
        });
        let links = search_results(&response);
        assert_eq!(links.len(), 2);
        assert_eq!(links[1].url, "https://b.example/2");
        assert_eq!(search_results(&finished()).len(), 2);
    }
}
