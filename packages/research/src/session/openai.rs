//! Primary provider: OpenAI deep research via background Responses API jobs.
//!
//! The job's `status` is the "still researching" indicator (`queued` or
//! `in_progress`). Sources are the `url_citation` annotations on the output
//! text.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;

use super::http::ApiClient;
use super::{Link, Provider, Session, SessionFactory, PRIMARY_HARD_CAP};
use crate::error::{SessionError, SessionResult};
use crate::security::{ApiCredentials, SecretString};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "o3-deep-research";
const NAME: &str = "openai-deep-research";

/// Opens OpenAI deep-research sessions.
#[derive(Clone)]
pub struct OpenAIDeepResearch {
    api: ApiClient,
    provider: Provider,
    hard_cap: Duration,
}

impl OpenAIDeepResearch {
    pub fn new(api_key: impl Into<SecretString>) -> Self {
        Self::with_credentials(ApiCredentials::new(api_key, DEFAULT_MODEL, DEFAULT_BASE_URL))
    }

    pub fn with_credentials(credentials: ApiCredentials) -> Self {
        Self {
            api: ApiClient::new(NAME, credentials),
            provider: Provider::Primary,
            hard_cap: PRIMARY_HARD_CAP,
        }
    }

    /// Use this adapter in another pipeline slot.
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
impl SessionFactory for OpenAIDeepResearch {
    fn name(&self) -> &str {
        NAME
    }

    fn provider(&self) -> Provider {
        self.provider
    }

    fn home_domain(&self) -> &str {
        "openai.com"
    }

    fn hard_cap(&self) -> Duration {
        self.hard_cap
    }

    async fn open(&self, _headless: bool) -> SessionResult<Box<dyn Session>> {
        Ok(Box::new(OpenAISession {
            api: self.api.clone(),
            deep_research: false,
            response_id: None,
            latest: Value::Null,
        }))
    }
}

struct OpenAISession {
    api: ApiClient,
    deep_research: bool,
    response_id: Option<String>,
    latest: Value,
}

impl OpenAISession {
    fn response_id(&self) -> SessionResult<&str> {
        self.response_id
            .as_deref()
            .ok_or_else(|| SessionError::ElementNotFound("no response submitted yet".into()))
    }
}

#[async_trait]
impl Session for OpenAISession {
    async fn ensure_authenticated(&mut self) -> SessionResult<()> {
        let path = format!("/models/{}", self.api.model());
        let _: Value = self.api.get(&path).await?;
        Ok(())
    }

    async fn enable_deep_research(&mut self) -> SessionResult<()> {
        self.deep_research = true;
        Ok(())
    }

    async fn submit_prompt(&mut self, prompt: &str) -> SessionResult<()> {
        let tools = if self.deep_research {
            json!([{ "type": "web_search_preview" }])
        } else {
            json!([])
        };
        let body = json!({
            "model": self.api.model(),
            "input": prompt,
            "background": true,
            "tools": tools,
        });
        let response: Value = self.api.post("/responses", &body).await?;
        let id = response["id"]
            .as_str()
            .ok_or_else(|| SessionError::ElementNotFound("response id".into()))?;
        debug!(response_id = %id, "Deep research job submitted");
        self.response_id = Some(id.to_string());
        self.latest = response;
        Ok(())
    }

    async fn confirm_plan(&mut self) -> SessionResult<bool> {
        // Background jobs start immediately; there is no plan to approve.
        Ok(false)
    }

    async fn is_researching(&mut self) -> SessionResult<bool> {
        let path = format!("/responses/{}", self.response_id()?);
        self.latest = self.api.get(&path).await?;
        job_state(&self.latest)
    }

    async fn copy_response(&mut self) -> SessionResult<Option<String>> {
        Ok(output_text(&self.latest))
    }

    async fn last_turn_text(&mut self) -> SessionResult<String> {
        Ok(self.latest["output_text"]
            .as_str()
            .map(str::to_string)
            .or_else(|| output_text(&self.latest))
            .unwrap_or_default())
    }

    async fn links(&mut self) -> SessionResult<Vec<Link>> {
        Ok(citations(&self.latest))
    }

    fn session_url(&self) -> Option<String> {
        self.response_id
            .as_ref()
            .map(|id| self.api.url(&format!("/responses/{}", id)))
    }
}

/// `true` while the job is still running.
fn job_state(response: &Value) -> SessionResult<bool> {
    match response["status"].as_str() {
        Some("queued") | Some("in_progress") => Ok(true),
        Some("completed") => Ok(false),
        // An incomplete job still carries whatever text it produced.
        Some("incomplete") => Ok(false),
        Some(other) => {
            let reason = response["error"]["message"].as_str().unwrap_or("no reason given");
            Err(SessionError::Provider(format!("job {}: {}", other, reason)))
        }
        None => Err(SessionError::ElementNotFound("response status".into())),
    }
}

fn output_parts(response: &Value) -> impl Iterator<Item = &Value> {
    response["output"]
        .as_array()
        .into_iter()
        .flatten()
        .filter(|item| item["type"] == "message")
        .flat_map(|item| item["content"].as_array().into_iter().flatten())
        .filter(|part| part["type"] == "output_text")
}

fn output_text(response: &Value) -> Option<String> {
    let text: Vec<&str> = output_parts(response)
        .filter_map(|part| part["text"].as_str())
        .collect();
    if text.is_empty() {
        None
    } else {
        Some(text.join("\n\n"))
    }
}

fn citations(response: &Value) -> Vec<Link> {
    output_parts(response)
        .flat_map(|part| part["annotations"].as_array().into_iter().flatten())
        .filter(|a| a["type"] == "url_citation")
        .filter_map(|a| {
            let url = a["url"].as_str()?;
            Some(Link::new(url, a["title"].as_str().unwrap_or_default()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn finished() -> Value {
        json!({
            "id": "resp_123",
            "status": "completed",
            "output": [
                { "type": "web_search_call", "status": "completed" },
                {
                    "type": "message",
                    "content": [{
                        "type": "output_text",
                        "text": "Verdict: FALSE\nThe Earth is round.",
                        "annotations": [
                            { "type": "url_citation", "url": "https://www.nasa.gov/x", "title": "NASA" },
                            { "type": "file_citation", "file_id": "f1" },
                            { "type": "url_citation", "url": "https://help.openai.com/y" }
                        ]
                    }]
                }
            ]
        })
    }

    #[test]
    fn status_maps_to_researching_indicator() {
        assert!(job_state(&json!({"status": "queued"})).unwrap());
        assert!(job_state(&json!({"status": "in_progress"})).unwrap());
        assert!(!job_state(&finished()).unwrap());
        assert!(matches!(
            job_state(&json!({"status": "failed", "error": {"message": "boom"}})),
            Err(SessionError::Provider(msg)) if msg.contains("boom")
        ));
    }

    #[test]
    fn reads_text_and_citations() {
        let response = finished();
        assert_eq!(
            output_text(&response).as_deref(),
            Some("Verdict: FALSE\nThe Earth is round.")
        );
        let links = citations(&response);
        assert_eq!(links.len(), 2);
        assert_eq!(links[0], Link::new("https://www.nasa.gov/x", "NASA"));
    }

    #[test]
    fn missing_output_is_none() {
        assert_eq!(output_text(&json!({"status": "in_progress"})), None);
    }
}
