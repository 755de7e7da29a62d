//! Free-form text to JSON provider.
//!
//! The extraction driver only needs one capability: send a prompt, get text
//! back. [`OpenAIChat`] is the production implementation; tests use
//! [`crate::testing::MockAI`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::{ExtractionError, ExtractionResult};
use crate::security::{ApiCredentials, SecretString};

#[async_trait]
pub trait AI: Send + Sync {
    /// Single-turn completion.
    async fn complete(&self, prompt: &str) -> ExtractionResult<String>;

    /// Model identifier, for logs.
    fn model(&self) -> &str;
}

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o";

const SYSTEM_PROMPT: &str = "You convert research notes into structured fact-check records. \
Respond with a single JSON object and no other text.";

/// OpenAI chat completions, temperature 0, JSON object response format.
#[derive(Clone)]
pub struct OpenAIChat {
    client: Client,
    credentials: ApiCredentials,
}

impl OpenAIChat {
    pub fn new(api_key: impl Into<SecretString>) -> Self {
        Self::with_credentials(ApiCredentials::new(api_key, DEFAULT_MODEL, DEFAULT_BASE_URL))
    }

    pub fn with_credentials(credentials: ApiCredentials) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(300))
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            client,
            credentials,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.credentials.model = model.into();
        self
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    response_format: ResponseFormat,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[async_trait]
impl AI for OpenAIChat {
    async fn complete(&self, prompt: &str) -> ExtractionResult<String> {
        let request = ChatRequest {
            model: &self.credentials.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            temperature: 0.0,
            response_format: ResponseFormat {
                format_type: "json_object",
            },
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.credentials.base_url))
            .header("Authorization", self.credentials.bearer())
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| ExtractionError::Provider(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(ExtractionError::Provider(format!(
                "OpenAI API error {}: {}",
                status, error_text
            )));
        }

        let chat: ChatResponse = response
            .json()
            .await
            .map_err(|e| ExtractionError::Provider(e.to_string()))?;

        chat.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|text| !text.trim().is_empty())
            .ok_or_else(|| ExtractionError::Provider("No response from OpenAI".into()))
    }

    fn model(&self) -> &str {
        &self.credentials.model
    }
}
