//! JSON-over-HTTP plumbing shared by the provider adapters.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::{de::DeserializeOwned, Serialize};

use crate::error::{SessionError, SessionResult};
use crate::security::ApiCredentials;

#[derive(Clone)]
pub(crate) struct ApiClient {
    client: Client,
    credentials: ApiCredentials,
    provider: String,
}

impl ApiClient {
    pub(crate) fn new(provider: impl Into<String>, credentials: ApiCredentials) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            client,
            credentials,
            provider: provider.into(),
        }
    }

    pub(crate) fn model(&self) -> &str {
        &self.credentials.model
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}{}", self.credentials.base_url, path)
    }

    pub(crate) async fn get<T: DeserializeOwned>(&self, path: &str) -> SessionResult<T> {
        let response = self
            .client
            .get(self.url(path))
            .header("Authorization", self.credentials.bearer())
            .send()
            .await
            .map_err(|e| SessionError::Transport(e.to_string()))?;
        self.decode(path, response).await
    }

    pub(crate) async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> SessionResult<T> {
        let response = self
            .client
            .post(self.url(path))
            .header("Authorization", self.credentials.bearer())
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| SessionError::Transport(e.to_string()))?;
        self.decode(path, response).await
    }

    async fn decode<T: DeserializeOwned>(
        &self,
        path: &str,
        response: reqwest::Response,
    ) -> SessionResult<T> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(self.status_error(path, status, &body));
        }
        response
            .json()
            .await
            .map_err(|e| SessionError::ElementNotFound(format!("{} response from {}: {}", self.provider, path, e)))
    }

    fn status_error(&self, path: &str, status: StatusCode, body: &str) -> SessionError {
        let body: String = body.chars().take(300).collect();
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => SessionError::NotAuthenticated {
                provider: self.provider.clone(),
            },
            StatusCode::NOT_FOUND => {
                SessionError::Navigation(format!("{} {} not found", self.provider, path))
            }
            StatusCode::TOO_MANY_REQUESTS => {
                SessionError::Transport(format!("{} rate limited: {}", self.provider, body))
            }
            s if s.is_server_error() => {
                SessionError::Transport(format!("{} returned {}: {}", self.provider, s, body))
            }
            s => SessionError::Provider(format!("{} returned {}: {}", self.provider, s, body)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> ApiClient {
        ApiClient::new("openai", ApiCredentials::new("k", "m", "https://api.example/v1"))
    }

    #[test]
    fn status_codes_map_to_session_errors() {
        let c = client();
        assert!(matches!(
            c.status_error("/x", StatusCode::UNAUTHORIZED, ""),
            SessionError::NotAuthenticated { .. }
        ));
        assert!(c.status_error("/x", StatusCode::BAD_GATEWAY, "").is_transient());
        assert!(c.status_error("/x", StatusCode::TOO_MANY_REQUESTS, "").is_transient());
        assert!(!c.status_error("/x", StatusCode::BAD_REQUEST, "").is_transient());
    }

    #[test]
    fn urls_join_base_and_path() {
        assert_eq!(client().url("/responses"), "https://api.example/v1/responses");
    }
}
