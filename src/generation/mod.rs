//! Chat-completion provider abstraction used by the query planner.
//!
//! Mirrors the embedding adapter: a narrow trait for tests plus an HTTP client for
//! any endpoint speaking the OpenAI `/chat/completions` wire shape. Temperature is
//! pinned low because planner output is parsed, not read.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;

use crate::config::get_config;

/// Errors raised by generation providers.
#[derive(Debug, Error)]
pub enum GenerationClientError {
    /// Provider could not be reached at all.
    #[error("Generation provider unavailable: {0}")]
    ProviderUnavailable(String),
    /// Provider answered with an error status.
    #[error("Failed to generate completion: {0}")]
    GenerationFailed(String),
    /// Provider response could not be parsed.
    #[error("Malformed generation response: {0}")]
    InvalidResponse(String),
}

/// Interface implemented by chat-completion backends.
#[async_trait]
pub trait GenerationClient {
    /// Run one system+user exchange and return the assistant text.
    async fn generate(
        &self,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<String, GenerationClientError>;
}

/// Build a generation client for the configured provider endpoint.
pub fn get_generation_client() -> Box<dyn GenerationClient + Send + Sync> {
    let config = get_config();
    Box::new(OpenAiChatClient::new(
        config.openai_base_url.clone(),
        config.openai_api_key.clone(),
        config.generation_model.clone(),
    ))
}

/// Client for the OpenAI-compatible `/chat/completions` endpoint.
pub struct OpenAiChatClient {
    http: Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
}

impl OpenAiChatClient {
    /// Create a client for `base_url`, attaching a bearer token when `api_key` is set.
    pub fn new(base_url: String, api_key: Option<String>, model: String) -> Self {
        let http = Client::builder()
            .user_agent("finkb/generation")
            .build()
            .expect("Failed to construct reqwest::Client for generation");
        Self {
            http,
            base_url,
            api_key,
            model,
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

#[async_trait]
impl GenerationClient for OpenAiChatClient {
    async fn generate(
        &self,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<String, GenerationClientError> {
        let payload = json!({
            "model": self.model,
            "temperature": 0.1,
            "messages": [
                {"role": "system", "content": system_prompt},
                {"role": "user", "content": user_prompt},
            ],
        });

        let mut request = self.http.post(self.endpoint()).json(&payload);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(|error| {
            GenerationClientError::ProviderUnavailable(format!(
                "failed to reach generation endpoint {}: {error}",
                self.endpoint()
            ))
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(GenerationClientError::GenerationFailed(format!(
                "generation endpoint returned {status}: {body}"
            )));
        }

        let body: ChatResponse = response.json().await.map_err(|error| {
            GenerationClientError::InvalidResponse(format!(
                "failed to decode generation response: {error}"
            ))
        })?;

        let content = body
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| {
                GenerationClientError::InvalidResponse(
                    "generation response held no assistant content".into(),
                )
            })?;

        Ok(content.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::{Method::POST, MockServer};

    fn client_for(server: &MockServer) -> OpenAiChatClient {
        OpenAiChatClient::new(server.base_url(), Some("test-key".into()), "test-chat".into())
    }

    #[tokio::test]
    async fn returns_first_choice_content() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/chat/completions")
                    .header("authorization", "Bearer test-key");
                then.status(200).json_body(json!({
                    "choices": [
                        {"message": {"content": "  {\"language\": \"English\"}  "}}
                    ]
                }));
            })
            .await;

        let content = client_for(&server)
            .generate("system", "user")
            .await
            .expect("completion");

        mock.assert();
        assert_eq!(content, "{\"language\": \"English\"}");
    }

    #[tokio::test]
    async fn rejects_empty_choices() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/chat/completions");
                then.status(200).json_body(json!({"choices": []}));
            })
            .await;

        let error = client_for(&server)
            .generate("system", "user")
            .await
            .expect_err("no choices");

        assert!(matches!(error, GenerationClientError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn rejects_null_content() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/chat/completions");
                then.status(200).json_body(json!({
                    "choices": [{"message": {"content": null}}]
                }));
            })
            .await;

        let error = client_for(&server)
            .generate("system", "user")
            .await
            .expect_err("null content");

        assert!(matches!(error, GenerationClientError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn surfaces_provider_error_status() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/chat/completions");
                then.status(429).body("slow down");
            })
            .await;

        let error = client_for(&server)
            .generate("system", "user")
            .await
            .expect_err("error status");

        assert!(
            matches!(error, GenerationClientError::GenerationFailed(message) if message.contains("429"))
        );
    }
}
