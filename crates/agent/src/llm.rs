//! Completion-service clients.
//!
//! `LlmClient` is the seam the completion loop drives; `GeminiClient` is
//! the production implementation over the generateContent endpoint, and
//! `DemoClient` serves canned answers when no API key is configured.

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;

use analyst_core::config::LlmConfig;

use crate::catalog::{self, ToolDescriptor};
use crate::prompts;
use crate::transcript::{Part, Turn, TurnRole};

#[derive(Debug, Error)]
pub enum LlmError {
    /// Non-2xx from the completion service. Fatal to the invocation; the
    /// loop turns it into user-facing text.
    #[error("LLM service returned status {status}: {body}")]
    Http { status: u16, body: String },
    /// Timeout, connection failure, or an unparseable payload.
    #[error("LLM transport failure: {0}")]
    Transport(String),
}

/// Parsed completion response. Candidates may be empty when the upstream
/// payload was structurally missing; the loop owns that diagnostic.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ModelReply {
    #[serde(default)]
    pub candidates: Vec<ReplyCandidate>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct ReplyCandidate {
    #[serde(default)]
    pub content: ReplyContent,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct ReplyContent {
    #[serde(default)]
    pub parts: Vec<Part>,
}

impl ModelReply {
    /// Convenience for tests and the demo client.
    pub fn with_parts(parts: Vec<Part>) -> Self {
        Self { candidates: vec![ReplyCandidate { content: ReplyContent { parts } }] }
    }
}

#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn generate(
        &self,
        transcript: &[Turn],
        tools: &[ToolDescriptor],
    ) -> Result<ModelReply, LlmError>;
}

/// HTTP client for the Gemini generateContent endpoint.
pub struct GeminiClient {
    http: Client,
    base_url: String,
    model: String,
    api_key: SecretString,
}

impl GeminiClient {
    pub fn new(config: &LlmConfig, api_key: SecretString) -> Result<Self, reqwest::Error> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key,
        })
    }
}

#[async_trait]
impl LlmClient for GeminiClient {
    async fn generate(
        &self,
        transcript: &[Turn],
        tools: &[ToolDescriptor],
    ) -> Result<ModelReply, LlmError> {
        let url = format!("{}/v1beta/models/{}:generateContent", self.base_url, self.model);
        let payload = json!({
            "contents": transcript,
            "tools": catalog::tools_payload(tools),
        });

        let response = self
            .http
            .post(&url)
            .header("X-goog-api-key", self.api_key.expose_secret())
            .json(&payload)
            .send()
            .await
            .map_err(|error| LlmError::Transport(error.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Http { status: status.as_u16(), body });
        }

        response
            .json::<ModelReply>()
            .await
            .map_err(|error| LlmError::Transport(error.to_string()))
    }
}

/// Keyless fallback: answers every request with the demo template wrapped
/// around the latest user text, so the rest of the pipeline stays live
/// without an upstream dependency.
pub struct DemoClient;

fn last_user_text(transcript: &[Turn]) -> String {
    transcript
        .iter()
        .rev()
        .find(|turn| turn.role == TurnRole::User)
        .map(|turn| {
            turn.parts
                .iter()
                .filter_map(|part| match part {
                    Part::Text(text) => Some(text.as_str()),
                    _ => None,
                })
                .collect::<Vec<_>>()
                .join(" ")
        })
        .unwrap_or_default()
}

#[async_trait]
impl LlmClient for DemoClient {
    async fn generate(
        &self,
        transcript: &[Turn],
        _tools: &[ToolDescriptor],
    ) -> Result<ModelReply, LlmError> {
        let user_message = last_user_text(transcript);
        Ok(ModelReply::with_parts(vec![Part::Text(prompts::demo_response(&user_message))]))
    }
}
