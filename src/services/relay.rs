//! Text-in, text-out access to the chat-completion vendor.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;

/// Persona every relayed prompt is answered in.
pub const SYSTEM_PROMPT: &str = "你是一个温柔、克制、有边界的情绪陪伴 AI。\n\
你认真倾听，不评判、不说教、不做心理诊断。\n\
回复 80~150 字，使用自然中文。";

/// Sent back when the vendor answers without any content.
pub const EMPTY_REPLY: &str = "我在这儿，慢慢说也没关系。";

/// A chat-completion backend. `Ok(None)` means the vendor answered but
/// produced no text.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, system: &str, user: &str) -> anyhow::Result<Option<String>>;
}

/// OpenAI-compatible `/chat/completions` endpoint with bearer auth.
pub struct ChatCompletionsClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
    temperature: f32,
}

impl ChatCompletionsClient {
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.ai_timeout_secs))
            .build()?;

        if config.ai_api_key.is_empty() {
            tracing::warn!("DOUBAO_API_KEY not set, AI replies will use fallbacks");
        }

        Ok(Self {
            http,
            endpoint: config.ai_base_url.clone(),
            api_key: config.ai_api_key.clone(),
            model: config.ai_model.clone(),
            temperature: config.ai_temperature,
        })
    }
}

#[async_trait]
impl CompletionClient for ChatCompletionsClient {
    async fn complete(&self, system: &str, user: &str) -> anyhow::Result<Option<String>> {
        if self.api_key.is_empty() {
            anyhow::bail!("AI vendor not configured");
        }

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&serde_json::json!({
                "model": self.model,
                "messages": [
                    { "role": "system", "content": system },
                    { "role": "user", "content": user },
                ],
                "temperature": self.temperature,
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("AI vendor error {}: {}", status, body);
        }

        let body: serde_json::Value = response.json().await?;
        let text = body["choices"][0]["message"]["content"]
            .as_str()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string);

        Ok(text)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("Missing userInput")]
    MissingInput,

    #[error("AI failed: {0}")]
    Vendor(#[from] anyhow::Error),
}

/// Answers free-text prompts in the companion persona.
#[derive(Clone)]
pub struct Relay {
    client: Arc<dyn CompletionClient>,
}

impl Relay {
    pub fn new(client: Arc<dyn CompletionClient>) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &dyn CompletionClient {
        self.client.as_ref()
    }

    /// One round trip, no retry.
    pub async fn generate(&self, user_input: &str) -> Result<String, RelayError> {
        let input = user_input.trim();
        if input.is_empty() {
            return Err(RelayError::MissingInput);
        }

        match self.client.complete(SYSTEM_PROMPT, input).await {
            Ok(Some(text)) => Ok(text),
            Ok(None) => Ok(EMPTY_REPLY.to_string()),
            Err(e) => {
                tracing::warn!(error = %e, "AI relay call failed");
                Err(RelayError::Vendor(e))
            }
        }
    }
}
