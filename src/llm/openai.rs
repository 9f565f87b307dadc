//! OpenAI API client implementation.
//!
//! Calls the chat completions endpoint with the prompt as a single user
//! message, mirroring how the Gemini backend treats the prompt as one blob.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Value, json};

use crate::config::LlmSettings;
use crate::error::{PigenError, Result};
use crate::llm::client::LlmClient;

/// OpenAI chat completions URL.
const OPENAI_API_URL: &str = "https://api.openai.com/v1/chat/completions";

/// Default request timeout.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Configuration for the OpenAI client.
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub model: String,
    pub timeout: Duration,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            model: crate::config::DEFAULT_OPENAI_MODEL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// OpenAI API client.
pub struct OpenAiClient {
    client: Client,
    api_key: String,
    config: OpenAiConfig,
}

impl OpenAiClient {
    /// Create a client from resolved settings.
    pub fn new(settings: &LlmSettings) -> Result<Self> {
        let config = OpenAiConfig {
            model: settings.model.clone(),
            ..Default::default()
        };
        Self::with_api_key(settings.api_key.clone(), config)
    }

    /// Create a client with an explicit API key.
    pub fn with_api_key(api_key: String, config: OpenAiConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| PigenError::Llm(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key,
            config,
        })
    }

    /// Build the chat completions request body.
    fn build_request(&self, prompt: &str, temperature: f32, max_tokens: u32) -> Value {
        json!({
            "model": self.config.model,
            "messages": [
                {"role": "user", "content": prompt}
            ],
            "temperature": temperature,
            "max_tokens": max_tokens
        })
    }

    /// Extract the completion text from a chat completions response.
    fn parse_response(response: &Value) -> Result<String> {
        let content = response
            .get("choices")
            .and_then(|c| c.get(0))
            .and_then(|c| c.get("message"))
            .and_then(|m| m.get("content"))
            .and_then(|c| c.as_str())
            .ok_or_else(|| PigenError::Llm("OpenAI response missing message content".to_string()))?;

        Ok(content.trim().to_string())
    }
}

#[async_trait]
impl LlmClient for OpenAiClient {
    async fn generate(&self, prompt: &str, temperature: f32, max_tokens: u32) -> Result<String> {
        let body = self.build_request(prompt, temperature, max_tokens);

        log::debug!("Calling OpenAI model {}", self.config.model);

        let response = self
            .client
            .post(OPENAI_API_URL)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| PigenError::Llm(format!("OpenAI request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(PigenError::Llm(format!("OpenAI API error {}: {}", status, detail)));
        }

        let payload: Value = response
            .json()
            .await
            .map_err(|e| PigenError::Llm(format!("Failed to decode OpenAI response: {}", e)))?;

        Self::parse_response(&payload)
    }
}
