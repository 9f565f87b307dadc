//! Gemini API client implementation.
//!
//! Calls the `generateContent` REST endpoint with the API key passed as a
//! query parameter.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Value, json};

use crate::config::LlmSettings;
use crate::error::{PigenError, Result};
use crate::llm::client::LlmClient;

/// Gemini generateContent base URL.
const GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Default request timeout.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Configuration for the Gemini client.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub model: String,
    pub timeout: Duration,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            model: crate::config::DEFAULT_GEMINI_MODEL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// Gemini API client.
pub struct GeminiClient {
    client: Client,
    api_key: String,
    config: GeminiConfig,
}

impl GeminiClient {
    /// Create a client from resolved settings.
    pub fn new(settings: &LlmSettings) -> Result<Self> {
        let config = GeminiConfig {
            model: settings.model.clone(),
            ..Default::default()
        };
        Self::with_api_key(settings.api_key.clone(), config)
    }

    /// Create a client with an explicit API key.
    pub fn with_api_key(api_key: String, config: GeminiConfig) -> Result<Self> {
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

    /// Build the request body for generateContent.
    fn build_request(prompt: &str, temperature: f32, max_tokens: u32) -> Value {
        json!({
            "contents": [
                {"parts": [{"text": prompt}]}
            ],
            "generationConfig": {
                "temperature": temperature,
                "maxOutputTokens": max_tokens
            }
        })
    }

    /// Extract the generated text from a generateContent response.
    fn parse_response(response: &Value) -> Result<String> {
        let parts = response
            .get("candidates")
            .and_then(|c| c.get(0))
            .and_then(|c| c.get("content"))
            .and_then(|c| c.get("parts"))
            .and_then(|p| p.as_array())
            .ok_or_else(|| PigenError::Llm("Gemini response missing candidates".to_string()))?;

        let text: String = parts
            .iter()
            .filter_map(|p| p.get("text").and_then(|t| t.as_str()))
            .collect::<Vec<_>>()
            .join("");

        if text.is_empty() {
            return Err(PigenError::Llm("Gemini response contained no text".to_string()));
        }

        Ok(text.trim().to_string())
    }
}

#[async_trait]
impl LlmClient for GeminiClient {
    async fn generate(&self, prompt: &str, temperature: f32, max_tokens: u32) -> Result<String> {
        let url = format!(
            "{}/{}:generateContent?key={}",
            GEMINI_API_URL, self.config.model, self.api_key
        );
        let body = Self::build_request(prompt, temperature, max_tokens);

        log::debug!("Calling Gemini model {}", self.config.model);

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| PigenError::Llm(format!("Gemini request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(PigenError::Llm(format!("Gemini API error {}: {}", status, detail)));
        }

        let payload: Value = response
            .json()
            .await
            .map_err(|e| PigenError::Llm(format!("Failed to decode Gemini response: {}", e)))?;

        Self::parse_response(&payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_request_shape() {
        let body = GeminiClient::build_request("hello", 0.7, 2000);
        assert_eq!(body["contents"][0]["parts"][0]["text"], "hello");
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 2000);
        let temp = body["generationConfig"]["temperature"].as_f64().unwrap();
        assert!((temp - 0.7).abs() < 1e-6);
    }

    #[test]
    fn test_parse_response_text() {
        let response = json!({
            "candidates": [
                {"content": {"parts": [{"text": "FINAL_ANSWER: done"}]}}
            ]
        });
        assert_eq!(GeminiClient::parse_response(&response).unwrap(), "FINAL_ANSWER: done");
    }

    #[test]
    fn test_parse_response_joins_parts_and_trims() {
        let response = json!({
            "candidates": [
                {"content": {"parts": [{"text": "  part one"}, {"text": " part two \n"}]}}
            ]
        });
        assert_eq!(GeminiClient::parse_response(&response).unwrap(), "part one part two");
    }

    #[test]
    fn test_parse_response_missing_candidates() {
        let err = GeminiClient::parse_response(&json!({})).unwrap_err();
        assert!(err.to_string().contains("missing candidates"));
    }

    #[test]
    fn test_parse_response_empty_text() {
        let response = json!({
            "candidates": [{"content": {"parts": []}}]
        });
        assert!(GeminiClient::parse_response(&response).is_err());
    }
}
