//! LLM provider configuration.
//!
//! Settings are read from the environment once at startup and passed into the
//! client constructor explicitly. Nothing here is global or mutable after
//! construction.
//!
//! Environment variables:
//! - `MODEL_TYPE`: `GEMINI` (default) or `OPENAI`
//! - `GEMINI_API_KEY` / `GOOGLE_API_KEY`, `GEMINI_MODEL`
//! - `OPENAI_API_KEY`, `OPENAI_MODEL`

use serde::{Deserialize, Serialize};

use crate::error::{PigenError, Result};

/// Default Gemini model.
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash-exp";

/// Default OpenAI model.
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o";

/// Supported LLM providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    Gemini,
    OpenAi,
}

impl LlmProvider {
    /// Parse a MODEL_TYPE value. Unknown values fall back to Gemini with a
    /// warning, matching the permissive startup behavior callers expect.
    pub fn from_model_type(value: &str) -> Self {
        match value.trim().to_uppercase().as_str() {
            "GEMINI" => LlmProvider::Gemini,
            "OPENAI" => LlmProvider::OpenAi,
            other => {
                log::warn!("Unknown MODEL_TYPE: {}. Defaulting to GEMINI.", other);
                LlmProvider::Gemini
            }
        }
    }
}

/// Resolved LLM settings: provider, credential and model name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmSettings {
    pub provider: LlmProvider,
    pub api_key: String,
    pub model: String,
}

impl LlmSettings {
    /// Build settings from the environment.
    ///
    /// Returns a `Config` error when the selected provider has no credential,
    /// so a misconfigured process fails at startup rather than mid-run.
    pub fn from_env() -> Result<Self> {
        let provider = LlmProvider::from_model_type(
            &std::env::var("MODEL_TYPE").unwrap_or_else(|_| "GEMINI".to_string()),
        );
        Self::for_provider(provider)
    }

    /// Build settings for an explicit provider, reading only that provider's
    /// variables.
    pub fn for_provider(provider: LlmProvider) -> Result<Self> {
        match provider {
            LlmProvider::Gemini => {
                let api_key = std::env::var("GEMINI_API_KEY")
                    .or_else(|_| std::env::var("GOOGLE_API_KEY"))
                    .map_err(|_| {
                        PigenError::Config("no Gemini API key found (GEMINI_API_KEY or GOOGLE_API_KEY)".to_string())
                    })?;
                let model = std::env::var("GEMINI_MODEL").unwrap_or_else(|_| DEFAULT_GEMINI_MODEL.to_string());
                Ok(Self {
                    provider,
                    api_key,
                    model,
                })
            }
            LlmProvider::OpenAi => {
                let api_key = std::env::var("OPENAI_API_KEY")
                    .map_err(|_| PigenError::Config("OPENAI_API_KEY not set".to_string()))?;
                let model = std::env::var("OPENAI_MODEL").unwrap_or_else(|_| DEFAULT_OPENAI_MODEL.to_string());
                Ok(Self {
                    provider,
                    api_key,
                    model,
                })
            }
        }
    }

    /// Construct settings directly, bypassing the environment.
    pub fn new(provider: LlmProvider, api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            provider,
            api_key: api_key.into(),
            model: model.into(),
        }
    }
}
