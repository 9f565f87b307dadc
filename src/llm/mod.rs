//! LLM Client Adapter - a single `generate` capability over two hosted
//! chat-completion style backends (Gemini and OpenAI).
//!
//! The orchestrator only ever sees the `LlmClient` trait; which backend is
//! behind it is decided once at process start from `LlmSettings`.

pub mod client;
pub mod gemini;
pub mod openai;

use std::sync::Arc;

use crate::config::{LlmProvider, LlmSettings};
use crate::error::Result;

pub use client::{LlmClient, MockLlmClient};
pub use gemini::{GeminiClient, GeminiConfig};
pub use openai::{OpenAiClient, OpenAiConfig};

/// Build the configured backend client.
pub fn client_from_settings(settings: &LlmSettings) -> Result<Arc<dyn LlmClient>> {
    match settings.provider {
        LlmProvider::Gemini => Ok(Arc::new(GeminiClient::new(settings)?)),
        LlmProvider::OpenAi => Ok(Arc::new(OpenAiClient::new(settings)?)),
    }
}
