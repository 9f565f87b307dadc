//! Error types for pigen
//!
//! Centralized error handling using thiserror.

use thiserror::Error;

/// All error types that can occur in pigen
#[derive(Debug, Error)]
pub enum PigenError {
    /// LLM provider configuration problem (missing key, unknown provider)
    #[error("Config error: {0}")]
    Config(String),

    /// LLM API call failed (transport or provider error)
    #[error("LLM error: {0}")]
    Llm(String),

    /// Pipeline tool failed
    #[error("Tool error: {0}")]
    Tool(String),

    /// Model response matched neither FUNCTION_CALL nor FINAL_ANSWER
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for pigen operations
pub type Result<T> = std::result::Result<T, PigenError>;
