//! Core LLM client trait and the scripted mock used in tests.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::error::{PigenError, Result};

/// Stateless text-generation capability.
///
/// Each call is independent: the orchestrator assembles the full prompt for
/// every iteration and no conversation state lives in the client. Transport
/// and provider failures surface as `PigenError::Llm`.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Generate a completion for a single prompt.
    async fn generate(&self, prompt: &str, temperature: f32, max_tokens: u32) -> Result<String>;
}

/// Mock client that replays a scripted sequence of responses.
///
/// Responses are consumed front to back; once the queue is exhausted every
/// further call fails, which doubles as a guard against loops calling the
/// LLM more often than a test expects.
pub struct MockLlmClient {
    responses: Mutex<VecDeque<Result<String>>>,
    prompts: Mutex<Vec<String>>,
    calls: AtomicUsize,
}

impl MockLlmClient {
    /// Create a mock that returns the given responses in order.
    pub fn new(responses: Vec<&str>) -> Self {
        Self {
            responses: Mutex::new(responses.into_iter().map(|r| Ok(r.to_string())).collect()),
            prompts: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        }
    }

    /// Create a mock whose first call fails with an LLM error.
    pub fn failing(message: &str) -> Self {
        Self {
            responses: Mutex::new(VecDeque::from([Err(PigenError::Llm(message.to_string()))])),
            prompts: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        }
    }

    /// Queue an additional response after construction.
    pub fn push_response(&self, response: &str) {
        self.responses
            .lock()
            .expect("mock queue poisoned")
            .push_back(Ok(response.to_string()));
    }

    /// Number of generate calls made so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Prompts received so far, in call order.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().expect("mock prompts poisoned").clone()
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn generate(&self, prompt: &str, _temperature: f32, _max_tokens: u32) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts
            .lock()
            .expect("mock prompts poisoned")
            .push(prompt.to_string());
        self.responses
            .lock()
            .expect("mock queue poisoned")
            .pop_front()
            .unwrap_or_else(|| Err(PigenError::Llm("mock response queue exhausted".to_string())))
    }
}
