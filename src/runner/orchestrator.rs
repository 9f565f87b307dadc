//! The control loop: repeatedly prompt the model, decode its response,
//! dispatch tool calls, and stop on a final answer or a fatal condition.
//!
//! The loop is stateless between iterations except for one step of history
//! (the previous model response and tool result) and the dispatcher's
//! tracked metadata. Every iteration appends an [`IterationRecord`] so the
//! caller can replay the whole run afterwards.

use std::sync::Arc;

use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::llm::LlmClient;
use crate::protocol::{Action, FunctionCall, build_prompt, parse_response, parse_tool_result_data};
use crate::tools::{DispatchState, ToolDispatcher};

/// What one pass through the loop did.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IterationRecord {
    /// 1-based iteration number.
    pub iteration: u32,
    pub llm_response: String,
    pub tool_call: Option<FunctionCall>,
    pub tool_result: Option<String>,
    pub final_answer: Option<String>,
}

impl IterationRecord {
    fn new(iteration: u32, llm_response: String) -> Self {
        Self {
            iteration,
            llm_response,
            tool_call: None,
            tool_result: None,
            final_answer: None,
        }
    }
}

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// The model produced a FINAL_ANSWER.
    Success,
    /// An LLM API call failed; the run cannot continue.
    LlmFailure,
    /// The model produced neither FUNCTION_CALL nor FINAL_ANSWER.
    ProtocolFailure,
    /// The iteration budget ran out before a final answer.
    IterationsExhausted,
}

impl RunStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, RunStatus::Success)
    }
}

/// Outcome of a full run, with the complete iteration history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunResult {
    pub status: RunStatus,
    pub final_answer: Option<String>,
    pub error_msg: Option<String>,
    pub iterations: Vec<IterationRecord>,
}

/// Receives each completed iteration as it happens.
///
/// Observer failures never affect the run: errors are logged and swallowed.
pub trait IterationObserver: Send + Sync {
    fn on_iteration(&self, record: &IterationRecord) -> Result<()>;
}

/// Observer that does nothing.
pub struct NoOpObserver;

impl IterationObserver for NoOpObserver {
    fn on_iteration(&self, _record: &IterationRecord) -> Result<()> {
        Ok(())
    }
}

/// Loop parameters.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    pub max_iterations: u32,
    /// Generation temperature for the loop's own LLM calls. The tools pin
    /// their own temperatures.
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_iterations: 20,
            temperature: 0.7,
            max_tokens: 2000,
        }
    }
}

/// Drives the pipeline from user prompt to final answer.
pub struct Orchestrator {
    llm: Arc<dyn LlmClient>,
    dispatcher: ToolDispatcher,
    system_prompt: String,
    config: OrchestratorConfig,
}

impl Orchestrator {
    pub fn new(llm: Arc<dyn LlmClient>, system_prompt: String, config: OrchestratorConfig) -> Self {
        Self {
            dispatcher: ToolDispatcher::new(llm.clone()),
            llm,
            system_prompt,
            config,
        }
    }

    /// Run the loop until a final answer, a fatal error, or exhaustion.
    pub async fn run(&self, user_prompt: &str, observer: &dyn IterationObserver) -> RunResult {
        let mut iterations: Vec<IterationRecord> = Vec::new();
        let mut last_llm_response = String::new();
        let mut last_tool_result = String::new();
        let mut state = DispatchState::default();

        for iteration in 1..=self.config.max_iterations {
            info!("Starting iteration {}/{}", iteration, self.config.max_iterations);

            let prompt = build_prompt(
                &self.system_prompt,
                user_prompt,
                Some(&last_llm_response),
                Some(&last_tool_result),
            );

            last_llm_response = match self
                .llm
                .generate(&prompt, self.config.temperature, self.config.max_tokens)
                .await
            {
                Ok(response) => response,
                Err(e) => {
                    error!("LLM API call failed for iteration {}: {}", iteration, e);
                    return RunResult {
                        status: RunStatus::LlmFailure,
                        final_answer: None,
                        error_msg: Some(format!("LLM API call failed: {}", e)),
                        iterations,
                    };
                }
            };
            debug!("LLM response for iteration {}: {:.500}", iteration, last_llm_response);

            let mut record = IterationRecord::new(iteration, last_llm_response.clone());

            match parse_response(&last_llm_response) {
                Some(Action::FinalAnswer(answer)) => {
                    info!("Iteration {}: FINAL_ANSWER received", iteration);
                    record.final_answer = Some(answer.clone());
                    iterations.push(record);
                    notify(observer, iterations.last());
                    return RunResult {
                        status: RunStatus::Success,
                        final_answer: Some(answer),
                        error_msg: None,
                        iterations,
                    };
                }
                Some(Action::FunctionCall(call)) => {
                    info!("Iteration {}: FUNCTION_CALL parsed: {}", iteration, call.name);

                    let context = if last_tool_result.is_empty() {
                        None
                    } else {
                        parse_tool_result_data(&last_tool_result)
                    };

                    let tool_result = self
                        .dispatcher
                        .dispatch(&call, user_prompt, context.as_ref(), &mut state)
                        .await;
                    debug!("Tool result for iteration {}: {:.500}", iteration, tool_result);

                    record.tool_call = Some(call);
                    record.tool_result = Some(tool_result.clone());
                    last_tool_result = tool_result;

                    iterations.push(record);
                    notify(observer, iterations.last());
                }
                None => {
                    warn!(
                        "Iteration {}: Invalid response format. Expected FUNCTION_CALL or FINAL_ANSWER.",
                        iteration
                    );
                    iterations.push(record);
                    return RunResult {
                        status: RunStatus::ProtocolFailure,
                        final_answer: None,
                        error_msg: Some(format!(
                            "Iteration {}: Invalid response format. Expected FUNCTION_CALL or FINAL_ANSWER.",
                            iteration
                        )),
                        iterations,
                    };
                }
            }
        }

        error!(
            "Maximum iterations ({}) reached without completing the pipeline",
            self.config.max_iterations
        );
        RunResult {
            status: RunStatus::IterationsExhausted,
            final_answer: None,
            error_msg: Some(format!(
                "Maximum iterations ({}) reached without completing the pipeline",
                self.config.max_iterations
            )),
            iterations,
        }
    }
}

fn notify(observer: &dyn IterationObserver, record: Option<&IterationRecord>) {
    if let Some(record) = record {
        if let Err(e) = observer.on_iteration(record) {
            warn!("Error in iteration callback: {}", e);
        }
    }
}
