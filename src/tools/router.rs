//! Tool dispatcher: routes decoded function calls to the pipeline tools.
//!
//! The dispatcher is the forgiving layer between the model and the tools.
//! It aliases argument names the model tends to vary, back-fills the user
//! prompt and carried context, tracks the language and API across steps,
//! and converts every failure into an error-shaped TOOL_RESULT so a bad
//! call never aborts the run.

use std::sync::Arc;

use log::{debug, info};
use serde_json::Value;

use crate::error::PigenError;
use crate::llm::LlmClient;
use crate::protocol::{FunctionCall, error_tool_result};

use super::{api_selection, code_creation, file_output, logic_creation, normalize_language, test_run};

/// Metadata carried across dispatches within one run.
///
/// The model often omits the language or API on later calls, so the
/// dispatcher remembers what `code_creation` resolved and re-injects it.
#[derive(Debug, Clone, Default)]
pub struct DispatchState {
    pub tracked_language: Option<String>,
    pub tracked_api: Option<String>,
}

/// Routes function calls to the five pipeline tools.
pub struct ToolDispatcher {
    llm: Arc<dyn LlmClient>,
}

impl ToolDispatcher {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self { llm }
    }

    /// Execute a function call and return the wire-formatted result.
    ///
    /// Always returns a TOOL_RESULT line (or, for a successful
    /// `file_output`, a FINAL_ANSWER): unknown names and tool failures
    /// come back as error-shaped results rather than `Err`.
    pub async fn dispatch(
        &self,
        call: &FunctionCall,
        user_prompt: &str,
        context: Option<&Value>,
        state: &mut DispatchState,
    ) -> String {
        let mut call = call.clone();

        if call.arg_is_unset("user_prompt") {
            call.set_arg("user_prompt", Value::String(user_prompt.to_string()));
        }
        if let Some(context) = context {
            if call.arg_is_unset("context") {
                debug!("Injecting context from last tool result into {}", call.name);
                call.set_arg("context", context.clone());
            }
        }

        match call.name.as_str() {
            "code_creation" => {
                // Tracking reads `language` first, unlike tool dispatch
                // which prefers `target_language`.
                let lang = call
                    .str_arg("language")
                    .or_else(|| call.str_arg("target_language"))
                    .filter(|l| !l.is_empty());
                if let Some(lang) = lang {
                    let canonical = normalize_language(lang).map(str::to_string);
                    state.tracked_language = canonical.or_else(|| Some(lang.to_string()));
                }
                if let Some(api) = call.str_arg("selected_api").filter(|a| !a.is_empty()) {
                    state.tracked_api = Some(api.to_string());
                }
            }
            "test_run" => {
                if language_arg(&call).is_none() {
                    if let Some(tracked) = &state.tracked_language {
                        info!("Using tracked language '{}' for test_run", tracked);
                        call.set_arg("language", Value::String(tracked.clone()));
                    }
                }
            }
            _ => {}
        }

        debug!("Executing tool: {} with args: {:?}", call.name, call.arguments);
        match self.call_tool(&call).await {
            Ok(output) => output,
            Err(e) => {
                // PigenError::Tool messages already describe the failure;
                // other variants keep their full display form.
                let message = match e {
                    PigenError::Tool(msg) => msg,
                    other => other.to_string(),
                };
                error_tool_result(&call.name, &format!("Tool execution failed: {}", message))
            }
        }
    }

    async fn call_tool(&self, call: &FunctionCall) -> crate::error::Result<String> {
        let llm = self.llm.as_ref();
        match call.name.as_str() {
            "api_selection" => {
                let args = api_selection::ApiSelectionArgs {
                    user_request: string_arg(call, "user_prompt"),
                    context: context_arg(call),
                };
                let result = api_selection::call(llm, &args).await?;
                Ok(api_selection::format_output(&result))
            }
            "logic_creation" => {
                let args = logic_creation::LogicCreationArgs {
                    user_request: string_arg(call, "user_prompt"),
                    selected_api: string_arg(call, "selected_api"),
                    context: context_arg(call),
                };
                let result = logic_creation::call(llm, &args).await?;
                Ok(logic_creation::format_output(&result))
            }
            "code_creation" => {
                let args = code_creation::CodeCreationArgs {
                    pseudo_code: string_list_arg(call, "pseudo_code"),
                    data_structures: value_list_arg(call, "data_structures"),
                    error_handling_strategy: string_arg(call, "error_handling_strategy"),
                    selected_api: string_arg(call, "selected_api"),
                    target_language: language_arg(call).unwrap_or("Python").to_string(),
                    context: context_arg(call),
                };
                let result = code_creation::call(llm, &args).await?;
                Ok(code_creation::format_output(&result))
            }
            "test_run" => {
                let args = test_run::TestRunArgs {
                    code: string_arg(call, "code"),
                    target_language: language_arg(call).unwrap_or("Python").to_string(),
                    selected_api: string_arg(call, "selected_api"),
                    context: context_arg(call),
                };
                let result = test_run::call(llm, &args).await?;
                Ok(test_run::format_output(&result))
            }
            "file_output" => {
                let code = call
                    .str_arg("code")
                    .or_else(|| call.str_arg("tested_code"))
                    .unwrap_or_default()
                    .to_string();
                let args = file_output::FileOutputArgs {
                    code,
                    target_language: language_arg(call).unwrap_or("Python").to_string(),
                    selected_api: string_arg(call, "selected_api"),
                    dependencies: string_list_arg(call, "dependencies"),
                    test_results: call.arg("test_results").filter(|v| !v.is_null()).cloned(),
                    context: context_arg(call),
                };
                let result = file_output::call(llm, &args).await?;
                Ok(file_output::format_output(&result))
            }
            unknown => Ok(error_tool_result(
                unknown,
                &format!("Unknown function: {}", unknown),
            )),
        }
    }
}

/// `target_language` wins over the `language` alias.
fn language_arg(call: &FunctionCall) -> Option<&str> {
    call.str_arg("target_language")
        .or_else(|| call.str_arg("language"))
        .filter(|l| !l.is_empty())
}

fn string_arg(call: &FunctionCall, key: &str) -> String {
    call.str_arg(key).unwrap_or_default().to_string()
}

fn string_list_arg(call: &FunctionCall, key: &str) -> Vec<String> {
    call.arg(key)
        .and_then(|v| v.as_array())
        .map(|items| {
            items
                .iter()
                .filter_map(|i| i.as_str())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn value_list_arg(call: &FunctionCall, key: &str) -> Vec<Value> {
    call.arg(key)
        .and_then(|v| v.as_array())
        .cloned()
        .unwrap_or_default()
}

fn context_arg(call: &FunctionCall) -> Option<Value> {
    call.arg("context").filter(|v| !v.is_null()).cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::MockLlmClient;
    use crate::protocol::parse_tool_result_data;
    use serde_json::{Map, json};

    fn call_with(name: &str, args: &[(&str, Value)]) -> FunctionCall {
        let mut map = Map::new();
        for (key, value) in args {
            map.insert(key.to_string(), value.clone());
        }
        FunctionCall::new(name, map)
    }

    fn dispatcher(responses: Vec<&str>) -> (ToolDispatcher, Arc<MockLlmClient>) {
        let mock = Arc::new(MockLlmClient::new(responses));
        (ToolDispatcher::new(mock.clone()), mock)
    }

    #[tokio::test]
    async fn test_dispatch_unknown_function() {
        let (dispatcher, mock) = dispatcher(vec![]);
        let call = call_with("summon_demon", &[]);
        let mut state = DispatchState::default();

        let result = dispatcher.dispatch(&call, "prompt", None, &mut state).await;
        assert_eq!(
            result,
            "TOOL_RESULT: summon_demon|status=error|data=|error_msg=Unknown function: summon_demon"
        );
        assert_eq!(mock.calls(), 0);
    }

    #[tokio::test]
    async fn test_dispatch_backfills_user_prompt() {
        let (dispatcher, mock) = dispatcher(vec![
            r#"{"selected_api": "PI Web API", "reasoning": "fits"}"#,
        ]);
        let call = call_with("api_selection", &[]);
        let mut state = DispatchState::default();

        let result = dispatcher
            .dispatch(&call, "build a web dashboard", None, &mut state)
            .await;
        assert!(result.contains("status=success"));
        assert!(mock.prompts()[0].contains("build a web dashboard"));
    }

    #[tokio::test]
    async fn test_dispatch_injects_context_when_unset() {
        let (dispatcher, mock) = dispatcher(vec![
            r#"{"pseudo_code": ["Step 1: Connect"], "data_structures": [], "error_handling_strategy": "fail fast", "reasoning": "simple"}"#,
        ]);
        let call = call_with("logic_creation", &[("selected_api", json!("PI Web API"))]);
        let context = json!({"selected_api": "PI Web API", "reasoning": "carried"});
        let mut state = DispatchState::default();

        dispatcher
            .dispatch(&call, "prompt", Some(&context), &mut state)
            .await;
        assert!(mock.prompts()[0].contains("Additional Context:"));
        assert!(mock.prompts()[0].contains("carried"));
    }

    #[tokio::test]
    async fn test_dispatch_keeps_explicit_context() {
        let (dispatcher, mock) = dispatcher(vec![
            r#"{"selected_api": "PI SDK", "reasoning": "fast"}"#,
        ]);
        let call = call_with("api_selection", &[("context", json!({"source": "explicit"}))]);
        let pending = json!({"source": "pending"});
        let mut state = DispatchState::default();

        dispatcher
            .dispatch(&call, "prompt", Some(&pending), &mut state)
            .await;
        assert!(mock.prompts()[0].contains("explicit"));
        assert!(!mock.prompts()[0].contains("pending"));
    }

    #[tokio::test]
    async fn test_dispatch_tracks_language_and_api() {
        let (dispatcher, _mock) = dispatcher(vec![
            r#"{"code": "Write-Output hi", "dependencies": [], "usage_example": "x", "reasoning": "y"}"#,
        ]);
        let call = call_with(
            "code_creation",
            &[
                ("pseudo_code", json!(["Step 1: emit greeting"])),
                ("error_handling_strategy", json!("none")),
                ("selected_api", json!("Powershell Tools for PI")),
                ("language", json!("powershell")),
            ],
        );
        let mut state = DispatchState::default();

        dispatcher.dispatch(&call, "prompt", None, &mut state).await;
        assert_eq!(state.tracked_language.as_deref(), Some("PowerShell"));
        assert_eq!(state.tracked_api.as_deref(), Some("Powershell Tools for PI"));
    }

    #[tokio::test]
    async fn test_dispatch_tracking_prefers_language_over_target_language() {
        let (dispatcher, mock) = dispatcher(vec![
            r#"{"code": "print('hi')", "dependencies": [], "usage_example": "x", "reasoning": "y"}"#,
        ]);
        let call = call_with(
            "code_creation",
            &[
                ("pseudo_code", json!(["Step 1: emit greeting"])),
                ("error_handling_strategy", json!("none")),
                ("selected_api", json!("PI Web API")),
                ("language", json!("powershell")),
                ("target_language", json!("Python")),
            ],
        );
        let mut state = DispatchState::default();

        dispatcher.dispatch(&call, "prompt", None, &mut state).await;

        // The tool itself ran with target_language, but tracking follows
        // the language argument.
        assert!(mock.prompts()[0].contains("Python programming"));
        assert_eq!(state.tracked_language.as_deref(), Some("PowerShell"));
    }

    #[tokio::test]
    async fn test_dispatch_injects_tracked_language_into_test_run() {
        let (dispatcher, mock) = dispatcher(vec![
            r#"{
                "syntax_check": {"passed": true, "issues": []},
                "logic_consistency": {"passed": true, "issues": []},
                "best_practices": {"passed": true, "issues": []},
                "error_handling": {"passed": true, "issues": []},
                "security": {"passed": true, "issues": []},
                "overall_result": "pass",
                "recommendations": [],
                "reasoning": "fine"
            }"#,
        ]);
        let call = call_with(
            "test_run",
            &[("code", json!("Write-Output hi")), ("selected_api", json!("Powershell Tools for PI"))],
        );
        let mut state = DispatchState {
            tracked_language: Some("PowerShell".to_string()),
            tracked_api: None,
        };

        let result = dispatcher.dispatch(&call, "prompt", None, &mut state).await;
        assert!(result.contains("status=success"));
        assert!(mock.prompts()[0].contains("Language: PowerShell"));
    }

    #[tokio::test]
    async fn test_dispatch_tool_failure_becomes_error_result() {
        let mock = Arc::new(MockLlmClient::failing("connection refused"));
        let dispatcher = ToolDispatcher::new(mock);
        let call = call_with("api_selection", &[]);
        let mut state = DispatchState::default();

        let result = dispatcher.dispatch(&call, "prompt", None, &mut state).await;
        assert!(result.starts_with("TOOL_RESULT: api_selection|status=error|data=|error_msg=Tool execution failed:"));
        assert!(result.contains("connection refused"));
    }

    #[tokio::test]
    async fn test_dispatch_file_output_accepts_tested_code_alias() {
        let (dispatcher, mock) = dispatcher(vec![
            r##"{
                "readme_content": "# Docs",
                "manifest_content": {"version": "1.0.0", "language": "Python", "api": "PI Web API", "dependencies": []}
            }"##,
        ]);
        let call = call_with(
            "file_output",
            &[
                ("tested_code", json!("value = read_tag(config)")),
                ("selected_api", json!("PI Web API")),
                ("language", json!("Python")),
            ],
        );
        let mut state = DispatchState::default();

        let result = dispatcher.dispatch(&call, "prompt", None, &mut state).await;
        assert!(result.starts_with("FINAL_ANSWER: "));
        assert!(mock.prompts()[0].contains("value = read_tag(config)"));
    }

    #[tokio::test]
    async fn test_dispatch_success_result_parses_back() {
        let (dispatcher, _mock) = dispatcher(vec![
            r#"{"selected_api": "PI SQL Client", "reasoning": "reporting workload"}"#,
        ]);
        let call = call_with("api_selection", &[]);
        let mut state = DispatchState::default();

        let result = dispatcher.dispatch(&call, "custom reports", None, &mut state).await;
        let data = parse_tool_result_data(&result).unwrap();
        assert_eq!(data["selected_api"], "PI SQL Client");
    }
}
