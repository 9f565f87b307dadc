//! End-to-end runs of the pipeline loop against a scripted LLM.
//!
//! The mock serves both roles: orchestrator-level responses (FUNCTION_CALL /
//! FINAL_ANSWER lines) and tool-level responses (JSON documents), consumed
//! in strict call order.

use std::sync::Arc;

use pigen::llm::MockLlmClient;
use pigen::runner::{NoOpObserver, Orchestrator, OrchestratorConfig, RunStatus};

fn orchestrator(mock: Arc<MockLlmClient>, max_iterations: u32) -> Orchestrator {
    Orchestrator::new(
        mock,
        "You drive a five-stage PI System code generation pipeline.".to_string(),
        OrchestratorConfig {
            max_iterations,
            ..OrchestratorConfig::default()
        },
    )
}

const API_SELECTION_JSON: &str =
    r#"{"selected_api": "PI Web API", "reasoning": "REST access fits the request"}"#;

const LOGIC_JSON: &str = r#"{
    "pseudo_code": ["Step 1: Authenticate against the Web API", "Step 2: Read the tag value"],
    "data_structures": [{"name": "tag_value", "type": "float", "description": "latest value"}],
    "error_handling_strategy": "Retry transient HTTP failures, surface auth errors",
    "reasoning": "Simple read flow"
}"#;

const CODE_JSON: &str = r#"{
    "code": "import requests\n\ndef read_tag(config, tag):\n    return requests.get(config.url).json()",
    "dependencies": ["requests"],
    "usage_example": "read_tag(config, 'sinusoid')",
    "reasoning": "Direct Web API call"
}"#;

const REVIEW_JSON: &str = r#"{
    "syntax_check": {"passed": true, "issues": []},
    "logic_consistency": {"passed": true, "issues": []},
    "best_practices": {"passed": true, "issues": []},
    "error_handling": {"passed": true, "issues": []},
    "security": {"passed": true, "issues": []},
    "overall_result": "pass",
    "recommendations": [],
    "reasoning": "Clean implementation"
}"#;

const DOCS_JSON: &str = r##"{
    "readme_content": "# PI Tag Reader\n\nReads a tag value over the PI Web API.",
    "manifest_content": {
        "author": "PI System Code Generator",
        "version": "1.0.0",
        "description": "Tag reader",
        "language": "Python",
        "api": "PI Web API",
        "dependencies": ["requests"],
        "requirements": "Python 3.10+",
        "usage": "python pi_code.py"
    }
}"##;

#[tokio::test]
async fn full_pipeline_run_succeeds() {
    let mock = Arc::new(MockLlmClient::new(vec![
        // iteration 1: select an API
        "FUNCTION_CALL: api_selection",
        API_SELECTION_JSON,
        // iteration 2: decompose into logic
        "FUNCTION_CALL: logic_creation|selected_api=PI Web API",
        LOGIC_JSON,
        // iteration 3: generate code
        r#"FUNCTION_CALL: code_creation|selected_api=PI Web API|language=python|pseudo_code=["Step 1: Authenticate", "Step 2: Read tag"]|error_handling_strategy=retry transient failures"#,
        CODE_JSON,
        // iteration 4: review it (no language argument on purpose)
        "FUNCTION_CALL: test_run|code=import requests|selected_api=PI Web API",
        REVIEW_JSON,
        // iteration 5: package the deliverable
        r#"FUNCTION_CALL: file_output|code=import requests|selected_api=PI Web API|language=Python|dependencies=["requests"]"#,
        DOCS_JSON,
        // iteration 6: the model echoes the package as its final answer
        "FINAL_ANSWER: pipeline complete, package delivered",
    ]));

    let result = orchestrator(mock.clone(), 20)
        .run("Read a PI tag value from a web dashboard", &NoOpObserver)
        .await;

    assert_eq!(result.status, RunStatus::Success);
    assert_eq!(
        result.final_answer.as_deref(),
        Some("pipeline complete, package delivered")
    );
    assert_eq!(result.iterations.len(), 6);
    assert_eq!(mock.calls(), 11);

    // Every non-terminal iteration recorded its tool exchange.
    for record in &result.iterations[..5] {
        assert!(record.tool_call.is_some());
        assert!(record.tool_result.is_some());
    }
    assert!(result.iterations[5].final_answer.is_some());

    let prompts = mock.prompts();

    // Tracked language: code_creation resolved `python` to canonical casing,
    // and test_run received it without asking.
    assert!(prompts[7].contains("Language: Python"));

    // Context chaining: the logic_creation tool prompt carries the decoded
    // api_selection result.
    assert!(prompts[3].contains("Additional Context:"));
    assert!(prompts[3].contains("REST access fits the request"));

    // The packaging step emits FINAL_ANSWER directly as its tool result,
    // which is then echoed back to the model as history.
    let package = result.iterations[4].tool_result.as_deref().unwrap();
    assert!(package.starts_with("FINAL_ANSWER: "));
    assert!(package.contains("pi_code.py"));
    assert!(prompts[10].contains("Last Tool Result:\nFINAL_ANSWER:"));
}

#[tokio::test]
async fn immediate_final_answer_ends_in_one_iteration() {
    let mock = Arc::new(MockLlmClient::new(vec!["FINAL_ANSWER: nothing to generate"]));
    let result = orchestrator(mock.clone(), 20).run("noop", &NoOpObserver).await;

    assert_eq!(result.status, RunStatus::Success);
    assert_eq!(result.iterations.len(), 1);
    assert_eq!(mock.calls(), 1);
}

#[tokio::test]
async fn unparseable_response_fails_the_run() {
    let mock = Arc::new(MockLlmClient::new(vec![
        "Sure! Here is what I would do first: select an API.",
    ]));
    let result = orchestrator(mock.clone(), 20).run("request", &NoOpObserver).await;

    assert_eq!(result.status, RunStatus::ProtocolFailure);
    assert_eq!(
        result.error_msg.as_deref(),
        Some("Iteration 1: Invalid response format. Expected FUNCTION_CALL or FINAL_ANSWER.")
    );
    assert_eq!(result.iterations.len(), 1);
    assert_eq!(mock.calls(), 1);
}

#[tokio::test]
async fn iteration_budget_is_a_hard_stop() {
    let mock = Arc::new(MockLlmClient::new(vec![
        "FUNCTION_CALL: unknown_tool|n=1",
        "FUNCTION_CALL: unknown_tool|n=2",
        "FUNCTION_CALL: unknown_tool|n=3",
    ]));
    let result = orchestrator(mock.clone(), 3).run("request", &NoOpObserver).await;

    assert_eq!(result.status, RunStatus::IterationsExhausted);
    assert_eq!(
        result.error_msg.as_deref(),
        Some("Maximum iterations (3) reached without completing the pipeline")
    );
    assert_eq!(result.iterations.len(), 3);
    assert_eq!(mock.calls(), 3);
}

#[tokio::test]
async fn unknown_tool_does_not_abort_the_run() {
    let mock = Arc::new(MockLlmClient::new(vec![
        "FUNCTION_CALL: frobnicate|x=1",
        "FINAL_ANSWER: recovered after bad call",
    ]));
    let result = orchestrator(mock.clone(), 20).run("request", &NoOpObserver).await;

    assert_eq!(result.status, RunStatus::Success);
    let first = result.iterations[0].tool_result.as_deref().unwrap();
    assert_eq!(
        first,
        "TOOL_RESULT: frobnicate|status=error|data=|error_msg=Unknown function: frobnicate"
    );
}

#[tokio::test]
async fn tool_failure_surfaces_as_error_result_and_run_continues() {
    let mock = Arc::new(MockLlmClient::new(vec![
        "FUNCTION_CALL: api_selection",
        "I cannot answer in JSON today.",
        "FINAL_ANSWER: gave up gracefully",
    ]));
    let result = orchestrator(mock.clone(), 20).run("request", &NoOpObserver).await;

    assert_eq!(result.status, RunStatus::Success);
    let first = result.iterations[0].tool_result.as_deref().unwrap();
    assert!(first.starts_with("TOOL_RESULT: api_selection|status=error|data=|error_msg=Tool execution failed:"));
    assert!(first.contains("No JSON found in response"));

    // The failure is part of the next prompt so the model can react to it.
    assert!(mock.prompts()[2].contains("No JSON found in response"));
}

#[tokio::test]
async fn tracked_language_normalizes_casing_for_later_steps() {
    let mock = Arc::new(MockLlmClient::new(vec![
        r#"FUNCTION_CALL: code_creation|selected_api=Powershell Tools for PI|language=powershell|pseudo_code=["Step 1: List points"]|error_handling_strategy=fail fast"#,
        r#"{"code": "Get-PIPoint -Connection $conn", "dependencies": [], "usage_example": "./list.ps1", "reasoning": "cmdlet based"}"#,
        "FUNCTION_CALL: test_run|code=Get-PIPoint -Connection $conn|selected_api=Powershell Tools for PI",
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
        "FINAL_ANSWER: done",
    ]));
    let result = orchestrator(mock.clone(), 20).run("list PI points", &NoOpObserver).await;

    assert_eq!(result.status, RunStatus::Success);

    // code_creation got lowercase `powershell`; the review step still sees
    // the canonical name because the dispatcher tracks it.
    assert!(mock.prompts()[3].contains("Language: PowerShell"));
}

#[tokio::test]
async fn local_security_findings_fail_the_review_end_to_end() {
    let mock = Arc::new(MockLlmClient::new(vec![
        r#"FUNCTION_CALL: test_run|code=password = "hunter2"|language=Python|selected_api=PI Web API"#,
        r#"{
            "syntax_check": {"passed": true, "issues": []},
            "logic_consistency": {"passed": true, "issues": []},
            "best_practices": {"passed": true, "issues": []},
            "error_handling": {"passed": true, "issues": []},
            "security": {"passed": true, "issues": []},
            "overall_result": "pass",
            "recommendations": [],
            "reasoning": "looks fine"
        }"#,
        "FINAL_ANSWER: done",
    ]));
    let result = orchestrator(mock.clone(), 20).run("request", &NoOpObserver).await;

    assert_eq!(result.status, RunStatus::Success);
    let review = result.iterations[0].tool_result.as_deref().unwrap();
    assert!(review.contains("status=success"));
    assert!(review.contains("\"overall_result\":\"fail\""));
    assert!(review.contains("hardcoded credential"));
}
