//! Test run tool - quality checks and validation of generated code,
//! combining an LLM review with local regex-based security scanning.

use regex::RegexBuilder;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::error::{PigenError, Result};
use crate::llm::LlmClient;
use crate::protocol::success_tool_result;

use super::{append_context, extract_json};

const TEST_RUN_PROMPT: &str = r#"You are an expert code quality analyst specializing in the PI System.

Generated Code:
```{target_language}
{code}
```

Language: {target_language}
Selected API: {selected_api}

Perform comprehensive code quality analysis and validation.

Your response MUST be a JSON object with the following structure:
{
    "syntax_check": {
        "passed": true/false,
        "issues": ["list of syntax errors if any"]
    },
    "logic_consistency": {
        "passed": true/false,
        "issues": ["list of logical inconsistencies if any"]
    },
    "best_practices": {
        "passed": true/false,
        "issues": ["list of best practice violations if any"]
    },
    "error_handling": {
        "passed": true/false,
        "issues": ["list of error handling issues if any"]
    },
    "security": {
        "passed": true/false,
        "issues": ["list of security issues if any"]
    },
    "overall_result": "pass/fail",
    "recommendations": ["list of recommendations for improvement"],
    "reasoning": "Brief explanation of test results"
}

Check for:
1. Syntax errors and basic code correctness
2. Logical consistency and proper flow
3. {selected_api} best practices compliance
4. Adequate error handling coverage
5. Security issues (hardcoded credentials, SQL injection, etc.)
6. Code quality issues
7. Resource management (connections, streams, etc.)

Return ONLY the JSON response, no additional text."#;

/// Arguments for the test run tool.
#[derive(Debug, Clone)]
pub struct TestRunArgs {
    pub code: String,
    pub target_language: String,
    pub selected_api: String,
    pub context: Option<Value>,
}

/// One dimension of the quality review.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckSection {
    pub passed: bool,
    pub issues: Vec<String>,
}

/// Full quality verdict for a piece of generated code.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestRun {
    pub syntax_check: CheckSection,
    pub logic_consistency: CheckSection,
    pub best_practices: CheckSection,
    pub error_handling: CheckSection,
    pub security: CheckSection,
    /// `pass` or `fail`.
    pub overall_result: String,
    pub recommendations: Vec<String>,
    pub reasoning: String,
}

/// Run the quality review over generated code.
///
/// The LLM verdict is post-processed by local security scanning: any local
/// finding is appended to the security section and forces both `security`
/// and `overall_result` to fail, regardless of what the model said.
pub async fn call(llm: &dyn LlmClient, args: &TestRunArgs) -> Result<TestRun> {
    let mut prompt = TEST_RUN_PROMPT
        .replace("{target_language}", &args.target_language)
        .replace("{code}", &args.code)
        .replace("{selected_api}", &args.selected_api);
    append_context(&mut prompt, args.context.as_ref());

    let response = llm
        .generate(&prompt, 0.2, 1500)
        .await
        .map_err(|e| PigenError::Tool(format!("Test run failed: {}", e)))?;
    let result = extract_json(&response)?;

    let mut verdict = TestRun {
        syntax_check: check_section(&result, "syntax_check")?,
        logic_consistency: check_section(&result, "logic_consistency")?,
        best_practices: check_section(&result, "best_practices")?,
        error_handling: check_section(&result, "error_handling")?,
        security: check_section(&result, "security")?,
        overall_result: result
            .get("overall_result")
            .and_then(|v| v.as_str())
            .ok_or_else(|| PigenError::Tool("Missing required section: overall_result".to_string()))?
            .to_string(),
        recommendations: result
            .get("recommendations")
            .and_then(|v| v.as_array())
            .map(|r| r.iter().filter_map(|s| s.as_str()).map(str::to_string).collect())
            .ok_or_else(|| PigenError::Tool("Missing required section: recommendations".to_string()))?,
        reasoning: result
            .get("reasoning")
            .and_then(|v| v.as_str())
            .ok_or_else(|| PigenError::Tool("Missing required section: reasoning".to_string()))?
            .to_string(),
    };

    if verdict.overall_result != "pass" && verdict.overall_result != "fail" {
        return Err(PigenError::Tool(
            "overall_result must be 'pass' or 'fail'".to_string(),
        ));
    }

    let local_issues = perform_local_security_checks(&args.code);
    if !local_issues.is_empty() {
        verdict.security.issues.extend(local_issues);
        verdict.security.passed = false;
        verdict.overall_result = "fail".to_string();
    }

    Ok(verdict)
}

fn check_section(result: &Value, name: &str) -> Result<CheckSection> {
    let section = result
        .get(name)
        .ok_or_else(|| PigenError::Tool(format!("Missing required section: {}", name)))?;
    let passed = section
        .get("passed")
        .and_then(|v| v.as_bool())
        .ok_or_else(|| PigenError::Tool(format!("Missing 'passed' field in {}", name)))?;
    let issues = section
        .get("issues")
        .and_then(|v| v.as_array())
        .map(|a| a.iter().filter_map(|s| s.as_str()).map(str::to_string).collect())
        .ok_or_else(|| PigenError::Tool(format!("Missing 'issues' field in {}", name)))?;
    Ok(CheckSection { passed, issues })
}

/// Scan code for security patterns the LLM review might miss.
///
/// Findings here are authoritative: they always fail the security check.
pub fn perform_local_security_checks(code: &str) -> Vec<String> {
    let mut issues = Vec::new();

    let credential_patterns = [
        r#"password\s*=\s*["'][^"']+["']"#,
        r#"password\s*:\s*["'][^"']+["']"#,
        r#"api_key\s*=\s*["'][^"']+["']"#,
        r#"auth_token\s*=\s*["'][^"']+["']"#,
        r#"secret\s*=\s*["'][^"']+["']"#,
    ];
    for pattern in credential_patterns {
        for m in case_insensitive(pattern).find_iter(code) {
            let excerpt: String = m.as_str().chars().take(50).collect();
            issues.push(format!("Potential hardcoded credential found: {}", excerpt));
        }
    }

    let sql_patterns = [
        r#"execute\(["'][^"']*%\s*\w+"#,
        r#"query\(["'][^"']*%\s*\w+"#,
        r#"execute\(["'][^"']+\+.*\)"#,
        r#"query\(["'][^"']+\+.*\)"#,
    ];
    for pattern in sql_patterns {
        for _ in case_insensitive(pattern).find_iter(code) {
            issues.push("Potential SQL injection risk: string formatting in SQL query".to_string());
        }
    }

    let dangerous_patterns = [r"eval\s*\(", r"exec\s*\(", r"__import__\s*\("];
    for pattern in dangerous_patterns {
        for m in case_insensitive(pattern).find_iter(code) {
            issues.push(format!("Dangerous code execution pattern: {}", m.as_str()));
        }
    }

    issues
}

fn case_insensitive(pattern: &str) -> regex::Regex {
    // Patterns are compile-time constants, so a build failure is a bug here.
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .unwrap_or_else(|e| panic!("invalid security check pattern {pattern:?}: {e}"))
}

/// Format a quality verdict as a TOOL_RESULT line.
pub fn format_output(result: &TestRun) -> String {
    let total_issues = result.syntax_check.issues.len()
        + result.logic_consistency.issues.len()
        + result.best_practices.issues.len()
        + result.error_handling.issues.len()
        + result.security.issues.len();

    let data = json!({
        "overall_result": result.overall_result,
        "syntax_check": result.syntax_check,
        "logic_consistency": result.logic_consistency,
        "best_practices": result.best_practices,
        "error_handling": result.error_handling,
        "security": result.security,
        "recommendations": result.recommendations,
        "reasoning": result.reasoning,
        "total_issues": total_issues,
    });
    success_tool_result("test_run", &data)
}
