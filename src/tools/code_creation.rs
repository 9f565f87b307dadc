//! Code creation tool - generates implementation code in the target
//! language from pseudo-code and data structure definitions.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::error::{PigenError, Result};
use crate::llm::LlmClient;
use crate::protocol::success_tool_result;

use super::{append_context, extract_json, normalize_language};

const CODE_CREATION_PROMPT: &str = r#"You are an expert software engineer specializing in the PI System and {target_language} programming.

Selected API: {selected_api}
Target Language: {target_language}

Pseudo-Code Steps:
{formatted_steps}

Data Structures:
{formatted_data_structures}

Error Handling Strategy:
{error_handling_strategy}

Generate complete, production-ready implementation code in {target_language} that:
1. Implements ALL pseudo-code steps in order
2. Uses proper {target_language} syntax and conventions
3. Implements the error handling strategy described
4. Uses appropriate {selected_api} patterns and best practices
5. Includes proper imports/using statements
6. Adds code comments for clarity
7. NEVER includes hardcoded credentials or secrets
8. Uses configuration variables for server names, usernames, passwords

Your response MUST be a JSON object with the following structure:
{
    "code": "Complete implementation code as a string",
    "dependencies": [
        "Required package/library 1",
        "Required package/library 2"
    ],
    "usage_example": "Brief example of how to use this code",
    "reasoning": "Brief explanation of implementation choices"
}

Code Quality Requirements:
- Syntactically correct
- Follows language best practices
- Proper resource management (connections, streams, etc.)
- Secure credential handling
- Adequate error handling
- Clear variable naming
- Helpful comments

Return ONLY the JSON response, no additional text."#;

/// Arguments for the code creation tool.
#[derive(Debug, Clone)]
pub struct CodeCreationArgs {
    pub pseudo_code: Vec<String>,
    pub data_structures: Vec<Value>,
    pub error_handling_strategy: String,
    pub selected_api: String,
    pub target_language: String,
    pub context: Option<Value>,
}

/// Successfully generated implementation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodeCreation {
    pub code: String,
    pub dependencies: Vec<String>,
    pub usage_example: String,
    pub reasoning: String,
}

/// Generate implementation code from the decomposed logic.
pub async fn call(llm: &dyn LlmClient, args: &CodeCreationArgs) -> Result<CodeCreation> {
    let target_language = normalize_language(&args.target_language)
        .ok_or_else(|| PigenError::Tool(format!("Unsupported language: {}", args.target_language)))?;

    let formatted_steps: String = args
        .pseudo_code
        .iter()
        .enumerate()
        .map(|(i, step)| format!("{}. {}", i + 1, step))
        .collect::<Vec<_>>()
        .join("\n");
    let formatted_data_structures =
        serde_json::to_string_pretty(&args.data_structures).unwrap_or_else(|_| "[]".to_string());

    let mut prompt = CODE_CREATION_PROMPT
        .replace("{target_language}", target_language)
        .replace("{selected_api}", &args.selected_api)
        .replace("{formatted_steps}", &formatted_steps)
        .replace("{formatted_data_structures}", &formatted_data_structures)
        .replace("{error_handling_strategy}", &args.error_handling_strategy);
    append_context(&mut prompt, args.context.as_ref());

    let response = llm
        .generate(&prompt, 0.3, 2000)
        .await
        .map_err(|e| PigenError::Tool(format!("Code creation failed: {}", e)))?;
    let result = extract_json(&response)?;

    let code = result
        .get("code")
        .and_then(|v| v.as_str())
        .ok_or_else(|| PigenError::Tool("Missing required field: code".to_string()))?;
    if code.trim().is_empty() {
        return Err(PigenError::Tool("Generated code is empty".to_string()));
    }

    let dependencies: Vec<String> = result
        .get("dependencies")
        .and_then(|v| v.as_array())
        .map(|deps| deps.iter().filter_map(|d| d.as_str()).map(str::to_string).collect())
        .ok_or_else(|| PigenError::Tool("dependencies must be a list".to_string()))?;

    let usage_example = result
        .get("usage_example")
        .and_then(|v| v.as_str())
        .ok_or_else(|| PigenError::Tool("Missing required field: usage_example".to_string()))?;
    let reasoning = result
        .get("reasoning")
        .and_then(|v| v.as_str())
        .ok_or_else(|| PigenError::Tool("Missing required field: reasoning".to_string()))?;

    Ok(CodeCreation {
        code: code.to_string(),
        dependencies,
        usage_example: usage_example.to_string(),
        reasoning: reasoning.to_string(),
    })
}

/// Format generated code as a TOOL_RESULT line. Pipes and newlines in the
/// code survive transit as JSON string escapes.
pub fn format_output(result: &CodeCreation) -> String {
    let data = json!({
        "code": result.code,
        "dependencies": result.dependencies,
        "usage_example": result.usage_example,
        "reasoning": result.reasoning,
    });
    success_tool_result("code_creation", &data)
}
