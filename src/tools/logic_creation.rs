//! Logic creation tool - turns a user request plus a selected API into
//! step-by-step pseudo-code, data structures and an error handling strategy.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::error::{PigenError, Result};
use crate::llm::LlmClient;
use crate::protocol::success_tool_result;

use super::{append_context, extract_json};

const LOGIC_CREATION_PROMPT: &str = r#"You are an expert software engineer specializing in the PI System.

Selected API: {selected_api}
User Request: {user_request}

Convert this request into detailed, step-by-step pseudo-code that can be implemented using the selected API.

Your response MUST be a JSON object with the following structure:
{
    "pseudo_code": [
        "Step 1: Description of the first logical operation",
        "Step 2: Description of the second logical operation",
        "..."
    ],
    "data_structures": [
        {
            "name": "variable_name",
            "type": "data_type",
            "description": "purpose of this structure"
        }
    ],
    "error_handling_strategy": "Description of how errors will be handled",
    "reasoning": "Brief explanation of the logical flow"
}

Guidelines:
- Break down the request into atomic, unambiguous operations
- Order steps in correct logical sequence
- Define all necessary data structures
- Specify error handling at critical points
- Use language-agnostic pseudo-code (no specific syntax)
- Consider PI API best practices for {selected_api}

Return ONLY the JSON response, no additional text."#;

/// Arguments for the logic creation tool.
#[derive(Debug, Clone)]
pub struct LogicCreationArgs {
    pub user_request: String,
    pub selected_api: String,
    pub context: Option<Value>,
}

/// Successful logical decomposition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogicCreation {
    pub pseudo_code: Vec<String>,
    /// Raw data structure definitions; kept loose because the model may add
    /// fields beyond name/type/description.
    pub data_structures: Vec<Value>,
    pub error_handling_strategy: String,
    pub reasoning: String,
}

/// Decompose the request into pseudo-code for the selected API.
pub async fn call(llm: &dyn LlmClient, args: &LogicCreationArgs) -> Result<LogicCreation> {
    let mut prompt = LOGIC_CREATION_PROMPT
        .replace("{selected_api}", &args.selected_api)
        .replace("{user_request}", &args.user_request);
    append_context(&mut prompt, args.context.as_ref());

    let response = llm
        .generate(&prompt, 0.5, 1000)
        .await
        .map_err(|e| PigenError::Tool(format!("Logic creation failed: {}", e)))?;
    let result = extract_json(&response)?;

    let pseudo_code: Vec<String> = result
        .get("pseudo_code")
        .and_then(|v| v.as_array())
        .map(|steps| {
            steps
                .iter()
                .filter_map(|s| s.as_str())
                .map(str::to_string)
                .collect()
        })
        .ok_or_else(|| PigenError::Tool("Missing required field: pseudo_code".to_string()))?;
    if pseudo_code.is_empty() {
        return Err(PigenError::Tool("pseudo_code must not be empty".to_string()));
    }

    let data_structures = result
        .get("data_structures")
        .and_then(|v| v.as_array())
        .cloned()
        .ok_or_else(|| PigenError::Tool("Missing required field: data_structures".to_string()))?;

    let error_handling_strategy = required_str(&result, "error_handling_strategy")?;
    let reasoning = required_str(&result, "reasoning")?;

    Ok(LogicCreation {
        pseudo_code,
        data_structures,
        error_handling_strategy,
        reasoning,
    })
}

fn required_str(result: &Value, field: &str) -> Result<String> {
    result
        .get(field)
        .and_then(|v| v.as_str())
        .map(str::to_string)
        .ok_or_else(|| PigenError::Tool(format!("Missing required field: {}", field)))
}

/// Format a decomposition as a TOOL_RESULT line.
pub fn format_output(result: &LogicCreation) -> String {
    let data = json!({
        "pseudo_code": result.pseudo_code,
        "data_structures": result.data_structures,
        "error_handling_strategy": result.error_handling_strategy,
        "reasoning": result.reasoning,
    });
    success_tool_result("logic_creation", &data)
}
