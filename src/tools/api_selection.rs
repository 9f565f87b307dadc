//! API selection tool - picks the most appropriate PI System API for a
//! user request.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::error::{PigenError, Result};
use crate::llm::LlmClient;
use crate::protocol::success_tool_result;

use super::{append_context, extract_json};

/// The PI System APIs the pipeline can target.
pub const AVAILABLE_APIS: [&str; 5] = [
    "PI SDK",
    "PI AF SDK",
    "PI Web API",
    "PI SQL Client",
    "Powershell Tools for PI",
];

const API_SELECTION_PROMPT: &str = r#"You are an expert PI System API selection assistant.

Available PI System APIs:
1. PI SDK - Server-side, high performance data access, reads/writes to PI Data Archive
2. PI AF SDK - Asset Framework operations, hierarchical data navigation, asset-centric access
3. PI Web API - RESTful, cross-platform, web/mobile applications, microservices
4. PI SQL Client - Direct database queries, custom reporting, data mining
5. Powershell Tools for PI - Administrative scripting, collective management, bulk operations

User Request: {user_request}

Select the MOST APPROPRIATE API based on the user's request.

Your response MUST be a JSON object with the following structure:
{
    "selected_api": "API_NAME",
    "reasoning": "Brief explanation of why this API is the best choice"
}

Consider:
- Performance requirements
- Platform compatibility needs
- Type of operations needed (read, write, query, etc.)
- Deployment environment
- Integration requirements

Return ONLY the JSON response, no additional text."#;

/// Arguments for the API selection tool.
#[derive(Debug, Clone)]
pub struct ApiSelectionArgs {
    pub user_request: String,
    pub context: Option<Value>,
}

/// Successful API selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiSelection {
    pub selected_api: String,
    pub reasoning: String,
}

/// Select the most appropriate PI System API for the request.
pub async fn call(llm: &dyn LlmClient, args: &ApiSelectionArgs) -> Result<ApiSelection> {
    let mut prompt = API_SELECTION_PROMPT.replace("{user_request}", &args.user_request);
    append_context(&mut prompt, args.context.as_ref());

    let response = llm
        .generate(&prompt, 0.3, 500)
        .await
        .map_err(|e| PigenError::Tool(format!("API selection failed: {}", e)))?;
    let result = extract_json(&response)?;

    let selected_api = result
        .get("selected_api")
        .and_then(|v| v.as_str())
        .ok_or_else(|| PigenError::Tool("Invalid response structure".to_string()))?;
    let reasoning = result
        .get("reasoning")
        .and_then(|v| v.as_str())
        .ok_or_else(|| PigenError::Tool("Invalid response structure".to_string()))?;

    if !AVAILABLE_APIS.contains(&selected_api) {
        return Err(PigenError::Tool(format!("Unknown API selected: {}", selected_api)));
    }

    Ok(ApiSelection {
        selected_api: selected_api.to_string(),
        reasoning: reasoning.to_string(),
    })
}

/// Format a selection as a TOOL_RESULT line.
pub fn format_output(result: &ApiSelection) -> String {
    let data = json!({
        "selected_api": result.selected_api,
        "reasoning": result.reasoning,
    });
    success_tool_result("api_selection", &data)
}
