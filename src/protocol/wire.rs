//! Wire encoding: prompt assembly and TOOL_RESULT formatting.

use serde_json::Value;

/// Assemble the prompt for one iteration.
///
/// Fixed order: system prompt, user request, the immediately preceding model
/// response and tool result (when present), then the trailing instruction.
/// Only one step of history is carried - the loop never keeps more.
pub fn build_prompt(
    system_prompt: &str,
    user_prompt: &str,
    last_llm_response: Option<&str>,
    last_tool_result: Option<&str>,
) -> String {
    let mut parts = vec![
        system_prompt.to_string(),
        format!("\n\nUser Request: {}", user_prompt),
    ];

    if let Some(response) = last_llm_response.filter(|r| !r.is_empty()) {
        parts.push(format!("\n\nLast LLM Response:\n{}", response));
    }

    if let Some(result) = last_tool_result.filter(|r| !r.is_empty()) {
        parts.push(format!("\n\nLast Tool Result:\n{}", result));
    }

    parts.push("\n\nRespond with FUNCTION_CALL or FINAL_ANSWER.".to_string());

    parts.join("\n")
}

/// Format a successful tool result.
///
/// `data` is serialized as compact JSON. A literal `|` can only occur inside
/// a JSON string, and it would split the data segment on decode, so it is
/// re-escaped as `\u007c` - the payload stays valid JSON and round-trips.
pub fn success_tool_result(tool_name: &str, data: &Value) -> String {
    let json = data.to_string().replace('|', "\\u007c");
    format!("TOOL_RESULT: {}|status=success|data={}", tool_name, json)
}

/// Format a failed tool result: empty data segment plus a human-readable
/// message.
pub fn error_tool_result(tool_name: &str, error_msg: &str) -> String {
    format!("TOOL_RESULT: {}|status=error|data=|error_msg={}", tool_name, error_msg)
}
