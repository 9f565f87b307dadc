//! Response decoding: FINAL_ANSWER / FUNCTION_CALL detection and the
//! argument value coercion chain.
//!
//! Coercion runs an explicit ordered chain of parsers, first success wins:
//! 1. JSON arrays/objects
//! 2. quoted strings (JSON escape semantics for double quotes)
//! 3. true/false/null/none keywords (case-insensitive)
//! 4. bare JSON values (numbers)
//! 5. raw string
//!
//! Later stages assume earlier ones failed, so the order is load-bearing.

use serde_json::{Map, Value};

use super::types::{Action, FunctionCall};

/// Marker for a terminal answer.
pub const FINAL_ANSWER_MARKER: &str = "FINAL_ANSWER:";

/// Marker for a tool invocation request.
pub const FUNCTION_CALL_MARKER: &str = "FUNCTION_CALL:";

/// Marker for a tool result line.
pub const TOOL_RESULT_MARKER: &str = "TOOL_RESULT:";

/// Decode a model response into an action.
///
/// FINAL_ANSWER is attempted first and wins if present anywhere; a response
/// matching neither marker decodes to `None`, which the loop treats as a
/// fatal protocol error.
pub fn parse_response(text: &str) -> Option<Action> {
    if let Some(answer) = parse_final_answer(text) {
        return Some(Action::FinalAnswer(answer));
    }
    parse_function_call(text).map(Action::FunctionCall)
}

/// Find a marker anchored at the start of a line (leading whitespace on the
/// line is tolerated). Returns the byte offset just past the marker.
///
/// Only FINAL_ANSWER needs the anchor: its payload is free text that may
/// legitimately quote the markers, so a bare substring match would
/// misfire.
fn find_marker(text: &str, marker: &str) -> Option<usize> {
    let mut line_start = 0;
    loop {
        let line_end = text[line_start..]
            .find('\n')
            .map(|i| line_start + i)
            .unwrap_or(text.len());
        let line = &text[line_start..line_end];
        let trimmed = line.trim_start();
        if trimmed.starts_with(marker) {
            let leading = line.len() - trimmed.len();
            return Some(line_start + leading + marker.len());
        }
        if line_end == text.len() {
            return None;
        }
        line_start = line_end + 1;
    }
}

/// Extract the final answer from a response, if present.
///
/// Everything after the marker (across lines) is the answer. An empty answer
/// does not count as a final answer.
pub fn parse_final_answer(text: &str) -> Option<String> {
    let start = find_marker(text, FINAL_ANSWER_MARKER)?;
    let answer = text[start..].trim();
    if answer.is_empty() {
        None
    } else {
        Some(answer.to_string())
    }
}

/// Extract a function call from a response, if present.
///
/// Grammar: `FUNCTION_CALL: <name>|<key>=<value>|...` - the name runs to the
/// first `|` or newline; the remaining `|`-delimited segments are key=value
/// pairs. Segments without `=` are skipped. The marker is accepted anywhere
/// in the text, not just at a line start - models routinely lead with prose
/// on the same line.
pub fn parse_function_call(text: &str) -> Option<FunctionCall> {
    let start = text.find(FUNCTION_CALL_MARKER)? + FUNCTION_CALL_MARKER.len();
    let rest = &text[start..];

    let name_end = rest.find(['|', '\n']).unwrap_or(rest.len());
    let name = rest[..name_end].trim();
    if name.is_empty() {
        return None;
    }

    let mut arguments = Map::new();
    for segment in rest[name_end..].split('|') {
        let segment = segment.trim();
        if segment.is_empty() {
            continue;
        }
        if let Some((key, value)) = segment.split_once('=') {
            arguments.insert(key.trim().to_string(), coerce_value(value.trim()));
        }
    }

    Some(FunctionCall::new(name, arguments))
}

/// Coerce a raw argument value through the ordered parser chain.
pub fn coerce_value(value: &str) -> Value {
    let value = value.trim();
    parse_json_container(value)
        .or_else(|| parse_quoted(value))
        .or_else(|| parse_keyword(value))
        .or_else(|| parse_bare_json(value))
        .unwrap_or_else(|| Value::String(value.to_string()))
}

/// Stage 1: JSON arrays and objects.
fn parse_json_container(value: &str) -> Option<Value> {
    let looks_structured = (value.starts_with('[') && value.ends_with(']'))
        || (value.starts_with('{') && value.ends_with('}'));
    if !looks_structured {
        return None;
    }
    serde_json::from_str(value).ok()
}

/// Stage 2: quoted strings.
///
/// Double quotes go through JSON decoding so escape sequences resolve,
/// falling back to naive stripping when that fails; single quotes are just
/// stripped.
fn parse_quoted(value: &str) -> Option<Value> {
    if value.len() >= 2 && value.starts_with('"') && value.ends_with('"') {
        let unquoted = serde_json::from_str::<String>(value)
            .unwrap_or_else(|_| value[1..value.len() - 1].to_string());
        return Some(Value::String(unquoted));
    }
    if value.len() >= 2 && value.starts_with('\'') && value.ends_with('\'') {
        return Some(Value::String(value[1..value.len() - 1].to_string()));
    }
    None
}

/// Stage 3: boolean and null keywords, case-insensitive.
fn parse_keyword(value: &str) -> Option<Value> {
    match value.to_lowercase().as_str() {
        "true" => Some(Value::Bool(true)),
        "false" => Some(Value::Bool(false)),
        "null" | "none" => Some(Value::Null),
        _ => None,
    }
}

/// Stage 4: bare JSON values. This is where unquoted numerals become
/// numbers: `5` decodes as the integer 5, not the string "5".
fn parse_bare_json(value: &str) -> Option<Value> {
    if value.is_empty() {
        return None;
    }
    serde_json::from_str(value).ok()
}

/// Extract the `data=` payload from a TOOL_RESULT wire string.
///
/// The payload runs from `data=` to the next `|` or end of string and must be
/// valid JSON. Any structural or JSON failure yields `None` - context is an
/// optimization, never an error.
pub fn parse_tool_result_data(tool_result: &str) -> Option<Value> {
    if !tool_result.starts_with(TOOL_RESULT_MARKER) {
        return None;
    }

    let data_start = tool_result.find("data=")? + "data=".len();
    let data_end = tool_result[data_start..]
        .find('|')
        .map(|i| data_start + i)
        .unwrap_or(tool_result.len());

    let data_json = &tool_result[data_start..data_end];
    if data_json.is_empty() {
        return None;
    }

    serde_json::from_str(data_json).ok()
}
