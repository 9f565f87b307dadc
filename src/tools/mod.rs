//! The five pipeline tools and their dispatcher.
//!
//! Each tool is a single prompt-templated LLM call with JSON-shaped output:
//! typed arguments in, typed result out, plus a formatter that produces the
//! TOOL_RESULT (or, for `file_output`, FINAL_ANSWER) wire form. The
//! dispatcher routes decoded function calls to the right tool and normalizes
//! their arguments.

pub mod api_selection;
pub mod code_creation;
pub mod file_output;
pub mod logic_creation;
pub mod router;
pub mod test_run;

use serde_json::Value;

use crate::error::{PigenError, Result};

pub use router::{DispatchState, ToolDispatcher};

/// Supported target languages and their file extensions.
pub const SUPPORTED_LANGUAGES: [(&str, &str); 8] = [
    ("C#", ".cs"),
    ("Python", ".py"),
    ("VB.NET", ".vb"),
    ("JavaScript", ".js"),
    ("TypeScript", ".ts"),
    ("Java", ".java"),
    ("PowerShell", ".ps1"),
    ("C++", ".cpp"),
];

/// Map a language name to its canonical casing, case-insensitively.
/// `powershell` becomes `PowerShell`; unknown names yield `None`.
pub fn normalize_language(value: &str) -> Option<&'static str> {
    let value = value.trim();
    SUPPORTED_LANGUAGES
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(value))
        .map(|(name, _)| *name)
}

/// File extension for a target language, defaulting to `.txt`.
pub fn language_extension(language: &str) -> &'static str {
    SUPPORTED_LANGUAGES
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(language))
        .map(|(_, ext)| *ext)
        .unwrap_or(".txt")
}

/// Extract the JSON object embedded in an LLM response.
///
/// Models are asked to return only JSON but often wrap it in prose or code
/// fences, so this takes the substring from the first `{` to the last `}`.
pub fn extract_json(response_text: &str) -> Result<Value> {
    let start = response_text
        .find('{')
        .ok_or_else(|| PigenError::Tool("No JSON found in response".to_string()))?;
    let end = response_text
        .rfind('}')
        .ok_or_else(|| PigenError::Tool("No JSON found in response".to_string()))?;
    if end < start {
        return Err(PigenError::Tool("No JSON found in response".to_string()));
    }

    serde_json::from_str(&response_text[start..=end])
        .map_err(|e| PigenError::Tool(format!("Failed to parse JSON response: {}", e)))
}

/// Append the carried context to a tool prompt, pretty-printed so the model
/// can read it.
pub fn append_context(prompt: &mut String, context: Option<&Value>) {
    if let Some(context) = context {
        let context_str = serde_json::to_string_pretty(context).unwrap_or_else(|_| context.to_string());
        prompt.push_str(&format!("\n\nAdditional Context:\n{}", context_str));
    }
}
