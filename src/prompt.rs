//! System prompt loading.
//!
//! The orchestrator's system prompt lives in `system_prompt.md` next to the
//! working directory. When the file is missing or unreadable we fall back to a
//! minimal built-in prompt so a run can still proceed.

use std::path::Path;

/// Built-in fallback when system_prompt.md cannot be read.
pub const FALLBACK_SYSTEM_PROMPT: &str = "You are a code-generation assistant for the AVEVA PI system.";

/// Default system prompt file name, resolved against the current directory.
pub const SYSTEM_PROMPT_FILE: &str = "system_prompt.md";

/// Load the system prompt from `system_prompt.md`, falling back to the
/// built-in prompt on any error.
pub fn load_system_prompt() -> String {
    load_system_prompt_from(Path::new(SYSTEM_PROMPT_FILE))
}

/// Load the system prompt from an explicit path.
pub fn load_system_prompt_from(path: &Path) -> String {
    match std::fs::read_to_string(path) {
        Ok(contents) => {
            log::info!("Loaded system prompt from {}", path.display());
            contents
        }
        Err(e) => {
            log::warn!("Could not load {}: {}. Using fallback prompt.", path.display(), e);
            FALLBACK_SYSTEM_PROMPT.to_string()
        }
    }
}
