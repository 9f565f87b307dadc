//! Text protocol between the orchestrator and the LLM.
//!
//! The wire forms are line-structured and deliberately small:
//! - `FUNCTION_CALL: <name>|<key>=<value>|...` - request to invoke a tool
//! - `FINAL_ANSWER: <free text>` - terminal output of a run
//! - `TOOL_RESULT: <name>|status=...|data=<json>|...` - tool result echoed
//!   back into the next prompt
//!
//! The parser is forgiving of the formatting drift real models produce
//! (extra whitespace, quoting style); anything without one of the two
//! response markers is rejected.

pub mod parser;
pub mod types;
pub mod wire;

pub use parser::{parse_final_answer, parse_function_call, parse_response, parse_tool_result_data};
pub use types::{Action, FunctionCall};
pub use wire::{build_prompt, error_tool_result, success_tool_result};
