//! Parsed protocol actions.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A request from the model to invoke one of the pipeline tools.
///
/// Ephemeral: parsed from a single response and consumed immediately by the
/// dispatcher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    pub arguments: Map<String, Value>,
}

impl FunctionCall {
    /// Create a new function call
    pub fn new(name: impl Into<String>, arguments: Map<String, Value>) -> Self {
        Self {
            name: name.into(),
            arguments,
        }
    }

    /// Get an argument by key
    pub fn arg(&self, key: &str) -> Option<&Value> {
        self.arguments.get(key)
    }

    /// Get an argument as a string slice, if present and a string
    pub fn str_arg(&self, key: &str) -> Option<&str> {
        self.arguments.get(key).and_then(|v| v.as_str())
    }

    /// Set an argument, overwriting any existing value
    pub fn set_arg(&mut self, key: impl Into<String>, value: Value) {
        self.arguments.insert(key.into(), value);
    }

    /// True when the argument is absent or explicitly null
    pub fn arg_is_unset(&self, key: &str) -> bool {
        matches!(self.arguments.get(key), None | Some(Value::Null))
    }
}

/// A decoded model response: either a tool invocation or the terminal answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Action {
    FunctionCall(FunctionCall),
    FinalAnswer(String),
}

impl Action {
    /// Get the function call, if this action is one
    pub fn as_function_call(&self) -> Option<&FunctionCall> {
        match self {
            Action::FunctionCall(call) => Some(call),
            Action::FinalAnswer(_) => None,
        }
    }

    /// Get the final answer text, if this action is one
    pub fn as_final_answer(&self) -> Option<&str> {
        match self {
            Action::FinalAnswer(text) => Some(text),
            Action::FunctionCall(_) => None,
        }
    }
}
