//! Pigen - agentic code generation for the AVEVA PI System
//!
//! Pigen drives a five-stage code-generation pipeline (API selection, logic
//! creation, code creation, test run, file output) by looping an LLM over a
//! small line-oriented text protocol: the model replies with either a
//! `FUNCTION_CALL` to invoke a pipeline tool or a `FINAL_ANSWER` that ends
//! the run.

pub mod config;
pub mod error;
pub mod llm;
pub mod prompt;
pub mod protocol;
pub mod runner;
pub mod tools;

pub use error::{PigenError, Result};
