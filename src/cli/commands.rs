//! CLI definitions using clap, plus the terminal progress observer.

use clap::Parser;
use colored::*;
use std::path::PathBuf;

use pigen::error::Result;
use pigen::runner::{IterationObserver, IterationRecord};

/// Pigen - agentic PI System code generation pipeline
#[derive(Parser, Debug)]
#[command(name = "pigen")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Natural language description of the code to generate
    pub request: String,

    /// Maximum number of pipeline iterations
    #[arg(short = 'i', long, default_value_t = 20)]
    pub max_iterations: u32,

    /// LLM provider override (gemini or openai); defaults to MODEL_TYPE
    #[arg(short, long)]
    pub provider: Option<String>,

    /// Path to a custom system prompt file
    #[arg(short, long)]
    pub system_prompt: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Check if verbose mode is enabled
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }
}

/// Prints each iteration to the terminal as the pipeline runs.
pub struct ProgressObserver {
    verbose: bool,
}

impl ProgressObserver {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }
}

impl IterationObserver for ProgressObserver {
    fn on_iteration(&self, record: &IterationRecord) -> Result<()> {
        if record.final_answer.is_some() {
            println!(
                "{} iteration {}: final answer received",
                "Done:".green(),
                record.iteration
            );
            return Ok(());
        }

        match (&record.tool_call, &record.tool_result) {
            (Some(call), Some(result)) => {
                let status = if result.contains("|status=error|") {
                    "failed".red()
                } else {
                    "ok".green()
                };
                println!(
                    "{} iteration {}: {} ... {}",
                    "Step:".cyan(),
                    record.iteration,
                    call.name,
                    status
                );
                if self.verbose {
                    println!("  {}", result.dimmed());
                }
            }
            _ => {
                println!(
                    "{} iteration {}: unrecognized response",
                    "Warn:".yellow(),
                    record.iteration
                );
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_request() {
        let cli = Cli::parse_from(["pigen", "read a tag value"]);
        assert_eq!(cli.request, "read a tag value");
        assert_eq!(cli.max_iterations, 20);
        assert!(!cli.is_verbose());
        assert!(cli.provider.is_none());
    }

    #[test]
    fn test_cli_parses_flags() {
        let cli = Cli::parse_from([
            "pigen",
            "task",
            "-i",
            "5",
            "--provider",
            "openai",
            "--verbose",
        ]);
        assert_eq!(cli.max_iterations, 5);
        assert_eq!(cli.provider.as_deref(), Some("openai"));
        assert!(cli.is_verbose());
    }

    #[test]
    fn test_observer_tolerates_any_record() {
        let observer = ProgressObserver::new(false);
        let record = IterationRecord {
            iteration: 1,
            llm_response: "prose".to_string(),
            tool_call: None,
            tool_result: None,
            final_answer: None,
        };
        assert!(observer.on_iteration(&record).is_ok());
    }
}
