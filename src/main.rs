use clap::Parser;
use colored::*;
use eyre::{Context, Result, eyre};
use log::info;
use std::fs;
use std::path::PathBuf;

mod cli;

use cli::{Cli, ProgressObserver};
use pigen::config::{LlmProvider, LlmSettings};
use pigen::llm::client_from_settings;
use pigen::prompt::{load_system_prompt, load_system_prompt_from};
use pigen::runner::{Orchestrator, OrchestratorConfig};

fn setup_logging() -> Result<()> {
    // Create log directory
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("pigen")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    let log_file = log_dir.join("pigen.log");

    // Setup env_logger with file output
    let target = Box::new(
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
            .context("Failed to open log file")?,
    );

    env_logger::Builder::from_default_env()
        .target(env_logger::Target::Pipe(target))
        .init();

    info!("Logging initialized, writing to: {}", log_file.display());
    Ok(())
}

fn build_settings(cli: &Cli) -> Result<LlmSettings> {
    let settings = match cli.provider.as_deref() {
        Some(name) => {
            let provider = match name.to_lowercase().as_str() {
                "gemini" => LlmProvider::Gemini,
                "openai" => LlmProvider::OpenAi,
                other => return Err(eyre!("Unknown provider: {} (expected gemini or openai)", other)),
            };
            LlmSettings::for_provider(provider)
        }
        None => LlmSettings::from_env(),
    };
    settings.context("Failed to build LLM settings")
}

#[tokio::main]
async fn main() -> Result<()> {
    setup_logging()?;

    let cli = Cli::parse();

    if cli.is_verbose() {
        println!("{}", "Verbose mode enabled".yellow());
    }

    let settings = build_settings(&cli)?;
    info!("Using provider: {:?} model: {}", settings.provider, settings.model);
    println!("{} {} ({})", "Provider:".cyan(), format!("{:?}", settings.provider), settings.model);

    let llm = client_from_settings(&settings).context("Failed to build LLM client")?;

    let system_prompt = match &cli.system_prompt {
        Some(path) => load_system_prompt_from(path),
        None => load_system_prompt(),
    };

    let orchestrator = Orchestrator::new(
        llm,
        system_prompt,
        OrchestratorConfig {
            max_iterations: cli.max_iterations,
            ..OrchestratorConfig::default()
        },
    );

    println!("{} {}", "Request:".cyan(), cli.request);
    let observer = ProgressObserver::new(cli.is_verbose());
    let result = orchestrator.run(&cli.request, &observer).await;

    if result.status.is_success() {
        let answer = result.final_answer.unwrap_or_default();
        println!("\n{}\n", "=== Final Answer ===".green().bold());
        println!("{}", answer);
        Ok(())
    } else {
        let message = result
            .error_msg
            .unwrap_or_else(|| "pipeline failed without an error message".to_string());
        println!("\n{} {}", "Failed:".red().bold(), message);
        println!("Completed {} iteration(s) before stopping", result.iterations.len());
        Err(eyre!(message))
    }
}
