//! File output tool - packages finished code with generated documentation,
//! a manifest and integrity hashes, then renders the final answer.

use chrono::Local;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use sha2::{Digest, Sha256};

use crate::error::{PigenError, Result};
use crate::llm::LlmClient;

use super::{append_context, extract_json, language_extension};

const FILE_OUTPUT_PROMPT: &str = r#"You are an expert technical writer specializing in PI System documentation.

Generated Code:
```{target_language}
{code}
```

Language: {target_language}
API: {selected_api}
Dependencies: {dependencies}

Generate comprehensive documentation in JSON format:

{
    "readme_content": "Complete README.md content with installation, usage, examples",
    "manifest_content": {
        "author": "PI System Code Generator",
        "version": "1.0.0",
        "description": "Brief description",
        "language": "{target_language}",
        "api": "{selected_api}",
        "dependencies": {dependencies},
        "requirements": "System requirements and prerequisites",
        "usage": "Basic usage instructions"
    }
}

Include in README:
1. Project title and description
2. Features
3. Installation/setup instructions
4. API reference (if applicable)
5. Usage examples
6. Configuration instructions
7. Error handling
8. Dependencies and requirements
9. Security considerations
10. Examples and screenshots (if applicable)

Return ONLY the JSON response, no additional text."#;

/// Arguments for the file output tool.
#[derive(Debug, Clone)]
pub struct FileOutputArgs {
    pub code: String,
    pub target_language: String,
    pub selected_api: String,
    pub dependencies: Vec<String>,
    /// Verdict from a prior test run, folded into the manifest when present.
    pub test_results: Option<Value>,
    pub context: Option<Value>,
}

/// A single packaged file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedFile {
    pub filename: String,
    pub content: String,
}

/// The final deliverable: code, README and manifest with sha256 hashes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileOutput {
    pub main_code: GeneratedFile,
    pub readme: GeneratedFile,
    pub manifest: GeneratedFile,
    pub code_hash: String,
    pub readme_hash: String,
    pub manifest_hash: String,
}

/// Package code into its final deliverable form.
///
/// Documentation comes from the LLM; the manifest it returns is enhanced
/// locally with a timestamp, code size metrics and any test results before
/// hashing.
pub async fn call(llm: &dyn LlmClient, args: &FileOutputArgs) -> Result<FileOutput> {
    let ext = language_extension(&args.target_language);
    let dependencies_json =
        serde_json::to_string_pretty(&args.dependencies).unwrap_or_else(|_| "[]".to_string());

    let mut prompt = FILE_OUTPUT_PROMPT
        .replace("{target_language}", &args.target_language)
        .replace("{code}", &args.code)
        .replace("{selected_api}", &args.selected_api)
        .replace("{dependencies}", &dependencies_json);
    append_context(&mut prompt, args.context.as_ref());

    let response = llm
        .generate(&prompt, 0.5, 2000)
        .await
        .map_err(|e| PigenError::Tool(format!("File output failed: {}", e)))?;
    let doc_result = extract_json(&response)?;

    let readme_content = doc_result
        .get("readme_content")
        .and_then(|v| v.as_str())
        .ok_or_else(|| PigenError::Tool("Missing readme_content in documentation".to_string()))?;
    let mut manifest = doc_result
        .get("manifest_content")
        .and_then(|v| v.as_object())
        .cloned()
        .ok_or_else(|| PigenError::Tool("Missing manifest_content in documentation".to_string()))?;

    manifest.insert("timestamp".to_string(), json!(Local::now().to_rfc3339()));
    manifest.insert("code_size_bytes".to_string(), json!(args.code.len()));
    manifest.insert("code_lines".to_string(), json!(args.code.lines().count().max(1)));

    if let Some(test_results) = &args.test_results {
        if let Some(overall) = test_results.get("overall_result").and_then(|v| v.as_str()) {
            manifest.insert("test_status".to_string(), json!(overall));
            manifest.insert(
                "quality_metrics".to_string(),
                json!({
                    "syntax_check_passed": section_passed(test_results, "syntax_check"),
                    "logic_check_passed": section_passed(test_results, "logic_consistency"),
                    "best_practices_passed": section_passed(test_results, "best_practices"),
                    "error_handling_passed": section_passed(test_results, "error_handling"),
                    "security_passed": section_passed(test_results, "security"),
                }),
            );
        }
    }

    let manifest_content = serde_json::to_string_pretty(&manifest)?;

    Ok(FileOutput {
        code_hash: sha256_hex(&args.code),
        readme_hash: sha256_hex(readme_content),
        manifest_hash: sha256_hex(&manifest_content),
        main_code: GeneratedFile {
            filename: format!("pi_code{}", ext),
            content: args.code.clone(),
        },
        readme: GeneratedFile {
            filename: "README.md".to_string(),
            content: readme_content.to_string(),
        },
        manifest: GeneratedFile {
            filename: "manifest.json".to_string(),
            content: manifest_content,
        },
    })
}

fn section_passed(test_results: &Value, section: &str) -> Value {
    test_results
        .get(section)
        .and_then(|s| s.get("passed"))
        .cloned()
        .unwrap_or(Value::Null)
}

fn sha256_hex(content: &str) -> String {
    hex::encode(Sha256::digest(content.as_bytes()))
}

/// Render the package as the run's FINAL_ANSWER.
///
/// Unlike the other tools this formatter emits FINAL_ANSWER directly:
/// packaging is the terminal pipeline step, so its success output ends the
/// run rather than feeding another iteration.
pub fn format_output(result: &FileOutput) -> String {
    let manifest: Value = serde_json::from_str(&result.manifest.content).unwrap_or(Value::Null);
    let language = manifest
        .get("language")
        .and_then(|v| v.as_str())
        .unwrap_or("text");

    let mut lines = Vec::new();
    lines.push("# Generated PI System Code Package\n".to_string());

    lines.push("## Metadata\n".to_string());
    lines.push(format!("- Language: {}", language));
    lines.push(format!(
        "- API: {}",
        manifest.get("api").and_then(|v| v.as_str()).unwrap_or("unknown")
    ));
    lines.push(format!(
        "- Version: {}",
        manifest.get("version").and_then(|v| v.as_str()).unwrap_or("1.0.0")
    ));
    lines.push(format!(
        "- Generated: {}\n",
        manifest.get("timestamp").and_then(|v| v.as_str()).unwrap_or("")
    ));

    lines.push(format!("## Main Code ({})\n", result.main_code.filename));
    lines.push(format!("```{}", language.to_lowercase()));
    lines.push(result.main_code.content.clone());
    lines.push("```\n".to_string());

    if let Some(deps) = manifest.get("dependencies").and_then(|v| v.as_array()) {
        if !deps.is_empty() {
            lines.push("## Dependencies\n".to_string());
            for dep in deps {
                lines.push(format!("- {}", dep.as_str().unwrap_or_default()));
            }
            lines.push(String::new());
        }
    }

    if let Some(status) = manifest.get("test_status").and_then(|v| v.as_str()) {
        lines.push("## Quality Checks\n".to_string());
        lines.push(format!("- Overall Status: {}", status.to_uppercase()));
        lines.push(String::new());
    }

    lines.push("## Documentation\n".to_string());
    lines.push(result.readme.content.clone());

    lines.push("\n## File Integrity\n".to_string());
    lines.push(format!("- main_code: {}...", &result.code_hash[..16]));
    lines.push(format!("- readme: {}...", &result.readme_hash[..16]));
    lines.push(format!("- manifest: {}...", &result.manifest_hash[..16]));

    format!("FINAL_ANSWER: {}", lines.join("\n"))
}
