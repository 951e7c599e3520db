use crate::models::Run;
use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Output format options
#[derive(Debug, Clone, ValueEnum, Serialize, Deserialize)]
pub enum OutputFormat {
    Plain,
    Json,
}

/// Print a scoring run in the specified format
pub fn print_run(run: &Run, format: OutputFormat) {
    match format {
        OutputFormat::Plain => print_plain(run),
        OutputFormat::Json => print_json(run),
    }
}

/// Print a run in plain text format
fn print_plain(run: &Run) {
    println!("📊 OVERALL SCORES");
    println!("-----------------");
    if run.overall_scores.is_empty() {
        println!("No scores available.");
    } else {
        let mut names: Vec<_> = run.overall_scores.keys().collect();
        names.sort();

        println!("{:<25} {:<8}", "Metric", "Mean");
        println!("{}", "-".repeat(34));
        for name in names {
            println!("{:<25} {:<8.3}", name, run.overall_scores[name]);
        }
    }
    println!();

    println!("📝 DETAILED RESULTS");
    println!("-------------------");
    for (i, data) in run.run_data.iter().enumerate() {
        println!("Item #{}", i + 1);
        println!("Question: {}", data.question);
        println!("Reference answer: {}", data.reference_answer);
        println!("LLM answer: {}", data.llm_answer);
        println!("Scores:");
        let mut names: Vec<_> = data.scores.keys().collect();
        names.sort();
        for name in names {
            println!("  • {}: {:.3}", name, data.scores[name]);
        }
        println!();
    }
}

/// Print a run in JSON format
fn print_json(run: &Run) {
    match serde_json::to_string_pretty(run) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Error serializing run to JSON: {}", e),
    }
}

/// Store a run as pretty-printed JSON, creating parent directories as needed
pub fn store_run(run: &Run, path: &str) -> Result<()> {
    let json_content =
        serde_json::to_string_pretty(run).context("Failed to serialize run to JSON")?;

    if let Some(parent) = Path::new(path).parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    std::fs::write(path, json_content)
        .with_context(|| format!("Failed to write run to: {}", path))?;

    println!("Run stored to: {}", path);
    Ok(())
}
