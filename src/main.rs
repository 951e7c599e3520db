use anyhow::{Result, anyhow};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use ragmark::benchmark::Benchmark;
use ragmark::config::Config;
use ragmark::judge::OpenAiChat;
use ragmark::metrics::{Metric, default_metrics, metric_by_name};
use ragmark::output::{self, OutputFormat};
use ragmark::scorer::Scorer;

/// System prompt for answer generation
const ANSWER_SYSTEM_PROMPT: &str = "Answer the question directly and concisely.";

/// RAG Benchmark Scoring CLI - Generate answers for a benchmark and score them
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the TOML configuration file
    run_file: PathBuf,

    /// Output format: plain or json
    #[arg(short, long, default_value = "plain")]
    output: OutputFormat,

    /// Verbose output - show progress for each API request
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = Config::from_file(&args.run_file)?;
    let benchmark = Benchmark::from_file(Path::new(&config.benchmark))?;

    let metrics: Vec<Arc<dyn Metric>> = if config.metrics.is_empty() {
        default_metrics()
    } else {
        config
            .metrics
            .iter()
            .map(|name| metric_by_name(name).ok_or_else(|| anyhow!("Unknown metric: {name}")))
            .collect::<Result<_>>()?
    };

    let chat = Arc::new(OpenAiChat::new(
        &config.api_endpoint,
        &config.env_var_api_key,
    )?);
    let scorer = Scorer::with_chat(metrics, config.judge_model.clone(), chat.clone());

    if args.verbose {
        println!(
            "Scoring benchmark {} ({} items)",
            benchmark.name.as_deref().unwrap_or("unnamed"),
            benchmark.items.len()
        );
    }

    // The benchmark items carry no retrieval of their own, so the generation
    // callback asks the configured model directly with empty context.
    let model = config.model.clone();
    let temperature = config.temperature as f32;
    let max_tokens = config.max_tokens;
    let verbose = args.verbose;
    let callback = move |question: String| {
        let chat = Arc::clone(&chat);
        let model = model.clone();
        async move {
            if verbose {
                println!("  → Generating answer for: {}", question);
            }
            let answer = chat
                .generate(
                    &model,
                    ANSWER_SYSTEM_PROMPT,
                    &question,
                    temperature,
                    Some(max_tokens),
                )
                .await?;
            Ok((answer, Vec::new()))
        }
    };

    let run = scorer
        .score_benchmark(
            &benchmark,
            callback,
            config.callback_parallelism,
            config.scoring_parallelism,
        )
        .await?;

    output::print_run(&run, args.output);

    if let Some(storage_path) = &config.storage_path {
        output::store_run(&run, storage_path)?;
    }

    Ok(())
}
