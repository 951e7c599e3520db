use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Configuration for a scoring run
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Path to the benchmark TOML file
    pub benchmark: String,
    /// OpenAI-compatible API endpoint
    #[serde(default = "default_api_endpoint")]
    pub api_endpoint: String,
    /// Environment variable name containing the API key
    #[serde(default = "default_env_var_api_key")]
    pub env_var_api_key: String,
    /// Model used to generate answers
    pub model: String,
    /// Model used to judge answers
    #[serde(default = "default_judge_model")]
    pub judge_model: String,
    /// Temperature for answer generation (0.0 to 1.0)
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    /// Maximum tokens for answer generation
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Concurrent answer generation calls
    #[serde(default = "default_parallelism")]
    pub callback_parallelism: usize,
    /// Concurrent per-response scoring tasks
    #[serde(default = "default_parallelism")]
    pub scoring_parallelism: usize,
    /// Metrics to run, by name; empty means the default judge-backed set
    #[serde(default)]
    pub metrics: Vec<String>,
    /// Optional local path to store the run as JSON
    #[serde(default)]
    pub storage_path: Option<String>,
}

fn default_api_endpoint() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_env_var_api_key() -> String {
    "OPENAI_API_KEY".to_string()
}

fn default_judge_model() -> String {
    "gpt-4-turbo-preview".to_string()
}

fn default_temperature() -> f64 {
    0.7
}

fn default_max_tokens() -> u32 {
    1000
}

fn default_parallelism() -> usize {
    1
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML config: {}", path.display()))
    }
}
