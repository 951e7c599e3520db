use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One question/reference-answer evaluation item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkItem {
    /// Question posed to the system under evaluation
    pub question: String,
    /// Reference answer the system is judged against
    pub answer: String,
    /// Optional reference context passages
    #[serde(default)]
    pub context: Vec<String>,
}

/// A named, ordered collection of benchmark items
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Benchmark {
    /// Display name for reporting
    #[serde(default)]
    pub name: Option<String>,
    /// Evaluation items, in reporting order
    pub items: Vec<BenchmarkItem>,
}

impl Benchmark {
    /// Create a benchmark from a list of items
    pub fn new(name: Option<String>, items: Vec<BenchmarkItem>) -> Self {
        Self { name, items }
    }

    /// Load a benchmark from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read benchmark file: {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML benchmark: {}", path.display()))
    }
}
