use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::benchmark::BenchmarkItem;

/// One generated answer plus the context retrieved for it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmResponse {
    /// Answer produced by the system under evaluation
    pub llm_answer: String,
    /// Retrieved context passages, in retrieval order
    pub llm_context_list: Vec<String>,
    /// The benchmark item this answer was generated for
    pub benchmark_item: BenchmarkItem,
}

/// Scores and source data for a single scored response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunData {
    /// Metric name to score for this item
    pub scores: HashMap<String, f64>,
    /// Original question
    pub question: String,
    /// Reference answer from the benchmark
    pub reference_answer: String,
    /// Answer produced by the system under evaluation
    pub llm_answer: String,
    /// Retrieved context passages
    pub llm_context_list: Vec<String>,
}

/// Complete output of one scoring pass
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Run {
    /// Mean score per metric, over the items that produced a value for it
    pub overall_scores: HashMap<String, f64>,
    /// Per-item detail, in benchmark order
    pub run_data: Vec<RunData>,
    /// Optional identifier assigned by the caller
    pub id: Option<String>,
}
