//! Scores the outputs of a RAG pipeline against a benchmark of
//! question/reference-answer pairs, using a pluggable set of metrics.
//! Judge-backed metrics consult an LLM through a [`judge::JudgeService`]
//! constructed fresh for every scored response.

pub mod benchmark;
pub mod config;
pub mod judge;
pub mod metrics;
pub mod models;
pub mod output;
pub mod scorer;

pub use benchmark::{Benchmark, BenchmarkItem};
pub use models::{LlmResponse, Run, RunData};
pub use scorer::Scorer;
