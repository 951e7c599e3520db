use crate::judge::JudgeService;
use crate::metrics::Metric;
use crate::models::LlmResponse;
use anyhow::{Context, Result};
use async_trait::async_trait;
use regex::Regex;

/// Binary metric: 1.0 when the generated answer matches the configured pattern
#[derive(Debug)]
pub struct RegexMetric {
    pattern: Regex,
}

impl RegexMetric {
    pub fn new(pattern: &str) -> Result<Self> {
        let pattern = Regex::new(pattern)
            .with_context(|| format!("Invalid regex pattern: {pattern:?}"))?;
        Ok(Self { pattern })
    }
}

#[async_trait]
impl Metric for RegexMetric {
    fn name(&self) -> &str {
        "regex"
    }

    async fn score(&self, response: &LlmResponse, _judge: &JudgeService) -> Result<f64> {
        Ok(if self.pattern.is_match(&response.llm_answer) {
            1.0
        } else {
            0.0
        })
    }
}
