use crate::judge::JudgeService;
use crate::metrics::Metric;
use crate::metrics::response_length::within_bounds;
use crate::models::LlmResponse;
use anyhow::Result;
use async_trait::async_trait;

/// Binary metric: 1.0 when every retrieved context passage's character count
/// falls within the configured bounds
pub struct ContextLengthMetric {
    min_length: Option<usize>,
    max_length: Option<usize>,
}

impl ContextLengthMetric {
    pub fn new(min_length: Option<usize>, max_length: Option<usize>) -> Self {
        Self {
            min_length,
            max_length,
        }
    }
}

#[async_trait]
impl Metric for ContextLengthMetric {
    fn name(&self) -> &str {
        "context_length"
    }

    async fn score(&self, response: &LlmResponse, _judge: &JudgeService) -> Result<f64> {
        let all_within = response
            .llm_context_list
            .iter()
            .all(|chunk| within_bounds(chunk.chars().count(), self.min_length, self.max_length));
        Ok(if all_within { 1.0 } else { 0.0 })
    }
}
