use crate::judge::JudgeService;
use crate::metrics::Metric;
use crate::models::LlmResponse;
use anyhow::Result;
use async_trait::async_trait;

/// Binary metric: 1.0 when the generated answer contains the configured text
pub struct ContainsTextMetric {
    needle: String,
}

impl ContainsTextMetric {
    pub fn new(needle: impl Into<String>) -> Self {
        Self {
            needle: needle.into(),
        }
    }
}

#[async_trait]
impl Metric for ContainsTextMetric {
    fn name(&self) -> &str {
        "contains_text"
    }

    async fn score(&self, response: &LlmResponse, _judge: &JudgeService) -> Result<f64> {
        Ok(if response.llm_answer.contains(&self.needle) {
            1.0
        } else {
            0.0
        })
    }
}
