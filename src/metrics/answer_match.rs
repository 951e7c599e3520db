use crate::judge::JudgeService;
use crate::metrics::Metric;
use crate::models::LlmResponse;
use anyhow::Result;
use async_trait::async_trait;

/// Binary metric: 1.0 when the generated answer equals the reference answer,
/// ignoring surrounding whitespace and ASCII case
pub struct AnswerMatchMetric;

#[async_trait]
impl Metric for AnswerMatchMetric {
    fn name(&self) -> &str {
        "answer_match"
    }

    async fn score(&self, response: &LlmResponse, _judge: &JudgeService) -> Result<f64> {
        let matches = response
            .llm_answer
            .trim()
            .eq_ignore_ascii_case(response.benchmark_item.answer.trim());
        Ok(if matches { 1.0 } else { 0.0 })
    }
}
