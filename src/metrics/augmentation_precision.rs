use crate::judge::JudgeService;
use crate::metrics::Metric;
use crate::metrics::retrieval_precision::relevance_prompt;
use crate::models::LlmResponse;
use anyhow::Result;
use async_trait::async_trait;

/// Judge-backed metric measuring what fraction of the relevant retrieved
/// passages are actually reflected in the generated answer
pub struct AugmentationPrecisionMetric;

fn usage_prompt(llm_answer: &str, chunk: &str) -> String {
    format!(
        "Context passage:\n{chunk}\n\n\
         Answer: {llm_answer}\n\n\
         Does the answer use information from this passage? Reply yes or no."
    )
}

#[async_trait]
impl Metric for AugmentationPrecisionMetric {
    fn name(&self) -> &str {
        "augmentation_precision"
    }

    async fn score(&self, response: &LlmResponse, judge: &JudgeService) -> Result<f64> {
        let question = &response.benchmark_item.question;

        let mut relevant_chunks = Vec::new();
        for chunk in &response.llm_context_list {
            if judge.ask_binary(&relevance_prompt(question, chunk)).await? {
                relevant_chunks.push(chunk);
            }
        }
        if relevant_chunks.is_empty() {
            return Ok(0.0);
        }

        let mut used = 0usize;
        for chunk in &relevant_chunks {
            if judge
                .ask_binary(&usage_prompt(&response.llm_answer, chunk))
                .await?
            {
                used += 1;
            }
        }

        Ok(used as f64 / relevant_chunks.len() as f64)
    }
}
