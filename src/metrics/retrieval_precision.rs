use crate::judge::JudgeService;
use crate::metrics::Metric;
use crate::models::LlmResponse;
use anyhow::Result;
use async_trait::async_trait;

/// Judge-backed metric measuring what fraction of the retrieved context
/// passages are relevant to the question
pub struct RetrievalPrecisionMetric;

pub(super) fn relevance_prompt(question: &str, chunk: &str) -> String {
    format!(
        "Question: {question}\n\n\
         Context passage:\n{chunk}\n\n\
         Is this passage relevant to answering the question? Reply yes or no."
    )
}

#[async_trait]
impl Metric for RetrievalPrecisionMetric {
    fn name(&self) -> &str {
        "retrieval_precision"
    }

    async fn score(&self, response: &LlmResponse, judge: &JudgeService) -> Result<f64> {
        if response.llm_context_list.is_empty() {
            return Ok(0.0);
        }

        let question = &response.benchmark_item.question;
        let mut relevant = 0usize;
        for chunk in &response.llm_context_list {
            if judge.ask_binary(&relevance_prompt(question, chunk)).await? {
                relevant += 1;
            }
        }

        Ok(relevant as f64 / response.llm_context_list.len() as f64)
    }
}
