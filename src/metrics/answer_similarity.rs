use crate::judge::JudgeService;
use crate::metrics::Metric;
use crate::models::LlmResponse;
use anyhow::Result;
use async_trait::async_trait;

/// Judge-backed metric rating how similar the generated answer is to the
/// reference answer, on a 0 to 5 scale
pub struct AnswerSimilarityMetric;

fn similarity_prompt(question: &str, reference_answer: &str, llm_answer: &str) -> String {
    format!(
        "Considering the question below, rate how well the candidate answer matches the \
         reference answer on a scale from 0 (completely different) to 5 (equivalent).\n\n\
         Question: {question}\n\
         Reference answer: {reference_answer}\n\
         Candidate answer: {llm_answer}\n\n\
         Reply with a single number from 0 to 5."
    )
}

#[async_trait]
impl Metric for AnswerSimilarityMetric {
    fn name(&self) -> &str {
        "answer_similarity"
    }

    async fn score(&self, response: &LlmResponse, judge: &JudgeService) -> Result<f64> {
        let prompt = similarity_prompt(
            &response.benchmark_item.question,
            &response.benchmark_item.answer,
            &response.llm_answer,
        );
        let score = judge.ask_score(&prompt).await?;
        Ok(score.clamp(0.0, 5.0))
    }
}
