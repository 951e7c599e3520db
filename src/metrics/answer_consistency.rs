use crate::judge::JudgeService;
use crate::metrics::Metric;
use crate::models::LlmResponse;
use anyhow::Result;
use async_trait::async_trait;

/// Judge-backed metric measuring what fraction of the answer's main points
/// are supported by the retrieved context
pub struct AnswerConsistencyMetric;

fn main_points_prompt(llm_answer: &str) -> String {
    format!(
        "List the main factual points made by the following answer, one per line, \
         with no numbering or bullets.\n\nAnswer: {llm_answer}"
    )
}

fn supported_prompt(point: &str, context: &str) -> String {
    format!(
        "Context:\n{context}\n\n\
         Statement: {point}\n\n\
         Can the statement be derived from the context alone? Reply yes or no."
    )
}

/// Split a judge reply into statements, stripping any list markers it added
/// despite instructions
fn parse_points(reply: &str) -> Vec<String> {
    reply
        .lines()
        .map(|line| {
            line.trim()
                .trim_start_matches(['-', '*', '•'])
                .trim_start_matches(|c: char| c.is_ascii_digit() || c == '.' || c == ')')
                .trim()
        })
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

#[async_trait]
impl Metric for AnswerConsistencyMetric {
    fn name(&self) -> &str {
        "answer_consistency"
    }

    async fn score(&self, response: &LlmResponse, judge: &JudgeService) -> Result<f64> {
        let reply = judge.ask(&main_points_prompt(&response.llm_answer)).await?;
        let points = parse_points(&reply);
        if points.is_empty() {
            return Ok(0.0);
        }

        let context = response.llm_context_list.join("\n");
        let mut supported = 0usize;
        for point in &points {
            if judge.ask_binary(&supported_prompt(point, &context)).await? {
                supported += 1;
            }
        }

        Ok(supported as f64 / points.len() as f64)
    }
}
