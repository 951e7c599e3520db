use crate::judge::JudgeService;
use crate::metrics::Metric;
use crate::models::LlmResponse;
use anyhow::Result;
use async_trait::async_trait;

/// Binary metric: 1.0 when the answer's character count falls within the
/// configured bounds
pub struct ResponseLengthMetric {
    min_length: Option<usize>,
    max_length: Option<usize>,
}

impl ResponseLengthMetric {
    pub fn new(min_length: Option<usize>, max_length: Option<usize>) -> Self {
        Self {
            min_length,
            max_length,
        }
    }
}

#[async_trait]
impl Metric for ResponseLengthMetric {
    fn name(&self) -> &str {
        "response_length"
    }

    async fn score(&self, response: &LlmResponse, _judge: &JudgeService) -> Result<f64> {
        Ok(if within_bounds(
            response.llm_answer.chars().count(),
            self.min_length,
            self.max_length,
        ) {
            1.0
        } else {
            0.0
        })
    }
}

pub(super) fn within_bounds(length: usize, min: Option<usize>, max: Option<usize>) -> bool {
    min.map_or(true, |min| length >= min) && max.map_or(true, |max| length <= max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::benchmark::BenchmarkItem;
    use crate::judge::ChatCompletion;
    use std::sync::Arc;

    struct NoChat;

    #[async_trait]
    impl ChatCompletion for NoChat {
        async fn complete(&self, _model: &str, _system: &str, _prompt: &str) -> Result<String> {
            anyhow::bail!("judge should not be called")
        }
    }

    fn response(llm_answer: &str) -> LlmResponse {
        LlmResponse {
            llm_answer: llm_answer.to_string(),
            llm_context_list: vec![],
            benchmark_item: BenchmarkItem {
                question: "q".to_string(),
                answer: "r".to_string(),
                context: vec![],
            },
        }
    }

    #[tokio::test]
    async fn test_within_bounds() {
        let judge = JudgeService::with_chat("judge", Arc::new(NoChat));
        let metric = ResponseLengthMetric::new(Some(3), Some(10));
        assert_eq!(metric.score(&response("hello"), &judge).await.unwrap(), 1.0);
        assert_eq!(metric.score(&response("hi"), &judge).await.unwrap(), 0.0);
        assert_eq!(
            metric
                .score(&response("much too long an answer"), &judge)
                .await
                .unwrap(),
            0.0
        );
    }

    #[tokio::test]
    async fn test_unbounded() {
        let judge = JudgeService::with_chat("judge", Arc::new(NoChat));
        let metric = ResponseLengthMetric::new(None, None);
        assert_eq!(metric.score(&response(""), &judge).await.unwrap(), 1.0);
    }
}
