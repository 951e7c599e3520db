use crate::judge::JudgeService;
use crate::models::LlmResponse;
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

mod answer_consistency;
mod answer_match;
mod answer_similarity;
mod augmentation_precision;
mod contains_text;
mod context_length;
mod regex_match;
mod response_length;
mod retrieval_precision;

pub use answer_consistency::AnswerConsistencyMetric;
pub use answer_match::AnswerMatchMetric;
pub use answer_similarity::AnswerSimilarityMetric;
pub use augmentation_precision::AugmentationPrecisionMetric;
pub use contains_text::ContainsTextMetric;
pub use context_length::ContextLengthMetric;
pub use regex_match::RegexMetric;
pub use response_length::ResponseLengthMetric;
pub use retrieval_precision::RetrievalPrecisionMetric;

/// A named scoring unit over one response.
///
/// Implementations must be safe to call concurrently across different
/// responses, each with its own [`JudgeService`]. The name is used verbatim
/// as the aggregation key in run scores.
#[async_trait]
pub trait Metric: Send + Sync {
    /// Stable identifier used as the key in per-item and overall scores
    fn name(&self) -> &str;

    /// Score one response, optionally consulting the judge
    async fn score(&self, response: &LlmResponse, judge: &JudgeService) -> Result<f64>;
}

/// Look up a parameter-free metric by name, for config-driven setups.
/// Metrics that take construction parameters (contains_text, regex,
/// length bounds) must be built in code.
pub fn metric_by_name(name: &str) -> Option<Arc<dyn Metric>> {
    match name {
        "answer_match" => Some(Arc::new(AnswerMatchMetric)),
        "answer_similarity" => Some(Arc::new(AnswerSimilarityMetric)),
        "answer_consistency" => Some(Arc::new(AnswerConsistencyMetric)),
        "retrieval_precision" => Some(Arc::new(RetrievalPrecisionMetric)),
        "augmentation_precision" => Some(Arc::new(AugmentationPrecisionMetric)),
        _ => None,
    }
}

/// Default judge-backed metric set
pub fn default_metrics() -> Vec<Arc<dyn Metric>> {
    vec![
        Arc::new(AnswerSimilarityMetric),
        Arc::new(AugmentationPrecisionMetric),
        Arc::new(AnswerConsistencyMetric),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_by_name_known() {
        for name in [
            "answer_match",
            "answer_similarity",
            "answer_consistency",
            "retrieval_precision",
            "augmentation_precision",
        ] {
            let metric = metric_by_name(name).unwrap();
            assert_eq!(metric.name(), name);
        }
    }

    #[test]
    fn test_metric_by_name_unknown() {
        assert!(metric_by_name("no_such_metric").is_none());
    }

    #[test]
    fn test_default_metrics() {
        let metrics = default_metrics();
        let names: Vec<String> = metrics.iter().map(|m| m.name().to_string()).collect();
        assert_eq!(
            names,
            vec![
                "answer_similarity",
                "augmentation_precision",
                "answer_consistency"
            ]
        );
    }
}
