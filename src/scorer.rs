use crate::benchmark::{Benchmark, BenchmarkItem};
use crate::judge::{ChatCompletion, JudgeService, OpenAiChat};
use crate::metrics::Metric;
use crate::models::{LlmResponse, Run, RunData};
use anyhow::{Context, Result};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::warn;

/// Orchestrates answer generation and metric scoring over a benchmark.
///
/// The metric set and judge model are read-only for the lifetime of a run.
/// If two configured metrics share a name, the later one overwrites the
/// earlier in each item's scores (last write wins).
pub struct Scorer {
    metrics: Vec<Arc<dyn Metric>>,
    judge_model: String,
    chat: Arc<dyn ChatCompletion>,
}

impl Scorer {
    /// Create a scorer judging through the standard OpenAI endpoint, with
    /// the key read from `OPENAI_API_KEY`
    pub fn new(metrics: Vec<Arc<dyn Metric>>, judge_model: impl Into<String>) -> Result<Self> {
        let chat = OpenAiChat::new("https://api.openai.com/v1", "OPENAI_API_KEY")?;
        Ok(Self::with_chat(metrics, judge_model, Arc::new(chat)))
    }

    /// Create a scorer over any chat transport
    pub fn with_chat(
        metrics: Vec<Arc<dyn Metric>>,
        judge_model: impl Into<String>,
        chat: Arc<dyn ChatCompletion>,
    ) -> Self {
        Self {
            metrics,
            judge_model: judge_model.into(),
            chat,
        }
    }

    /// Generate an answer for every benchmark item via `callback`, then score
    /// the responses.
    ///
    /// Generation runs on a worker pool bounded by `callback_parallelism`;
    /// the response list preserves benchmark order regardless of which calls
    /// finish first. A callback error aborts the whole call.
    pub async fn score<F, Fut>(
        &self,
        items: &[BenchmarkItem],
        callback: F,
        callback_parallelism: usize,
        scoring_parallelism: usize,
    ) -> Result<Run>
    where
        F: Fn(String) -> Fut + Send + Sync + Clone + 'static,
        Fut: Future<Output = Result<(String, Vec<String>)>> + Send + 'static,
    {
        let responses = self
            .generate_responses(items, callback, callback_parallelism)
            .await?;
        self.score_responses(responses, scoring_parallelism).await
    }

    /// Convenience wrapper scoring a whole [`Benchmark`]
    pub async fn score_benchmark<F, Fut>(
        &self,
        benchmark: &Benchmark,
        callback: F,
        callback_parallelism: usize,
        scoring_parallelism: usize,
    ) -> Result<Run>
    where
        F: Fn(String) -> Fut + Send + Sync + Clone + 'static,
        Fut: Future<Output = Result<(String, Vec<String>)>> + Send + 'static,
    {
        self.score(
            &benchmark.items,
            callback,
            callback_parallelism,
            scoring_parallelism,
        )
        .await
    }

    /// Score pre-built responses with every configured metric.
    ///
    /// Each response is scored by one task holding its own fresh
    /// [`JudgeService`], with at most `parallelism` tasks in flight. The
    /// returned run data preserves input order. A metric that fails on one
    /// response is logged and left out of that response's scores; its
    /// overall mean covers only the responses it did score.
    pub async fn score_responses(
        &self,
        responses: Vec<LlmResponse>,
        parallelism: usize,
    ) -> Result<Run> {
        let semaphore = Arc::new(Semaphore::new(parallelism.max(1)));
        let mut join_set = JoinSet::new();
        let total = responses.len();

        for (index, response) in responses.into_iter().enumerate() {
            let permit = semaphore.clone().acquire_owned().await?;
            let metrics = self.metrics.clone();
            let judge_model = self.judge_model.clone();
            let chat = Arc::clone(&self.chat);

            join_set.spawn(async move {
                let _permit = permit;
                (
                    index,
                    score_one_response(&metrics, &judge_model, chat, response).await,
                )
            });
        }

        let mut run_data: Vec<Option<RunData>> = (0..total).map(|_| None).collect();
        while let Some(joined) = join_set.join_next().await {
            let (index, data) = joined.context("Scoring task panicked")?;
            run_data[index] = Some(data);
        }
        let run_data: Vec<RunData> = run_data.into_iter().flatten().collect();

        Ok(Run {
            overall_scores: overall_scores(&run_data),
            run_data,
            id: None,
        })
    }

    /// Run the callback for every item on a bounded pool, collecting results
    /// positionally so the output order matches the input order
    async fn generate_responses<F, Fut>(
        &self,
        items: &[BenchmarkItem],
        callback: F,
        parallelism: usize,
    ) -> Result<Vec<LlmResponse>>
    where
        F: Fn(String) -> Fut + Send + Sync + Clone + 'static,
        Fut: Future<Output = Result<(String, Vec<String>)>> + Send + 'static,
    {
        let semaphore = Arc::new(Semaphore::new(parallelism.max(1)));
        let mut join_set = JoinSet::new();

        for (index, item) in items.iter().cloned().enumerate() {
            let permit = semaphore.clone().acquire_owned().await?;
            let callback = callback.clone();

            join_set.spawn(async move {
                let _permit = permit;
                let (llm_answer, llm_context_list) = callback(item.question.clone())
                    .await
                    .with_context(|| {
                        format!("Answer callback failed for question: {}", item.question)
                    })?;

                Ok::<_, anyhow::Error>((
                    index,
                    LlmResponse {
                        llm_answer,
                        llm_context_list,
                        benchmark_item: item,
                    },
                ))
            });
        }

        let mut responses: Vec<Option<LlmResponse>> = (0..items.len()).map(|_| None).collect();
        while let Some(joined) = join_set.join_next().await {
            let (index, response) = joined.context("Answer generation task panicked")??;
            responses[index] = Some(response);
        }

        Ok(responses.into_iter().flatten().collect())
    }
}

/// Run every metric against one response, with a judge service dedicated to
/// it. Judge completions are cached per response, which is why each response
/// gets its own service.
async fn score_one_response(
    metrics: &[Arc<dyn Metric>],
    judge_model: &str,
    chat: Arc<dyn ChatCompletion>,
    response: LlmResponse,
) -> RunData {
    let judge = JudgeService::with_chat(judge_model, chat);
    let mut scores = HashMap::new();

    for metric in metrics {
        match metric.score(&response, &judge).await {
            Ok(score) => {
                scores.insert(metric.name().to_string(), score);
            }
            Err(error) => {
                warn!(
                    metric = metric.name(),
                    question = %response.benchmark_item.question,
                    "metric failed, leaving it out of this item's scores: {error:#}"
                );
            }
        }
    }

    RunData {
        scores,
        question: response.benchmark_item.question,
        reference_answer: response.benchmark_item.answer,
        llm_answer: response.llm_answer,
        llm_context_list: response.llm_context_list,
    }
}

/// Mean per metric over the run data entries that contain it. Metrics with
/// no successful observations are absent from the result.
fn overall_scores(run_data: &[RunData]) -> HashMap<String, f64> {
    let mut totals: HashMap<String, f64> = HashMap::new();
    let mut counts: HashMap<String, usize> = HashMap::new();

    for item in run_data {
        for (name, score) in &item.scores {
            *totals.entry(name.clone()).or_insert(0.0) += score;
            *counts.entry(name.clone()).or_insert(0) += 1;
        }
    }

    totals
        .into_iter()
        .map(|(name, total)| {
            let count = counts[&name];
            (name, total / count as f64)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct CountingChat {
        calls: AtomicUsize,
        reply: &'static str,
    }

    impl CountingChat {
        fn new(reply: &'static str) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                reply,
            }
        }
    }

    #[async_trait]
    impl ChatCompletion for CountingChat {
        async fn complete(&self, _model: &str, _system: &str, _prompt: &str) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.reply.to_string())
        }
    }

    /// Always returns the same score
    struct ConstMetric {
        name: &'static str,
        value: f64,
    }

    #[async_trait]
    impl Metric for ConstMetric {
        fn name(&self) -> &str {
            self.name
        }

        async fn score(&self, _response: &LlmResponse, _judge: &JudgeService) -> Result<f64> {
            Ok(self.value)
        }
    }

    /// Returns a score looked up by question text, failing for questions
    /// with no scripted value
    struct ScriptedMetric {
        name: &'static str,
        scores: HashMap<String, f64>,
    }

    impl ScriptedMetric {
        fn new(name: &'static str, scores: &[(&str, f64)]) -> Self {
            Self {
                name,
                scores: scores
                    .iter()
                    .map(|(question, score)| (question.to_string(), *score))
                    .collect(),
            }
        }
    }

    #[async_trait]
    impl Metric for ScriptedMetric {
        fn name(&self) -> &str {
            self.name
        }

        async fn score(&self, response: &LlmResponse, _judge: &JudgeService) -> Result<f64> {
            self.scores
                .get(&response.benchmark_item.question)
                .copied()
                .ok_or_else(|| {
                    anyhow!(
                        "no scripted score for {:?}",
                        response.benchmark_item.question
                    )
                })
        }
    }

    /// Asks the judge the same prompt twice per response
    struct AskingMetric;

    #[async_trait]
    impl Metric for AskingMetric {
        fn name(&self) -> &str {
            "asking"
        }

        async fn score(&self, _response: &LlmResponse, judge: &JudgeService) -> Result<f64> {
            judge.ask("shared prompt").await?;
            judge.ask("shared prompt").await?;
            Ok(1.0)
        }
    }

    fn item(question: &str, answer: &str) -> BenchmarkItem {
        BenchmarkItem {
            question: question.to_string(),
            answer: answer.to_string(),
            context: vec![],
        }
    }

    fn response_for(question: &str, answer: &str) -> LlmResponse {
        LlmResponse {
            llm_answer: answer.to_string(),
            llm_context_list: vec![],
            benchmark_item: item(question, answer),
        }
    }

    fn scorer_with(metrics: Vec<Arc<dyn Metric>>) -> Scorer {
        Scorer::with_chat(metrics, "judge-model", Arc::new(CountingChat::new("yes")))
    }

    fn echo_callback(question: String) -> impl Future<Output = Result<(String, Vec<String>)>> {
        async move { Ok((format!("answer to {question}"), vec![])) }
    }

    #[tokio::test]
    async fn test_empty_benchmark_yields_empty_run() {
        let scorer = scorer_with(vec![Arc::new(ConstMetric {
            name: "const",
            value: 1.0,
        })]);

        let run = scorer.score(&[], echo_callback, 2, 2).await.unwrap();
        assert!(run.overall_scores.is_empty());
        assert!(run.run_data.is_empty());
        assert!(run.id.is_none());
    }

    #[tokio::test]
    async fn test_single_item_end_to_end() {
        let scorer = scorer_with(vec![Arc::new(ConstMetric {
            name: "always_one",
            value: 1.0,
        })]);
        let items = vec![item("2+2?", "4")];

        let callback = |_question: String| async move {
            Ok(("4".to_string(), vec!["math context".to_string()]))
        };

        let run = scorer.score(&items, callback, 1, 1).await.unwrap();
        assert_eq!(run.overall_scores.len(), 1);
        assert_eq!(run.overall_scores["always_one"], 1.0);
        assert_eq!(run.run_data.len(), 1);
        assert_eq!(run.run_data[0].scores["always_one"], 1.0);
        assert_eq!(run.run_data[0].question, "2+2?");
        assert_eq!(run.run_data[0].reference_answer, "4");
        assert_eq!(run.run_data[0].llm_answer, "4");
        assert_eq!(run.run_data[0].llm_context_list, vec!["math context"]);
    }

    #[tokio::test]
    async fn test_generation_preserves_input_order() {
        let scorer = scorer_with(vec![]);
        let items: Vec<BenchmarkItem> =
            (0..8).map(|n| item(&format!("q{n}"), "ref")).collect();

        // Later items sleep less, so completion order inverts input order
        let callback = |question: String| async move {
            let n: u64 = question.trim_start_matches('q').parse()?;
            tokio::time::sleep(Duration::from_millis((8 - n) * 5)).await;
            Ok((format!("a{n}"), vec![]))
        };

        let responses = scorer
            .generate_responses(&items, callback, 4)
            .await
            .unwrap();

        let questions: Vec<&str> = responses
            .iter()
            .map(|r| r.benchmark_item.question.as_str())
            .collect();
        assert_eq!(
            questions,
            vec!["q0", "q1", "q2", "q3", "q4", "q5", "q6", "q7"]
        );
        assert_eq!(responses[0].llm_answer, "a0");
        assert_eq!(responses[7].llm_answer, "a7");
    }

    #[tokio::test]
    async fn test_parallel_and_sequential_aggregation_agree() {
        let scripted: Vec<(&str, f64)> = vec![
            ("q0", 0.1),
            ("q1", 0.4),
            ("q2", 0.9),
            ("q3", 0.2),
            ("q4", 0.7),
            ("q5", 1.0),
        ];
        let responses: Vec<LlmResponse> = scripted
            .iter()
            .map(|(question, _)| response_for(question, "answer"))
            .collect();

        let make_scorer = || {
            scorer_with(vec![Arc::new(ScriptedMetric::new("scripted", &scripted))])
        };

        let sequential = make_scorer()
            .score_responses(responses.clone(), 1)
            .await
            .unwrap();
        let parallel = make_scorer()
            .score_responses(responses, 8)
            .await
            .unwrap();

        assert_eq!(sequential.overall_scores, parallel.overall_scores);
        let expected = (0.1 + 0.4 + 0.9 + 0.2 + 0.7 + 1.0) / 6.0;
        assert!((parallel.overall_scores["scripted"] - expected).abs() < 1e-12);
    }

    #[tokio::test]
    async fn test_multi_metric_means_are_independent() {
        let metric_a = ScriptedMetric::new("A", &[("q0", 0.5), ("q1", 1.0)]);
        let metric_b = ScriptedMetric::new("B", &[("q0", 1.0), ("q1", 1.0)]);
        let scorer = scorer_with(vec![Arc::new(metric_a), Arc::new(metric_b)]);

        let responses = vec![response_for("q0", "x"), response_for("q1", "y")];
        let run = scorer.score_responses(responses, 2).await.unwrap();

        assert_eq!(run.overall_scores["A"], 0.75);
        assert_eq!(run.overall_scores["B"], 1.0);
    }

    #[tokio::test]
    async fn test_judge_instances_are_isolated_per_response() {
        let chat = Arc::new(CountingChat::new("ok"));
        let scorer = Scorer::with_chat(vec![Arc::new(AskingMetric)], "judge-model", chat.clone());

        let responses = vec![response_for("q0", "x"), response_for("q1", "y")];
        let run = scorer.score_responses(responses, 2).await.unwrap();

        assert_eq!(run.run_data.len(), 2);
        // The second ask within a response hits that response's cache, so a
        // shared judge would have produced one transport call, not two.
        assert_eq!(chat.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_callback_failure_aborts_the_run() {
        let scorer = scorer_with(vec![Arc::new(ConstMetric {
            name: "const",
            value: 1.0,
        })]);
        let items = vec![item("q0", "a"), item("q1", "b"), item("q2", "c")];

        let callback = |question: String| async move {
            if question == "q1" {
                return Err(anyhow!("retrieval backend down"));
            }
            Ok(("fine".to_string(), vec![]))
        };

        let result = scorer.score(&items, callback, 3, 1).await;
        assert!(result.is_err());
        let message = format!("{:#}", result.unwrap_err());
        assert!(message.contains("q1"));
        assert!(message.contains("retrieval backend down"));
    }

    #[tokio::test]
    async fn test_failed_metric_is_omitted_not_fatal() {
        let good = ConstMetric {
            name: "good",
            value: 1.0,
        };
        // Scripted metric with no entries fails on every question
        let bad = ScriptedMetric::new("bad", &[]);
        let scorer = scorer_with(vec![Arc::new(good), Arc::new(bad)]);

        let responses = vec![response_for("q0", "x"), response_for("q1", "y")];
        let run = scorer.score_responses(responses, 2).await.unwrap();

        assert_eq!(run.run_data.len(), 2);
        for data in &run.run_data {
            assert_eq!(data.scores.len(), 1);
            assert_eq!(data.scores["good"], 1.0);
        }
        assert_eq!(run.overall_scores.len(), 1);
        assert!(!run.overall_scores.contains_key("bad"));
    }

    #[tokio::test]
    async fn test_partial_metric_coverage_averages_over_successes() {
        // Scores q0 and q2 but fails on q1
        let flaky = ScriptedMetric::new("flaky", &[("q0", 0.2), ("q2", 0.8)]);
        let scorer = scorer_with(vec![Arc::new(flaky)]);

        let responses = vec![
            response_for("q0", "x"),
            response_for("q1", "y"),
            response_for("q2", "z"),
        ];
        let run = scorer.score_responses(responses, 1).await.unwrap();

        assert!((run.overall_scores["flaky"] - 0.5).abs() < 1e-12);
        assert!(run.run_data[1].scores.is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_metric_name_last_write_wins() {
        let first = ConstMetric {
            name: "dup",
            value: 0.0,
        };
        let second = ConstMetric {
            name: "dup",
            value: 1.0,
        };
        let scorer = scorer_with(vec![Arc::new(first), Arc::new(second)]);

        let run = scorer
            .score_responses(vec![response_for("q0", "x")], 1)
            .await
            .unwrap();
        assert_eq!(run.run_data[0].scores["dup"], 1.0);
        assert_eq!(run.overall_scores["dup"], 1.0);
    }

    #[tokio::test]
    async fn test_zero_parallelism_is_clamped() {
        let scorer = scorer_with(vec![Arc::new(ConstMetric {
            name: "const",
            value: 0.5,
        })]);
        let items = vec![item("q0", "a"), item("q1", "b")];

        let run = scorer.score(&items, echo_callback, 0, 0).await.unwrap();
        assert_eq!(run.run_data.len(), 2);
        assert_eq!(run.overall_scores["const"], 0.5);
    }

    #[tokio::test]
    async fn test_run_data_preserves_input_order() {
        let scorer = scorer_with(vec![Arc::new(ConstMetric {
            name: "const",
            value: 1.0,
        })]);
        let responses: Vec<LlmResponse> = (0..6)
            .map(|n| response_for(&format!("q{n}"), "a"))
            .collect();

        let run = scorer.score_responses(responses, 6).await.unwrap();
        let questions: Vec<&str> = run.run_data.iter().map(|d| d.question.as_str()).collect();
        assert_eq!(questions, vec!["q0", "q1", "q2", "q3", "q4", "q5"]);
    }
}
