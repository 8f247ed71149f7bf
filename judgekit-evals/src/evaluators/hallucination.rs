// Copyright 2025 Sushanth (https://github.com/sushanthpy)
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.


//! Hallucination detection using LLM-as-judge
//!
//! The judge compares the actual output against every piece of ground-truth
//! context in a single batched call and returns one verdict per context.
//! Verdict polarity: `"yes"` = the output agrees with the context, `"no"` =
//! the output contradicts it.
//!
//! score = contradicted contexts / contexts (lower is better).

use super::judge::{Judge, VerdictRequest};
use super::pipeline::{bullet_list, configured_judge, JudgedMetric, ReasonBuckets};
use super::scoring::Polarity;
use crate::config::{JudgeModel, MetricConfig};
use crate::llm_client::JudgeClient;
use crate::EvalError;
use judgekit_core::{TestCase, TestCaseParam, Verdict, VerdictLabel};
use std::sync::Arc;

const REQUIRED_PARAMS: &[TestCaseParam] = &[
    TestCaseParam::Input,
    TestCaseParam::ActualOutput,
    TestCaseParam::Context,
];

/// Hallucination metric
///
/// Returns a hallucination score (0-1) where:
/// - 0.0 = the output agrees with every context
/// - 1.0 = the output contradicts every context
pub struct HallucinationMetric {
    config: MetricConfig,
    judge: Judge,
}

impl HallucinationMetric {
    const VERDICTS_PROMPT: &'static str = r#"For each context below, decide whether the actual output agrees with it.

ACTUAL OUTPUT:
{actual_output}

CONTEXTS:
{contexts}

Produce exactly one verdict per context, in the order the contexts are listed.
- "yes": the actual output agrees with the context
- "no": the actual output contradicts the context
Missing detail is NOT a contradiction; only flag statements that conflict with the context.

Respond in JSON:
{
  "verdicts": [
    {"verdict": "yes", "reason": "<why the output agrees>"},
    {"verdict": "no", "reason": "<which statement contradicts the context>"}
  ]
}
"#;

    const REASON_PROMPT: &'static str = r#"Given the factual alignments and contradictions between the actual output and the contexts, and a hallucination score (the lower the better), explain the score concisely.

FACTUAL ALIGNMENTS:
{factual_alignments}

CONTRADICTIONS:
{contradictions}

HALLUCINATION SCORE:
{score}

Respond with the explanation only, starting with "The score is {score} because".
"#;

    /// Create with the default configuration
    pub fn new(client: Arc<dyn JudgeClient>) -> Self {
        Self {
            config: MetricConfig::default(),
            judge: Judge::new(client),
        }
    }

    pub fn with_config(config: MetricConfig, model: JudgeModel) -> Result<Self, EvalError> {
        Ok(Self {
            judge: configured_judge(&config, model)?,
            config,
        })
    }

    /// Create with the managed judge model named by the config
    pub fn from_config(config: MetricConfig) -> Result<Self, EvalError> {
        let model = JudgeModel::Named(config.model_name().to_string());
        Self::with_config(config, model)
    }

    pub(crate) fn verdicts_prompt(actual_output: &str, contexts: &[String]) -> String {
        let contexts = contexts
            .iter()
            .enumerate()
            .map(|(i, c)| format!("[Context {}]: {}", i + 1, c))
            .collect::<Vec<_>>()
            .join("\n\n");

        Self::VERDICTS_PROMPT
            .replace("{contexts}", &contexts)
            .replace("{actual_output}", actual_output)
    }

    pub(crate) fn reason_prompt_for(
        factual_alignments: &[String],
        contradictions: &[String],
        score: &str,
    ) -> String {
        Self::REASON_PROMPT
            .replace("{score}", score)
            .replace("{factual_alignments}", &bullet_list(factual_alignments))
            .replace("{contradictions}", &bullet_list(contradictions))
    }
}

impl JudgedMetric for HallucinationMetric {
    fn metric_name(&self) -> &'static str {
        "Hallucination"
    }

    fn config(&self) -> &MetricConfig {
        &self.config
    }

    fn judge(&self) -> &Judge {
        &self.judge
    }

    fn required_params(&self) -> &'static [TestCaseParam] {
        REQUIRED_PARAMS
    }

    fn polarity(&self) -> Polarity {
        Polarity::LowerIsBetter
    }

    fn counted_label(&self) -> VerdictLabel {
        VerdictLabel::No
    }

    fn default_concurrent_mode(&self) -> bool {
        false
    }

    fn verdict_request(&self, test_case: &TestCase) -> VerdictRequest {
        VerdictRequest::Batched(Self::verdicts_prompt(
            test_case.actual_output.as_deref().unwrap_or_default(),
            test_case.context.as_deref().unwrap_or_default(),
        ))
    }

    /// primary = factual alignments, secondary = contradictions.
    ///
    /// "no" reasons are reported as alignments and everything else as
    /// contradictions, the reverse of what the scoring polarity suggests.
    /// Kept as is until the intended pairing is confirmed.
    fn reason_buckets(&self, verdicts: &[Verdict]) -> ReasonBuckets {
        let mut buckets = ReasonBuckets::default();
        for verdict in verdicts {
            let Some(reason) = verdict.reason.clone() else {
                continue;
            };
            if verdict.is_no() {
                buckets.primary.push(reason);
            } else {
                buckets.secondary.push(reason);
            }
        }
        buckets
    }

    fn reason_prompt(&self, _test_case: &TestCase, buckets: &ReasonBuckets, score: &str) -> String {
        Self::reason_prompt_for(&buckets.primary, &buckets.secondary, score)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::{JudgeResponse, LLMError};
    use crate::{EvaluationOutcome, Metric};
    use async_trait::async_trait;
    use parking_lot::Mutex;

    /// Replies with a fixed verdict batch, then with a fixed explanation
    struct MockLLMClient {
        batch: String,
        prompts: Mutex<Vec<String>>,
    }

    impl MockLLMClient {
        fn new(labels: &[&str]) -> Self {
            let verdicts = labels
                .iter()
                .enumerate()
                .map(|(i, l)| format!(r#"{{"verdict": "{}", "reason": "context {}"}}"#, l, i + 1))
                .collect::<Vec<_>>()
                .join(", ");
            Self::raw(format!(r#"{{"verdicts": [{}]}}"#, verdicts))
        }

        fn raw(batch: String) -> Self {
            Self {
                batch,
                prompts: Mutex::new(Vec::new()),
            }
        }

        fn answer(&self, prompt: String) -> Result<JudgeResponse, LLMError> {
            let text = if prompt.starts_with("For each context") {
                self.batch.clone()
            } else {
                "The score is fine because the output agrees with the contexts.".to_string()
            };
            self.prompts.lock().push(prompt);
            Ok(JudgeResponse::text(text))
        }
    }

    #[async_trait]
    impl JudgeClient for MockLLMClient {
        async fn a_generate(&self, prompt: String) -> Result<JudgeResponse, LLMError> {
            self.answer(prompt)
        }

        fn generate(&self, prompt: String) -> Result<JudgeResponse, LLMError> {
            self.answer(prompt)
        }

        fn model_name(&self) -> &str {
            "mock-model"
        }
    }

    fn test_case(contexts: usize) -> TestCase {
        TestCase::new("Where is the Eiffel Tower?", "The Eiffel Tower is in Paris.")
            .with_context((0..contexts).map(|i| format!("Fact {}", i + 1)))
    }

    fn metric(client: Arc<MockLLMClient>, config: MetricConfig) -> HallucinationMetric {
        HallucinationMetric::with_config(config, JudgeModel::Custom(client)).unwrap()
    }

    #[test]
    fn test_hallucination_single_batched_call() {
        let client = Arc::new(MockLLMClient::new(&["yes", "yes", "no", "yes"]));
        let metric = metric(client.clone(), MetricConfig::default());

        let result = metric.measure(&test_case(4)).unwrap();

        assert_eq!(result.metric, "Hallucination");
        assert_eq!(result.verdicts.len(), 4);
        assert_eq!(result.score, 0.25);
        assert!(result.success);
        assert_eq!(result.evaluation_cost, None);
        // one verdict call + one reason call
        let prompts = client.prompts.lock();
        assert_eq!(prompts.len(), 2);
        assert!(prompts[0].contains("[Context 4]: Fact 4"));
        assert!(prompts[0].contains("The Eiffel Tower is in Paris."));
    }

    #[tokio::test]
    async fn test_success_requires_score_at_or_below_threshold() {
        let client = Arc::new(MockLLMClient::new(&["no", "no", "no", "yes", "yes"]));
        let metric = metric(client, MetricConfig::default().with_include_reason(false));

        let result = metric.a_measure(&test_case(5)).await.unwrap();
        assert_eq!(result.score, 0.6);
        assert!(!result.success);
        assert!(!Ok::<_, EvalError>(result).is_successful());
    }

    #[tokio::test]
    async fn test_strict_mode_snaps_to_one() {
        let client = Arc::new(MockLLMClient::new(&["no", "yes", "yes"]));
        let metric = metric(
            client,
            MetricConfig::default()
                .with_threshold(0.3)
                .with_strict_mode(true)
                .with_include_reason(false),
        );
        assert_eq!(metric.threshold(), 0.0);

        let result = metric.a_measure(&test_case(3)).await.unwrap();
        assert_eq!(result.score, 1.0);
        assert!(!result.success);
    }

    #[tokio::test]
    async fn test_strict_mode_keeps_perfect_score() {
        let client = Arc::new(MockLLMClient::new(&["yes", "yes"]));
        let metric = metric(
            client,
            MetricConfig::default()
                .with_strict_mode(true)
                .with_include_reason(false),
        );

        let result = metric.a_measure(&test_case(2)).await.unwrap();
        assert_eq!(result.score, 0.0);
        assert!(result.success);
    }

    #[test]
    fn test_reason_buckets_pin_current_assignment() {
        let client = Arc::new(MockLLMClient::new(&[]));
        let metric = metric(client, MetricConfig::default());

        let buckets = metric.reason_buckets(&[
            Verdict::no("contradicts the date"),
            Verdict::yes("agrees on location"),
            Verdict {
                verdict: VerdictLabel::No,
                reason: None,
            },
        ]);

        assert_eq!(buckets.primary, vec!["contradicts the date".to_string()]);
        assert_eq!(buckets.secondary, vec!["agrees on location".to_string()]);
    }

    #[tokio::test]
    async fn test_reason_prompt_lists_buckets_and_score() {
        let client = Arc::new(MockLLMClient::new(&["yes", "no"]));
        let metric = metric(client.clone(), MetricConfig::default());

        let result = metric.a_measure(&test_case(2)).await.unwrap();
        assert!(result.reason.is_some());

        let prompts = client.prompts.lock();
        let reason_prompt = &prompts[1];
        let alignments = reason_prompt.find("FACTUAL ALIGNMENTS:\n- context 2").unwrap();
        let contradictions = reason_prompt.find("CONTRADICTIONS:\n- context 1").unwrap();
        assert!(alignments < contradictions);
        assert!(reason_prompt.contains("HALLUCINATION SCORE:\n0.50"));
    }

    #[tokio::test]
    async fn test_malformed_judge_output_is_surfaced() {
        let client = Arc::new(MockLLMClient::raw("not json".to_string()));
        let metric = metric(client.clone(), MetricConfig::default());

        let outcome = metric.a_measure(&test_case(2)).await;
        assert!(!outcome.is_successful());
        match outcome {
            Err(EvalError::MalformedJudgeOutput { raw, .. }) => assert_eq!(raw, "not json"),
            other => panic!("unexpected outcome: {other:?}"),
        }
        // no reason call after a parse failure
        assert_eq!(client.prompts.lock().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_context_fails_fast() {
        let client = Arc::new(MockLLMClient::new(&["yes"]));
        let metric = metric(client.clone(), MetricConfig::default());

        let err = metric
            .a_measure(&TestCase::new("q", "a"))
            .await
            .unwrap_err();
        assert!(matches!(err, EvalError::MissingTestCaseParams { .. }));
        assert!(client.prompts.lock().is_empty());
    }

    #[test]
    fn test_measure_defaults_to_blocking_path() {
        let client = Arc::new(MockLLMClient::new(&["yes"]));
        let metric = metric(client, MetricConfig::default());
        assert!(!metric.concurrent_mode());
    }
}
