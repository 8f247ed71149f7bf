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


//! Contextual relevancy using LLM-as-judge
//!
//! Asks the judge, once per retrieved chunk, whether the chunk is relevant
//! to the input. Verdict polarity: `"yes"` = relevant.
//!
//! score = relevant chunks / retrieved chunks (higher is better).

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
    TestCaseParam::RetrievalContext,
];

/// Relevancy of each retrieved chunk to the input
pub struct ContextualRelevancyMetric {
    config: MetricConfig,
    judge: Judge,
}

impl ContextualRelevancyMetric {
    const VERDICT_PROMPT: &'static str = r#"Based on the input and the context, decide whether the context is relevant to the input.

INPUT:
{text}

CONTEXT:
{context}

Respond in JSON with two keys:
- "verdict": STRICTLY "yes" or "no", whether the context is relevant to the input
- "reason": why the context is or is not relevant; quote the irrelevant statements when the verdict is "no"

Example:
{
  "verdict": "no",
  "reason": "The context only discusses the weather in Tokyo, which has nothing to do with the capital of France."
}
"#;

    const REASON_PROMPT: &'static str = r#"Given the input, the reasons why parts of the retrieval context are irrelevant to it, and a contextual relevancy score (the closer to 1 the better), explain the score concisely.

INPUT:
{input}

IRRELEVANT CONTEXT REASONS:
{irrelevancies}

CONTEXTUAL RELEVANCY SCORE:
{score}

Quote the irrelevancies to justify a low score and keep it positive when the score is high.
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

    pub(crate) fn verdict_prompt(text: &str, context: &str) -> String {
        Self::VERDICT_PROMPT
            .replace("{text}", text)
            .replace("{context}", context)
    }

    pub(crate) fn reason_prompt_for(input: &str, irrelevancies: &[String], score: &str) -> String {
        Self::REASON_PROMPT
            .replace("{score}", score)
            .replace("{irrelevancies}", &bullet_list(irrelevancies))
            .replace("{input}", input)
    }
}

impl JudgedMetric for ContextualRelevancyMetric {
    fn metric_name(&self) -> &'static str {
        "Contextual Relevancy"
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
        Polarity::HigherIsBetter
    }

    fn counted_label(&self) -> VerdictLabel {
        VerdictLabel::Yes
    }

    fn default_concurrent_mode(&self) -> bool {
        true
    }

    fn verdict_request(&self, test_case: &TestCase) -> VerdictRequest {
        let input = test_case.input.as_deref().unwrap_or_default();
        let prompts = test_case
            .retrieval_context
            .iter()
            .flatten()
            .map(|chunk| Self::verdict_prompt(input, chunk))
            .collect();
        VerdictRequest::PerUnit(prompts)
    }

    /// Irrelevancies only; "yes" verdicts add nothing to the prompt
    fn reason_buckets(&self, verdicts: &[Verdict]) -> ReasonBuckets {
        ReasonBuckets {
            primary: verdicts
                .iter()
                .filter(|v| v.is_no())
                .filter_map(|v| v.reason.clone())
                .collect(),
            secondary: Vec::new(),
        }
    }

    fn reason_prompt(&self, test_case: &TestCase, buckets: &ReasonBuckets, score: &str) -> String {
        Self::reason_prompt_for(
            test_case.input.as_deref().unwrap_or_default(),
            &buckets.primary,
            score,
        )
    }
}
