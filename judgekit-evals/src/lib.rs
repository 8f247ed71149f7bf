// Copyright 2025 AgentReplay (https://github.com/agentreplay)
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! # Judgekit Evaluation Framework
//!
//! LLM-judged evaluation metrics. A metric asks a judge model yes/no
//! questions about a test case, parses the answers into verdicts, turns the
//! verdicts into a score in [0, 1] and optionally asks the judge to explain
//! the score.
//!
//! ## Features
//!
//! - **Two built-in metrics**: contextual relevancy (one judge call per
//!   retrieved chunk) and hallucination (one batched call)
//! - **Blocking and async entry points** with identical results
//! - **Shareable metrics**: results are returned per call, never stored on
//!   the metric, so one instance can run many evaluations concurrently
//! - **Cost tracking** for the managed judge model
//!
//! ## Example
//!
//! ```rust,ignore
//! use judgekit_evals::{ContextualRelevancyMetric, Metric, MetricConfig};
//! use judgekit_core::TestCase;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), judgekit_evals::EvalError> {
//!     let metric = ContextualRelevancyMetric::from_config(
//!         MetricConfig::default().with_threshold(0.7),
//!     )?;
//!
//!     let test_case = TestCase::new("What is the capital of France?", "Paris.")
//!         .with_retrieval_context(["Paris is the capital of France."]);
//!
//!     let result = metric.a_measure(&test_case).await?;
//!     println!("{} {:.2} {:?}", metric.name(), result.score, result.reason);
//!     Ok(())
//! }
//! ```

use async_trait::async_trait;
use judgekit_core::{EvaluationResult, TestCase, TestCaseParam};
use thiserror::Error;

pub mod config;
pub mod evaluators;
pub mod llm_client;
pub mod verdict_parser;

pub use config::{JudgeModel, MetricConfig, DEFAULT_MODEL};
pub use evaluators::{
    CallMode, ContextualRelevancyMetric, HallucinationMetric, Judge, JudgedMetric, Polarity,
};
pub use llm_client::{JudgeClient, JudgeResponse, LLMError, OpenAIJudge};

/// An LLM-judged metric
#[async_trait]
pub trait Metric: Send + Sync {
    /// Display name (e.g. "Contextual Relevancy")
    fn name(&self) -> &str;

    /// Threshold used to decide success
    fn threshold(&self) -> f64;

    /// Name of the judge model
    fn evaluation_model(&self) -> &str;

    /// Evaluate a test case, blocking until done
    fn measure(&self, test_case: &TestCase) -> Result<EvaluationResult, EvalError>;

    /// Evaluate a test case, suspending at each judge call
    async fn a_measure(&self, test_case: &TestCase) -> Result<EvaluationResult, EvalError>;
}

/// Errors that can occur during evaluation
#[derive(Debug, Error)]
pub enum EvalError {
    #[error("{metric} requires test case params: {}", join_params(.missing))]
    MissingTestCaseParams {
        metric: String,
        missing: Vec<TestCaseParam>,
    },

    #[error("Malformed judge output ({detail}): {raw}")]
    MalformedJudgeOutput { raw: String, detail: String },

    #[error("Judge call failed: {0}")]
    JudgeCallFailure(#[from] LLMError),

    #[error("Runtime error: {0}")]
    Runtime(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

fn join_params(params: &[TestCaseParam]) -> String {
    params
        .iter()
        .map(TestCaseParam::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Success check on the outcome of `measure`/`a_measure`.
///
/// An evaluation that raised an error never counts as successful, whatever
/// a previously seen score said.
pub trait EvaluationOutcome {
    fn is_successful(&self) -> bool;
}

impl EvaluationOutcome for Result<EvaluationResult, EvalError> {
    fn is_successful(&self) -> bool {
        matches!(self, Ok(result) if result.is_successful())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_params_message() {
        let err = EvalError::MissingTestCaseParams {
            metric: "Hallucination".to_string(),
            missing: vec![TestCaseParam::ActualOutput, TestCaseParam::Context],
        };
        assert_eq!(
            err.to_string(),
            "Hallucination requires test case params: actual_output, context"
        );
    }

    #[test]
    fn test_errored_outcome_is_never_successful() {
        let outcome: Result<EvaluationResult, EvalError> =
            Err(EvalError::Runtime("no runtime".to_string()));
        assert!(!outcome.is_successful());
    }
}
