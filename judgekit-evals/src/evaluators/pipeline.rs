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


//! Metric evaluation pipeline
//!
//! validate -> generate verdicts -> score -> explain, written once and run
//! with either call strategy. Every piece of per-evaluation state lives in
//! locals of [`evaluate`] and is handed back in the returned
//! [`EvaluationResult`]; metric objects hold configuration only, so one
//! instance can serve any number of concurrent evaluations.

use super::judge::{CallMode, CostLedger, Judge, VerdictRequest};
use super::scoring::{format_score, score_verdicts, Polarity};
use crate::config::{JudgeModel, MetricConfig};
use crate::{EvalError, Metric};
use async_trait::async_trait;
use judgekit_core::{EvaluationResult, TestCase, TestCaseParam, Verdict, VerdictLabel};
use std::future::Future;
use std::time::Instant;
use tracing::{debug, info, info_span, Instrument};
use uuid::Uuid;

/// Verdict reasons split into the two lists a reason prompt receives
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReasonBuckets {
    pub primary: Vec<String>,
    pub secondary: Vec<String>,
}

/// A metric scored by a judge from yes/no verdicts.
///
/// Implementors describe prompts, polarity and bucketing; the pipeline
/// supplies [`Metric`] on top.
pub trait JudgedMetric: Send + Sync {
    /// Display name, constant per metric
    fn metric_name(&self) -> &'static str;

    fn config(&self) -> &MetricConfig;

    fn judge(&self) -> &Judge;

    /// Test case fields that must be present before any judge call
    fn required_params(&self) -> &'static [TestCaseParam];

    fn polarity(&self) -> Polarity;

    /// Label that counts toward the score
    fn counted_label(&self) -> VerdictLabel;

    /// `concurrent_mode` when the config leaves it unset
    fn default_concurrent_mode(&self) -> bool;

    /// Judge prompts for a validated test case
    fn verdict_request(&self, test_case: &TestCase) -> VerdictRequest;

    fn reason_buckets(&self, verdicts: &[Verdict]) -> ReasonBuckets;

    /// Prompt asking the judge to explain `score` (already formatted)
    fn reason_prompt(&self, test_case: &TestCase, buckets: &ReasonBuckets, score: &str) -> String;

    /// Threshold scores are compared against; the perfect score in strict mode
    fn effective_threshold(&self) -> f64 {
        if self.config().strict_mode {
            self.polarity().perfect_score()
        } else {
            self.config().threshold
        }
    }

    fn concurrent_mode(&self) -> bool {
        self.config()
            .concurrent_mode
            .unwrap_or_else(|| self.default_concurrent_mode())
    }
}

/// Validate `config`, then resolve `model` into the judge a metric will hold
pub(crate) fn configured_judge(config: &MetricConfig, model: JudgeModel) -> Result<Judge, EvalError> {
    config
        .validate()
        .map_err(|e| EvalError::Config(e.to_string()))?;
    model.initialize()
}

/// `- item` lines for a reason prompt, or "None"
pub(crate) fn bullet_list(items: &[String]) -> String {
    if items.is_empty() {
        return "None".to_string();
    }
    items
        .iter()
        .map(|item| format!("- {}", item))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Run one evaluation with the given call strategy
pub async fn evaluate<M>(
    metric: &M,
    test_case: &TestCase,
    mode: CallMode,
) -> Result<EvaluationResult, EvalError>
where
    M: JudgedMetric + ?Sized,
{
    let missing = test_case.missing(metric.required_params());
    if !missing.is_empty() {
        return Err(EvalError::MissingTestCaseParams {
            metric: metric.metric_name().to_string(),
            missing,
        });
    }

    let evaluation_id = Uuid::new_v4();
    let span = info_span!(
        "evaluate",
        metric = metric.metric_name(),
        evaluation_id = %evaluation_id,
        ?mode
    );

    async move {
        let start = Instant::now();
        let judge = metric.judge();
        let config = metric.config();
        let threshold = metric.effective_threshold();
        let mut ledger = CostLedger::new(judge.using_native_model());

        let verdicts = judge
            .generate_verdicts(mode, metric.verdict_request(test_case), &mut ledger)
            .await?;
        debug!(verdicts = verdicts.len(), "verdicts parsed");

        let score = score_verdicts(
            &verdicts,
            metric.counted_label(),
            metric.polarity(),
            config.strict_mode,
            threshold,
        );

        let reason = if config.include_reason {
            let buckets = metric.reason_buckets(&verdicts);
            let prompt = metric.reason_prompt(test_case, &buckets, &format_score(score));
            Some(judge.call(mode, prompt, &mut ledger).await?)
        } else {
            None
        };

        let success = metric.polarity().passes(score, threshold);
        let duration_ms = start.elapsed().as_millis() as u64;
        info!(score, success, duration_ms, "evaluation complete");

        Ok(EvaluationResult {
            evaluation_id,
            metric: metric.metric_name().to_string(),
            evaluation_model: judge.model_name().to_string(),
            verdicts,
            score,
            threshold,
            reason,
            success,
            strict_mode: config.strict_mode,
            evaluation_cost: ledger.total(),
            duration_ms,
        })
    }
    .instrument(span)
    .await
}

/// Blocking evaluation.
///
/// Without concurrent mode the judge's blocking `generate` is called in
/// input order. With it, the concurrent path runs to completion on an owned
/// runtime.
pub fn measure_blocking<M>(metric: &M, test_case: &TestCase) -> Result<EvaluationResult, EvalError>
where
    M: JudgedMetric + ?Sized,
{
    if metric.concurrent_mode() {
        block_on_owned_runtime(evaluate(metric, test_case, CallMode::Concurrent))?
    } else {
        futures::executor::block_on(evaluate(metric, test_case, CallMode::Blocking))
    }
}

/// Drive `future` on a fresh current-thread runtime.
///
/// Inside an existing runtime the new one lives on a scoped thread, since
/// runtimes cannot be nested on one thread.
fn block_on_owned_runtime<F>(future: F) -> Result<F::Output, EvalError>
where
    F: Future + Send,
    F::Output: Send,
{
    fn run<F: Future>(future: F) -> Result<F::Output, EvalError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| EvalError::Runtime(e.to_string()))?;
        Ok(runtime.block_on(future))
    }

    if tokio::runtime::Handle::try_current().is_ok() {
        std::thread::scope(|scope| {
            scope
                .spawn(|| run(future))
                .join()
                .map_err(|_| EvalError::Runtime("evaluation thread panicked".to_string()))?
        })
    } else {
        run(future)
    }
}

#[async_trait]
impl<M> Metric for M
where
    M: JudgedMetric,
{
    fn name(&self) -> &str {
        self.metric_name()
    }

    fn threshold(&self) -> f64 {
        self.effective_threshold()
    }

    fn evaluation_model(&self) -> &str {
        self.judge().model_name()
    }

    fn measure(&self, test_case: &TestCase) -> Result<EvaluationResult, EvalError> {
        measure_blocking(self, test_case)
    }

    async fn a_measure(&self, test_case: &TestCase) -> Result<EvaluationResult, EvalError> {
        evaluate(self, test_case, CallMode::Concurrent).await
    }
}
