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


//! Verdict generation
//!
//! [`Judge`] wraps a judge client and issues the judge calls a metric needs,
//! either one blocking call after another or as concurrent tasks joined at a
//! single point. Results always come back in prompt order.

use crate::llm_client::{JudgeClient, JudgeResponse};
use crate::verdict_parser::{parse_verdict, parse_verdicts};
use crate::EvalError;
use futures::future::try_join_all;
use judgekit_core::Verdict;
use std::sync::Arc;
use tracing::debug;

/// How judge calls are performed for one evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallMode {
    /// `generate`, strictly in input order
    Blocking,
    /// `a_generate` for every prompt at once, joined before parsing
    Concurrent,
}

/// Judge prompts a metric needs answered
#[derive(Debug, Clone)]
pub enum VerdictRequest {
    /// One prompt per evidence unit, one verdict per response
    PerUnit(Vec<String>),
    /// A single prompt whose response holds a `verdicts` array
    Batched(String),
}

/// Running judge cost for one evaluation.
///
/// `None` when the judge does not report cost.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CostLedger {
    total: Option<f64>,
}

impl CostLedger {
    pub fn new(tracks_cost: bool) -> Self {
        Self {
            total: tracks_cost.then_some(0.0),
        }
    }

    pub fn record(&mut self, response: &JudgeResponse) {
        if let Some(total) = self.total.as_mut() {
            *total += response.cost.unwrap_or(0.0);
        }
    }

    pub fn total(&self) -> Option<f64> {
        self.total
    }
}

/// Judge client plus its cost capability, fixed at construction
#[derive(Clone)]
pub struct Judge {
    client: Arc<dyn JudgeClient>,
    using_native_model: bool,
}

impl Judge {
    pub fn new(client: Arc<dyn JudgeClient>) -> Self {
        let using_native_model = client.reports_cost();
        Self {
            client,
            using_native_model,
        }
    }

    pub fn model_name(&self) -> &str {
        self.client.model_name()
    }

    /// Whether costs are tracked for evaluations run with this judge
    pub fn using_native_model(&self) -> bool {
        self.using_native_model
    }

    /// Issue a single judge call and return its text
    pub async fn call(
        &self,
        mode: CallMode,
        prompt: String,
        ledger: &mut CostLedger,
    ) -> Result<String, EvalError> {
        debug!(?mode, "judge call");
        let response = match mode {
            CallMode::Blocking => self.client.generate(prompt)?,
            CallMode::Concurrent => self.client.a_generate(prompt).await?,
        };
        ledger.record(&response);
        Ok(response.text)
    }

    /// Issue one judge call per prompt; texts are returned in prompt order.
    ///
    /// The first failure aborts the whole batch.
    pub async fn call_all(
        &self,
        mode: CallMode,
        prompts: Vec<String>,
        ledger: &mut CostLedger,
    ) -> Result<Vec<String>, EvalError> {
        debug!(calls = prompts.len(), ?mode, "dispatching judge calls");
        match mode {
            CallMode::Blocking => {
                let mut texts = Vec::with_capacity(prompts.len());
                for prompt in prompts {
                    let response = self.client.generate(prompt)?;
                    ledger.record(&response);
                    texts.push(response.text);
                }
                Ok(texts)
            }
            CallMode::Concurrent => {
                let responses =
                    try_join_all(prompts.into_iter().map(|p| self.client.a_generate(p))).await?;
                Ok(responses
                    .into_iter()
                    .map(|response| {
                        ledger.record(&response);
                        response.text
                    })
                    .collect())
            }
        }
    }

    /// Ask the judge for verdicts and parse them
    pub async fn generate_verdicts(
        &self,
        mode: CallMode,
        request: VerdictRequest,
        ledger: &mut CostLedger,
    ) -> Result<Vec<Verdict>, EvalError> {
        match request {
            VerdictRequest::PerUnit(prompts) => self
                .call_all(mode, prompts, ledger)
                .await?
                .iter()
                .map(|text| parse_verdict(text))
                .collect(),
            VerdictRequest::Batched(prompt) => {
                let text = self.call(mode, prompt, ledger).await?;
                parse_verdicts(&text)
            }
        }
    }
}
