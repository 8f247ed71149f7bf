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


//! Metric configuration
//!
//! A [`MetricConfig`] is built once and shared by every evaluation a metric
//! runs. It can be constructed in code, read from a TOML file, or taken from
//! `JUDGEKIT_*` environment variables, which take priority over the file.

use crate::evaluators::judge::Judge;
use crate::llm_client::{JudgeClient, OpenAIJudge};
use crate::EvalError;
use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Judge model used when none is configured
pub const DEFAULT_MODEL: &str = "gpt-4o";

/// Settings shared by all judged metrics
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct MetricConfig {
    /// Pass/fail threshold
    #[serde(default = "default_threshold")]
    pub threshold: f64,

    /// Ask the judge for an explanation after scoring
    #[serde(default = "default_include_reason")]
    pub include_reason: bool,

    /// Snap failing scores to the failing extreme and require a perfect score
    #[serde(default)]
    pub strict_mode: bool,

    /// Run `measure` through the concurrent path.
    /// None = the metric's own default
    #[serde(default)]
    pub concurrent_mode: Option<bool>,

    /// Name of the managed judge model
    #[serde(default)]
    pub model: Option<String>,
}

fn default_threshold() -> f64 {
    0.5
}

fn default_include_reason() -> bool {
    true
}

impl Default for MetricConfig {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
            include_reason: default_include_reason(),
            strict_mode: false,
            concurrent_mode: None,
            model: None,
        }
    }
}

impl MetricConfig {
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_include_reason(mut self, include_reason: bool) -> Self {
        self.include_reason = include_reason;
        self
    }

    pub fn with_strict_mode(mut self, strict_mode: bool) -> Self {
        self.strict_mode = strict_mode;
        self
    }

    pub fn with_concurrent_mode(mut self, concurrent_mode: bool) -> Self {
        self.concurrent_mode = Some(concurrent_mode);
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Configured judge model name, or [`DEFAULT_MODEL`]
    pub fn model_name(&self) -> &str {
        self.model.as_deref().unwrap_or(DEFAULT_MODEL)
    }

    /// Reject thresholds outside [0, 1]
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.threshold) {
            bail!("threshold must be within [0, 1], got {}", self.threshold);
        }
        Ok(())
    }

    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration: environment overrides the file, the file overrides defaults
    pub fn load(config_file: Option<PathBuf>) -> Result<Self> {
        Self::load_with(config_file, |key| std::env::var(key).ok())
    }

    /// Like [`MetricConfig::load`], reading variables through `lookup`
    pub fn load_with<F>(config_file: Option<PathBuf>, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config = match config_file {
            Some(path) if path.exists() => {
                tracing::info!("Loading metric configuration from file: {:?}", path);
                Self::from_file(&path)?
            }
            Some(path) => {
                tracing::warn!("Metric config file not found: {:?}, using defaults", path);
                Self::default()
            }
            None => Self::default(),
        };

        let config = config.merge_env(lookup)?;
        config.validate()?;
        Ok(config)
    }

    /// Override fields from environment variables.
    ///
    /// Supported variables:
    /// - JUDGEKIT_THRESHOLD
    /// - JUDGEKIT_INCLUDE_REASON
    /// - JUDGEKIT_STRICT_MODE
    /// - JUDGEKIT_CONCURRENT_MODE
    /// - JUDGEKIT_MODEL
    pub fn merge_env<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(threshold) = lookup("JUDGEKIT_THRESHOLD") {
            self.threshold = threshold.trim().parse()?;
        }
        if let Some(include_reason) = lookup("JUDGEKIT_INCLUDE_REASON") {
            self.include_reason = include_reason.trim().parse()?;
        }
        if let Some(strict_mode) = lookup("JUDGEKIT_STRICT_MODE") {
            self.strict_mode = strict_mode.trim().parse()?;
        }
        if let Some(concurrent_mode) = lookup("JUDGEKIT_CONCURRENT_MODE") {
            self.concurrent_mode = Some(concurrent_mode.trim().parse()?);
        }
        if let Some(model) = lookup("JUDGEKIT_MODEL") {
            self.model = Some(model);
        }
        Ok(self)
    }
}

/// Which judge a metric consults
#[derive(Clone)]
pub enum JudgeModel {
    /// Managed model, resolved to [`OpenAIJudge`]; reports cost
    Named(String),
    /// Caller-supplied client; cost is tracked only if it reports one
    Custom(Arc<dyn JudgeClient>),
}

impl JudgeModel {
    /// Resolve to a [`Judge`]; named models read `OPENAI_*` from the environment
    pub fn initialize(self) -> Result<Judge, EvalError> {
        self.initialize_with(|key| std::env::var(key).ok())
    }

    pub fn initialize_with<F>(self, lookup: F) -> Result<Judge, EvalError>
    where
        F: Fn(&str) -> Option<String>,
    {
        match self {
            JudgeModel::Named(model) => {
                let client = OpenAIJudge::from_lookup(model, lookup)
                    .map_err(|e| EvalError::Config(e.to_string()))?;
                Ok(Judge::new(Arc::new(client)))
            }
            JudgeModel::Custom(client) => Ok(Judge::new(client)),
        }
    }
}

impl From<Arc<dyn JudgeClient>> for JudgeModel {
    fn from(client: Arc<dyn JudgeClient>) -> Self {
        JudgeModel::Custom(client)
    }
}

impl fmt::Debug for JudgeModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JudgeModel::Named(model) => f.debug_tuple("Named").field(model).finish(),
            JudgeModel::Custom(client) => f.debug_tuple("Custom").field(&client.model_name()).finish(),
        }
    }
}
