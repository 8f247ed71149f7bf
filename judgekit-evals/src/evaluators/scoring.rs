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


//! Verdict aggregation
//!
//! Pure functions: no judge calls, no state. Each metric picks which label
//! counts toward its score and which direction of the score is "good".

use judgekit_core::{Verdict, VerdictLabel};

/// Direction in which a metric's score improves
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polarity {
    /// Relevancy-style: passes when `score >= threshold`
    HigherIsBetter,
    /// Hallucination-style: passes when `score <= threshold`
    LowerIsBetter,
}

impl Polarity {
    pub fn passes(&self, score: f64, threshold: f64) -> bool {
        match self {
            Polarity::HigherIsBetter => score >= threshold,
            Polarity::LowerIsBetter => score <= threshold,
        }
    }

    /// The only passing score in strict mode
    pub fn perfect_score(&self) -> f64 {
        match self {
            Polarity::HigherIsBetter => 1.0,
            Polarity::LowerIsBetter => 0.0,
        }
    }

    /// The score a failing evaluation snaps to in strict mode
    pub fn failing_extreme(&self) -> f64 {
        match self {
            Polarity::HigherIsBetter => 0.0,
            Polarity::LowerIsBetter => 1.0,
        }
    }
}

/// Fraction of verdicts carrying `counted`; 0 for an empty sequence
pub fn verdict_ratio(verdicts: &[Verdict], counted: VerdictLabel) -> f64 {
    if verdicts.is_empty() {
        return 0.0;
    }
    let hits = verdicts.iter().filter(|v| v.verdict == counted).count();
    hits as f64 / verdicts.len() as f64
}

/// Snap a failing score to the failing extreme when strict mode is on.
///
/// Never snaps toward the passing extreme.
pub fn apply_strict(score: f64, threshold: f64, strict_mode: bool, polarity: Polarity) -> f64 {
    if strict_mode && !polarity.passes(score, threshold) {
        polarity.failing_extreme()
    } else {
        score
    }
}

/// Score a verdict sequence
pub fn score_verdicts(
    verdicts: &[Verdict],
    counted: VerdictLabel,
    polarity: Polarity,
    strict_mode: bool,
    threshold: f64,
) -> f64 {
    apply_strict(
        verdict_ratio(verdicts, counted),
        threshold,
        strict_mode,
        polarity,
    )
}

/// Score as shown to the judge in reason prompts
pub fn format_score(score: f64) -> String {
    format!("{:.2}", score)
}
