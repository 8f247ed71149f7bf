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

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::Verdict;

/// Outcome of one `measure`/`a_measure` call.
///
/// Built fresh for every invocation and returned to the caller; metrics keep
/// no copy, so concurrent evaluations on a shared metric never observe each
/// other's verdicts or scores.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationResult {
    /// Identifier of this invocation, also attached to its tracing span
    pub evaluation_id: Uuid,

    /// Display name of the metric (e.g. "Hallucination")
    pub metric: String,

    /// Name of the judge model consulted
    pub evaluation_model: String,

    /// Verdicts in evidence order (or in the order a batched judge returned them)
    pub verdicts: Vec<Verdict>,

    /// Final score in [0, 1], after any strict-mode snap
    pub score: f64,

    /// Threshold the score was compared against
    pub threshold: f64,

    /// Judge explanation, absent when reasons were not requested
    pub reason: Option<String>,

    /// Whether the score passed the threshold in the metric's direction
    pub success: bool,

    pub strict_mode: bool,

    /// Summed judge cost; `None` when the judge does not report cost
    pub evaluation_cost: Option<f64>,

    /// Wall-clock duration of the evaluation in milliseconds
    pub duration_ms: u64,
}

impl EvaluationResult {
    pub fn is_successful(&self) -> bool {
        self.success
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_serialization_keeps_absent_cost() {
        let result = EvaluationResult {
            evaluation_id: Uuid::nil(),
            metric: "Contextual Relevancy".to_string(),
            evaluation_model: "mock".to_string(),
            verdicts: vec![Verdict::yes("on topic")],
            score: 1.0,
            threshold: 0.5,
            reason: None,
            success: true,
            strict_mode: false,
            evaluation_cost: None,
            duration_ms: 3,
        };

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["evaluation_cost"], serde_json::Value::Null);
        assert_eq!(json["verdicts"][0]["verdict"], "yes");

        let back: EvaluationResult = serde_json::from_value(json).unwrap();
        assert!(back.is_successful());
        assert_eq!(back.verdicts.len(), 1);
    }
}
