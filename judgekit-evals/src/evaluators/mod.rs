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

//! Built-in judged metrics and the pipeline they share

pub mod contextual_relevancy;
pub mod hallucination;
pub mod judge;
pub mod pipeline;
pub mod scoring;

pub use contextual_relevancy::ContextualRelevancyMetric;
pub use hallucination::HallucinationMetric;
pub use judge::{CallMode, CostLedger, Judge, VerdictRequest};
pub use pipeline::{evaluate, measure_blocking, JudgedMetric, ReasonBuckets};
pub use scoring::{apply_strict, format_score, score_verdicts, verdict_ratio, Polarity};
