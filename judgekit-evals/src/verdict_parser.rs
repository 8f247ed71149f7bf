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


//! Parsing judge text into verdicts
//!
//! Judges are asked for JSON but often wrap it in prose or markdown fences.
//! The parser locates the first JSON object in the text, validates it against
//! the verdict schema and otherwise fails with
//! [`EvalError::MalformedJudgeOutput`] carrying the raw text.

use crate::EvalError;
use judgekit_core::Verdict;
use regex::Regex;
use serde::Deserialize;
use std::sync::OnceLock;
use tracing::warn;

#[derive(Debug, Deserialize)]
struct VerdictBatch {
    verdicts: Vec<Verdict>,
}

fn fenced_block() -> &'static Regex {
    static FENCE: OnceLock<Regex> = OnceLock::new();
    FENCE.get_or_init(|| {
        Regex::new(r"(?s)```(?:json|JSON)?\s*(.*?)```").expect("fence pattern is valid")
    })
}

fn trailing_comma() -> &'static Regex {
    static COMMA: OnceLock<Regex> = OnceLock::new();
    COMMA.get_or_init(|| Regex::new(r",\s*([\]}])").expect("comma pattern is valid"))
}

/// Locate and decode the first JSON object in `raw`.
///
/// Text after the object is ignored. Trailing commas before a closing
/// bracket are tolerated as a fallback.
pub fn extract_json(raw: &str) -> Result<serde_json::Value, EvalError> {
    let body = fenced_block()
        .captures(raw)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
        .filter(|s| s.contains('{'))
        .unwrap_or(raw);

    let start = body
        .find('{')
        .ok_or_else(|| malformed(raw, "no JSON object found"))?;
    let segment = &body[start..];

    let first = serde_json::Deserializer::from_str(segment)
        .into_iter::<serde_json::Value>()
        .next();
    if let Some(Ok(value)) = first {
        return Ok(value);
    }

    let end = segment
        .rfind('}')
        .ok_or_else(|| malformed(raw, "unterminated JSON object"))?;
    let repaired = trailing_comma().replace_all(&segment[..=end], "$1");
    serde_json::from_str(&repaired).map_err(|e| malformed(raw, &format!("invalid JSON: {}", e)))
}

/// Parse a per-unit response: `{"verdict": "yes"|"no", "reason": "..."}`
pub fn parse_verdict(raw: &str) -> Result<Verdict, EvalError> {
    let value = extract_json(raw)?;
    serde_json::from_value(value).map_err(|e| malformed(raw, &format!("schema mismatch: {}", e)))
}

/// Parse a batched response: `{"verdicts": [{"verdict": ..., "reason": ...}, ...]}`.
///
/// Verdicts keep the order the judge returned them in.
pub fn parse_verdicts(raw: &str) -> Result<Vec<Verdict>, EvalError> {
    let value = extract_json(raw)?;
    serde_json::from_value::<VerdictBatch>(value)
        .map(|batch| batch.verdicts)
        .map_err(|e| malformed(raw, &format!("schema mismatch: {}", e)))
}

fn malformed(raw: &str, detail: &str) -> EvalError {
    warn!(detail, "judge output could not be parsed");
    EvalError::MalformedJudgeOutput {
        raw: raw.to_string(),
        detail: detail.to_string(),
    }
}
