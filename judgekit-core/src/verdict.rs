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


//! Judge verdicts
//!
//! A verdict is the judge's yes/no answer for one evidence unit plus an
//! optional rationale. What "yes" means is decided by each metric.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Closed set of judge labels.
///
/// Parsing is case-insensitive and ignores surrounding whitespace, so
/// `" YES "` and `"yes"` are the same label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum VerdictLabel {
    Yes,
    No,
}

impl VerdictLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            VerdictLabel::Yes => "yes",
            VerdictLabel::No => "no",
        }
    }
}

impl FromStr for VerdictLabel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "yes" => Ok(VerdictLabel::Yes),
            "no" => Ok(VerdictLabel::No),
            other => Err(format!("unknown verdict label '{}', expected yes or no", other)),
        }
    }
}

impl TryFrom<String> for VerdictLabel {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for VerdictLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One judge verdict
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    pub verdict: VerdictLabel,

    #[serde(default)]
    pub reason: Option<String>,
}

impl Verdict {
    pub fn yes(reason: impl Into<String>) -> Self {
        Self {
            verdict: VerdictLabel::Yes,
            reason: Some(reason.into()),
        }
    }

    pub fn no(reason: impl Into<String>) -> Self {
        Self {
            verdict: VerdictLabel::No,
            reason: Some(reason.into()),
        }
    }

    pub fn is_yes(&self) -> bool {
        self.verdict == VerdictLabel::Yes
    }

    pub fn is_no(&self) -> bool {
        self.verdict == VerdictLabel::No
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_is_case_and_whitespace_tolerant() {
        for raw in ["yes", "YES", " Yes\n", "\tyEs "] {
            assert_eq!(raw.parse::<VerdictLabel>().unwrap(), VerdictLabel::Yes);
        }
        assert_eq!(" No ".parse::<VerdictLabel>().unwrap(), VerdictLabel::No);
        assert!("maybe".parse::<VerdictLabel>().is_err());
        assert!("".parse::<VerdictLabel>().is_err());
    }

    #[test]
    fn test_verdict_deserialize_without_reason() {
        let v: Verdict = serde_json::from_str(r#"{"verdict": " NO "}"#).unwrap();
        assert!(v.is_no());
        assert_eq!(v.reason, None);

        let v: Verdict = serde_json::from_str(r#"{"verdict": "yes", "reason": null}"#).unwrap();
        assert!(v.is_yes());
        assert_eq!(v.reason, None);
    }

    #[test]
    fn test_verdict_rejects_unknown_label() {
        let err = serde_json::from_str::<Verdict>(r#"{"verdict": "idk"}"#).unwrap_err();
        assert!(err.to_string().contains("unknown verdict label"));
    }

    #[test]
    fn test_label_serializes_lowercase() {
        let json = serde_json::to_string(&Verdict::yes("relevant")).unwrap();
        assert_eq!(json, r#"{"verdict":"yes","reason":"relevant"}"#);
    }
}
