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


//! Test cases consumed by judged metrics

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single LLM interaction to be evaluated.
///
/// Every field is optional so that metrics can report exactly which
/// parameters are missing before any judge call is made. An empty string
/// or an empty context list still counts as present.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TestCase {
    /// Input given to the model under evaluation
    #[serde(default)]
    pub input: Option<String>,

    /// Output produced by the model under evaluation
    #[serde(default)]
    pub actual_output: Option<String>,

    /// Reference answer, if the dataset carries one
    #[serde(default)]
    pub expected_output: Option<String>,

    /// Ground-truth context the output should be consistent with
    #[serde(default)]
    pub context: Option<Vec<String>>,

    /// Chunks returned by the retriever, in retrieval order
    #[serde(default)]
    pub retrieval_context: Option<Vec<String>>,
}

impl TestCase {
    /// Create a test case with input and actual output set
    pub fn new(input: impl Into<String>, actual_output: impl Into<String>) -> Self {
        Self {
            input: Some(input.into()),
            actual_output: Some(actual_output.into()),
            ..Self::default()
        }
    }

    pub fn with_expected_output(mut self, expected_output: impl Into<String>) -> Self {
        self.expected_output = Some(expected_output.into());
        self
    }

    pub fn with_context<I, S>(mut self, context: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.context = Some(context.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_retrieval_context<I, S>(mut self, retrieval_context: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.retrieval_context = Some(retrieval_context.into_iter().map(Into::into).collect());
        self
    }

    /// Whether the given parameter is present on this test case
    pub fn has(&self, param: TestCaseParam) -> bool {
        match param {
            TestCaseParam::Input => self.input.is_some(),
            TestCaseParam::ActualOutput => self.actual_output.is_some(),
            TestCaseParam::ExpectedOutput => self.expected_output.is_some(),
            TestCaseParam::Context => self.context.is_some(),
            TestCaseParam::RetrievalContext => self.retrieval_context.is_some(),
        }
    }

    /// Parameters from `required` that are absent, in the order given
    pub fn missing(&self, required: &[TestCaseParam]) -> Vec<TestCaseParam> {
        required.iter().copied().filter(|p| !self.has(*p)).collect()
    }
}

/// Named fields of a [`TestCase`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestCaseParam {
    Input,
    ActualOutput,
    ExpectedOutput,
    Context,
    RetrievalContext,
}

impl TestCaseParam {
    pub fn as_str(&self) -> &'static str {
        match self {
            TestCaseParam::Input => "input",
            TestCaseParam::ActualOutput => "actual_output",
            TestCaseParam::ExpectedOutput => "expected_output",
            TestCaseParam::Context => "context",
            TestCaseParam::RetrievalContext => "retrieval_context",
        }
    }
}

impl fmt::Display for TestCaseParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_params_preserve_requested_order() {
        let case = TestCase::new("What is Rust?", "A systems language.");
        let missing = case.missing(&[
            TestCaseParam::RetrievalContext,
            TestCaseParam::Input,
            TestCaseParam::Context,
        ]);
        assert_eq!(
            missing,
            vec![TestCaseParam::RetrievalContext, TestCaseParam::Context]
        );
    }

    #[test]
    fn test_empty_values_count_as_present() {
        let case = TestCase::new("", "").with_context(Vec::<String>::new());
        assert!(case.has(TestCaseParam::Input));
        assert!(case.has(TestCaseParam::ActualOutput));
        assert!(case.has(TestCaseParam::Context));
        assert!(!case.has(TestCaseParam::RetrievalContext));
    }

    #[test]
    fn test_deserialize_partial_test_case() {
        let case: TestCase = serde_json::from_str(
            r#"{"input": "q", "retrieval_context": ["a", "b"]}"#,
        )
        .unwrap();
        assert_eq!(case.input.as_deref(), Some("q"));
        assert!(case.actual_output.is_none());
        assert_eq!(case.retrieval_context.unwrap().len(), 2);
    }

    #[test]
    fn test_param_display() {
        assert_eq!(TestCaseParam::RetrievalContext.to_string(), "retrieval_context");
        assert_eq!(
            serde_json::to_string(&TestCaseParam::ActualOutput).unwrap(),
            "\"actual_output\""
        );
    }
}
