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


//! Judge client abstraction for LLM-judged metrics
//!
//! Metrics only need "prompt in, text out". The managed [`OpenAIJudge`]
//! additionally reports what each call cost; caller-supplied clients usually
//! do not, and metrics disable cost tracking for them.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Trait for judge models consulted by metrics
#[async_trait]
pub trait JudgeClient: Send + Sync {
    /// Send a prompt and get the judge's raw text
    async fn a_generate(&self, prompt: String) -> Result<JudgeResponse, LLMError>;

    /// Blocking variant of [`JudgeClient::a_generate`].
    ///
    /// The default drives `a_generate` on a dedicated thread with its own
    /// current-thread runtime, so it is safe to call from inside or outside
    /// an existing tokio runtime. Clients with a native blocking transport
    /// should override it.
    fn generate(&self, prompt: String) -> Result<JudgeResponse, LLMError> {
        std::thread::scope(|scope| {
            scope
                .spawn(|| {
                    let runtime = tokio::runtime::Builder::new_current_thread()
                        .enable_all()
                        .build()
                        .map_err(|e| LLMError::Runtime(e.to_string()))?;
                    runtime.block_on(self.a_generate(prompt))
                })
                .join()
                .map_err(|_| LLMError::Runtime("judge call thread panicked".to_string()))?
        })
    }

    /// Get model name
    fn model_name(&self) -> &str;

    /// Whether responses carry a cost. Checked once when a metric is built.
    fn reports_cost(&self) -> bool {
        false
    }
}

/// Judge output for a single prompt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JudgeResponse {
    pub text: String,

    /// Cost in USD, only set by clients that report cost
    pub cost: Option<f64>,
}

impl JudgeResponse {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            cost: None,
        }
    }

    pub fn with_cost(text: impl Into<String>, cost: f64) -> Self {
        Self {
            text: text.into(),
            cost: Some(cost),
        }
    }
}

/// Token usage information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

impl TokenUsage {
    /// Calculate cost based on per-token pricing
    pub fn calculate_cost(&self, cost_per_input: f64, cost_per_output: f64) -> f64 {
        (self.prompt_tokens as f64 * cost_per_input)
            + (self.completion_tokens as f64 * cost_per_output)
    }
}

/// Errors from judge clients
#[derive(Debug, Error)]
pub enum LLMError {
    #[error("API error: {0}")]
    ApiError(String),

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Runtime error: {0}")]
    Runtime(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Managed judge backed by the OpenAI chat completions API.
///
/// This is the native judge: every response carries its cost.
pub struct OpenAIJudge {
    api_key: String,
    model: String,
    base_url: String,
    client: reqwest::Client,
}

impl OpenAIJudge {
    pub fn new(api_key: String, model: String) -> Self {
        Self {
            api_key,
            model,
            base_url: DEFAULT_BASE_URL.to_string(),
            client: reqwest::Client::new(),
        }
    }

    /// Build from `OPENAI_API_KEY` and, if set, `OPENAI_BASE_URL`
    pub fn from_env(model: impl Into<String>) -> Result<Self, LLMError> {
        Self::from_lookup(model, |key| std::env::var(key).ok())
    }

    /// Like [`OpenAIJudge::from_env`], reading variables through `lookup`
    pub fn from_lookup<F>(model: impl Into<String>, lookup: F) -> Result<Self, LLMError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup("OPENAI_API_KEY")
            .ok_or_else(|| LLMError::ApiError("OPENAI_API_KEY not set".to_string()))?;
        let judge = Self::new(api_key, model.into());
        Ok(match lookup("OPENAI_BASE_URL") {
            Some(base_url) => judge.with_base_url(base_url),
            None => judge,
        })
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    /// Get cost per token (input, output)
    pub fn cost_per_token(&self) -> (f64, f64) {
        match self.model.as_str() {
            "gpt-4o" => (0.0000025, 0.000010),        // $2.50/$10 per 1M
            "gpt-4o-mini" => (0.00000015, 0.0000006), // $0.15/$0.60 per 1M
            "gpt-4-turbo" => (0.000010, 0.000030),    // $10/$30 per 1M
            _ => (0.0000025, 0.000010),
        }
    }
}

#[async_trait]
impl JudgeClient for OpenAIJudge {
    async fn a_generate(&self, prompt: String) -> Result<JudgeResponse, LLMError> {
        let request = serde_json::json!({
            "model": self.model,
            "messages": [
                {
                    "role": "user",
                    "content": prompt
                }
            ],
            "temperature": 0.0
        });

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await?;
            if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                return Err(LLMError::RateLimitExceeded);
            }
            return Err(LLMError::ApiError(error_text));
        }

        let response_data: serde_json::Value = response.json().await?;

        let text = response_data["choices"][0]["message"]["content"]
            .as_str()
            .ok_or(LLMError::InvalidResponse("Missing content".to_string()))?
            .to_string();

        let usage_data = &response_data["usage"];
        let usage = TokenUsage {
            prompt_tokens: usage_data["prompt_tokens"].as_u64().unwrap_or(0) as u32,
            completion_tokens: usage_data["completion_tokens"].as_u64().unwrap_or(0) as u32,
        };

        let (input_cost, output_cost) = self.cost_per_token();
        Ok(JudgeResponse::with_cost(
            text,
            usage.calculate_cost(input_cost, output_cost),
        ))
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn reports_cost(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const COMPLETION: &str = r#"{
        "choices": [{"message": {"role": "assistant", "content": "{\"verdict\": \"yes\"}"}}],
        "usage": {"prompt_tokens": 1000, "completion_tokens": 100, "total_tokens": 1100}
    }"#;

    #[test]
    fn test_token_usage_cost() {
        let usage = TokenUsage {
            prompt_tokens: 100,
            completion_tokens: 50,
        };

        // GPT-4o-mini pricing: $0.15/$0.60 per 1M
        let cost = usage.calculate_cost(0.00000015, 0.0000006);

        // 100 * 0.00000015 + 50 * 0.0000006 = 0.000015 + 0.00003 = 0.000045
        assert!((cost - 0.000045).abs() < 0.0000001);
    }

    #[test]
    fn test_openai_cost_per_token() {
        let judge = OpenAIJudge::new("test".to_string(), "gpt-4o-mini".to_string());
        let (input, output) = judge.cost_per_token();

        assert_eq!(input, 0.00000015);
        assert_eq!(output, 0.0000006);
        assert!(judge.reports_cost());
    }

    #[tokio::test]
    async fn test_openai_judge_reports_text_and_cost() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/chat/completions")
            .match_header("authorization", "Bearer sk-test")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(COMPLETION)
            .create_async()
            .await;

        let judge = OpenAIJudge::new("sk-test".to_string(), "gpt-4o".to_string())
            .with_base_url(server.url());
        let response = judge.a_generate("judge this".to_string()).await.unwrap();

        mock.assert_async().await;
        assert_eq!(response.text, r#"{"verdict": "yes"}"#);
        // 1000 * 2.5e-6 + 100 * 1e-5
        let cost = response.cost.unwrap();
        assert!((cost - 0.0035).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_openai_judge_maps_rate_limit() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/chat/completions")
            .with_status(429)
            .with_body("slow down")
            .create_async()
            .await;

        let judge = OpenAIJudge::new("sk-test".to_string(), "gpt-4o".to_string())
            .with_base_url(server.url());
        let err = judge.a_generate("judge this".to_string()).await.unwrap_err();
        assert!(matches!(err, LLMError::RateLimitExceeded));
    }

    #[tokio::test]
    async fn test_openai_judge_undecodable_body_is_http_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_body("<html>gateway</html>")
            .create_async()
            .await;

        let judge = OpenAIJudge::new("sk-test".to_string(), "gpt-4o".to_string())
            .with_base_url(server.url());
        let err = judge.a_generate("judge this".to_string()).await.unwrap_err();
        assert!(matches!(err, LLMError::Http(_)));
    }

    #[tokio::test]
    async fn test_openai_judge_missing_content_is_invalid_response() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_body(r#"{"choices": [], "usage": {"prompt_tokens": 1, "completion_tokens": 0}}"#)
            .create_async()
            .await;

        let judge = OpenAIJudge::new("sk-test".to_string(), "gpt-4o".to_string())
            .with_base_url(server.url());
        let err = judge.a_generate("judge this".to_string()).await.unwrap_err();
        assert!(matches!(err, LLMError::InvalidResponse(_)));
    }

    #[test]
    fn test_blocking_generate_outside_runtime() {
        let mut server = mockito::Server::new();
        let _mock = server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_body(COMPLETION)
            .create();

        let judge = OpenAIJudge::new("sk-test".to_string(), "gpt-4o".to_string())
            .with_base_url(server.url());
        let response = judge.generate("judge this".to_string()).unwrap();
        assert!(response.cost.is_some());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_blocking_generate_inside_runtime() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/chat/completions")
            .with_status(500)
            .with_body("boom")
            .create_async()
            .await;

        let judge = OpenAIJudge::new("sk-test".to_string(), "gpt-4o".to_string())
            .with_base_url(server.url());
        let err = tokio::task::block_in_place(|| judge.generate("judge this".to_string()))
            .unwrap_err();
        assert!(matches!(err, LLMError::ApiError(msg) if msg == "boom"));
    }
}
