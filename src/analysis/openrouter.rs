//! OpenRouter chat-completions client
//!
//! Handles all HTTP communication with the text-generation service.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::time::sleep;

use super::prompt::{user_prompt, SYSTEM_PROMPT};
use super::{parse_analysis, AnalyzerError, CompatibilityAnalysis, CompatibilityAnalyzer};
use crate::config::AnalyzerConfig;
use crate::hardware::SystemSpecs;
use crate::requirements::Requirements;

const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1";
const REFERER: &str = "https://github.com/game-spec-analyzer/game-spec";
const APP_TITLE: &str = "Game Spec Analyzer";

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f64,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

/// Compatibility analyzer backed by an OpenRouter model
pub struct OpenRouterAnalyzer {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    max_retries: u32,
    temperature: f64,
}

impl OpenRouterAnalyzer {
    /// Build from config; the key comes from the environment, never the file.
    pub fn from_config(
        config: &AnalyzerConfig,
        api_key: Option<String>,
    ) -> Result<Self, AnalyzerError> {
        let api_key = api_key
            .filter(|k| !k.trim().is_empty())
            .ok_or(AnalyzerError::MissingApiKey)?;
        let model = config
            .model
            .clone()
            .filter(|m| !m.trim().is_empty())
            .ok_or(AnalyzerError::MissingModel)?;

        Ok(Self::with_settings(
            &config.base_url,
            api_key,
            model,
            config.timeout_seconds,
            config.max_retries,
            config.temperature,
        ))
    }

    fn with_settings(
        base_url: &str,
        api_key: String,
        model: String,
        timeout_seconds: u64,
        max_retries: u32,
        temperature: f64,
    ) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_seconds.max(1)))
            .build()
            .unwrap_or_else(|_| Client::new());

        OpenRouterAnalyzer {
            client,
            base_url: normalize_base_url(base_url),
            api_key,
            model,
            max_retries,
            temperature,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Send one system + user exchange and return the reply text.
    async fn complete(&self, system: &str, user: &str) -> Result<String, AnalyzerError> {
        let url = format!("{}/chat/completions", self.base_url);
        let max_attempts = self.max_retries.saturating_add(1).max(1);
        let payload = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
            temperature: self.temperature,
        };

        let mut attempt = 1;
        loop {
            tracing::debug!(attempt, model = %self.model, "requesting compatibility analysis");
            let response_result = self
                .client
                .post(&url)
                .bearer_auth(&self.api_key)
                .header("HTTP-Referer", REFERER)
                .header("X-Title", APP_TITLE)
                .json(&payload)
                .send()
                .await;

            let response = match response_result {
                Ok(response) => response,
                Err(err) => {
                    if attempt < max_attempts && is_retryable_network_error(&err) {
                        tracing::warn!(attempt, error = %err, "analyzer request failed, retrying");
                        sleep(backoff_for_attempt(attempt)).await;
                        attempt += 1;
                        continue;
                    }
                    return Err(AnalyzerError::Network(err));
                }
            };

            let status = response.status();

            if status.is_success() {
                let body: ChatResponse = response.json().await?;
                return body
                    .choices
                    .into_iter()
                    .next()
                    .and_then(|choice| choice.message.content)
                    .ok_or_else(|| AnalyzerError::Parse("response has no message content".into()));
            }

            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());

            if attempt < max_attempts && status.is_server_error() {
                tracing::warn!(attempt, status = status.as_u16(), "analyzer server error, retrying");
                sleep(backoff_for_attempt(attempt)).await;
                attempt += 1;
                continue;
            }

            return Err(AnalyzerError::Api {
                status: status.as_u16(),
                message: api_error_message(&error_body),
            });
        }
    }
}

impl CompatibilityAnalyzer for OpenRouterAnalyzer {
    async fn analyze(
        &self,
        specs: &SystemSpecs,
        requirements: &Requirements,
    ) -> Result<CompatibilityAnalysis, AnalyzerError> {
        let reply = self
            .complete(SYSTEM_PROMPT, &user_prompt(specs, requirements))
            .await?;
        parse_analysis(&reply)
    }
}

/// `{"error": {"message": ...}}` when the service sends one, else the raw body.
fn api_error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string())
}

fn normalize_base_url(base_url: &str) -> String {
    let trimmed = base_url.trim();
    if trimmed.is_empty() {
        return DEFAULT_BASE_URL.to_string();
    }
    trimmed.trim_end_matches('/').to_string()
}

fn is_retryable_network_error(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_connect() || err.is_request()
}

fn backoff_for_attempt(attempt: u32) -> Duration {
    // 200ms, 400ms, 800ms ... capped at 2s
    let exponent = attempt.saturating_sub(1).min(4);
    let factor = 2u64.saturating_pow(exponent);
    let ms = 200u64.saturating_mul(factor).min(2_000);
    Duration::from_millis(ms)
}
