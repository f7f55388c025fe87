//! Gemini API client
//!
//! Sends one prompt per call to the `generateContent` endpoint and returns the
//! first candidate's text, trimmed. Uses a long-lived reqwest::Client for
//! connection pooling and a single fixed timeout; there are no retries.

use crate::config::AppConfig;
use crate::error::ChainError;
use crate::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, warn};

/// Longest slice of an error body carried into `ChainError::Status`
const MAX_ERROR_BODY: usize = 500;

/// Anything that can answer a single prompt.
///
/// The chain only depends on this trait, so tests can script replies without a
/// network.
#[async_trait]
pub trait ModelClient: Send + Sync {
    async fn call_with_prompt(&self, prompt: &str, temperature: f32, max_tokens: u32) -> Result<String>;
}

/// Reusable Gemini client (connection-pooled)
pub struct GeminiClient {
    client: Client,
    api_key: String,
    base_url: String,
    timeout: Duration,
}

impl GeminiClient {
    pub fn new(api_key: String, base_url: String, timeout: Duration) -> Result<Self> {
        if api_key.trim().is_empty() {
            return Err(ChainError::MissingApiKey);
        }

        let client = Client::builder()
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(8)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            api_key,
            base_url,
            timeout,
        })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self> {
        Self::new(config.api_key.clone(), config.api_url.clone(), config.timeout)
    }

    fn map_send_error(&self, e: reqwest::Error) -> ChainError {
        // The request URL carries the API key; keep it out of the message.
        let e = e.without_url();
        if e.is_timeout() {
            ChainError::Timeout(self.timeout.as_secs())
        } else {
            ChainError::Transport(e.to_string())
        }
    }
}

#[async_trait]
impl ModelClient for GeminiClient {
    async fn call_with_prompt(&self, prompt: &str, temperature: f32, max_tokens: u32) -> Result<String> {
        if prompt.trim().is_empty() {
            return Err(ChainError::EmptyPrompt);
        }

        let url = format!("{}?key={}", self.base_url, self.api_key);
        let request = GenerateRequest::new(prompt, temperature, max_tokens);

        debug!(
            prompt_chars = prompt.len(),
            temperature,
            max_tokens,
            "Calling Gemini API"
        );

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                let err = self.map_send_error(e);
                error!("Gemini API request failed: {}", err);
                err
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| self.map_send_error(e))?;

        if !status.is_success() {
            warn!(status = status.as_u16(), "Gemini API returned an error status");
            return Err(ChainError::Status {
                status: status.as_u16(),
                body: truncate(&body, MAX_ERROR_BODY),
            });
        }

        let text = extract_candidate_text(&body)?;
        debug!(reply_chars = text.len(), "Gemini response received");
        Ok(text)
    }
}

/// Pull `candidates[0].content.parts[0].text` out of a response body, trimmed.
pub fn extract_candidate_text(body: &str) -> Result<String> {
    let parsed: GenerateResponse = serde_json::from_str(body).map_err(|e| {
        ChainError::MalformedResponse(format!("undecodable body: {}", e))
    })?;

    let candidate = parsed
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| ChainError::MalformedResponse("no candidates in response".to_string()))?;

    let part = candidate
        .content
        .and_then(|c| c.parts.into_iter().next())
        .ok_or_else(|| ChainError::MalformedResponse("candidate has no content parts".to_string()))?;

    part.text
        .map(|t| t.trim().to_string())
        .ok_or_else(|| ChainError::MalformedResponse("content part has no text".to_string()))
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max_chars).collect();
        format!("{}...", cut)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<RequestContent>,
    generation_config: GenerationConfig,
}

impl GenerateRequest {
    fn new(prompt: &str, temperature: f32, max_tokens: u32) -> Self {
        Self {
            contents: vec![RequestContent {
                role: "user".to_string(),
                parts: vec![RequestPart {
                    text: prompt.to_string(),
                }],
            }],
            generation_config: GenerationConfig {
                temperature,
                max_output_tokens: max_tokens,
            },
        }
    }
}

#[derive(Debug, Serialize)]
struct RequestContent {
    role: String,
    parts: Vec<RequestPart>,
}

#[derive(Debug, Serialize)]
struct RequestPart {
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<ResponseContent>,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}
