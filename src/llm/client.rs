//! HTTP client for the hosted text-generation service.

use super::config::ApiConfig;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, instrument, warn};
use url::Url;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LLMError {
    #[error("AI service is currently unavailable. Please ensure the API key is configured.")]
    NotConfigured,
    #[error("The API key is invalid. Please check your configuration.")]
    InvalidApiKey,
    #[error("Access forbidden - insufficient permissions")]
    Forbidden,
    #[error("Rate limit exceeded - too many requests")]
    RateLimited,
    #[error("Server error ({status}): {body}")]
    Server { status: u16, body: String },
    #[error("HTTP error {status}: {body}")]
    Http { status: u16, body: String },
    #[error("{0}")]
    Transport(String),
    #[error("Failed to parse API response as JSON: {0}")]
    MalformedResponse(String),
    #[error("The AI model returned an empty response.")]
    EmptyResponse,
    #[error("Invalid endpoint URL: {0}")]
    InvalidUrl(String),
}

impl LLMError {
    /// Whether trying the same request again could succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            LLMError::RateLimited | LLMError::Server { .. } | LLMError::Transport(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, LLMError>;

#[derive(Debug, Clone, PartialEq)]
pub struct GenerationConfig {
    /// Ask the service for `application/json` output.
    pub json_response: bool,
    pub thinking_budget: u32,
    pub temperature: Option<f32>,
    pub max_output_tokens: Option<u32>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self::quick()
    }
}

impl GenerationConfig {
    /// Short free-text answers; thinking disabled for latency.
    pub fn quick() -> Self {
        Self {
            json_response: false,
            thinking_budget: 0,
            temperature: None,
            max_output_tokens: None,
        }
    }

    /// JSON documents that need reasoning.
    pub fn structured() -> Self {
        Self {
            json_response: true,
            thinking_budget: 15000,
            temperature: None,
            max_output_tokens: None,
        }
    }
}

/// Anything that turns a prompt into text.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str, config: &GenerationConfig) -> Result<String>;

    fn model_name(&self) -> &str;
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: RequestGenerationConfig,
}

#[derive(Serialize, Debug)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Serialize, Debug)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct RequestGenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
    thinking_config: ThinkingConfig,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct ThinkingConfig {
    thinking_budget: u32,
}

#[derive(Deserialize, Debug, Default)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize, Debug, Default)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Deserialize, Debug, Default)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize, Debug, Default)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
    /// Reasoning summaries are not part of the answer.
    #[serde(default)]
    thought: bool,
}

impl GenerateContentResponse {
    fn text(&self) -> String {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .filter(|p| !p.thought)
                    .filter_map(|p| p.text.as_deref())
                    .collect::<String>()
            })
            .unwrap_or_default()
    }
}

/// Client for Gemini-style `generateContent` endpoints.
#[derive(Clone)]
pub struct GeminiClient {
    http: Client,
    endpoint: Url,
    model: String,
    max_retries: u32,
    retry_delay: Duration,
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // The endpoint carries the key; keep it out of logs.
        f.debug_struct("GeminiClient")
            .field("model", &self.model)
            .field("max_retries", &self.max_retries)
            .finish()
    }
}

impl GeminiClient {
    /// Fails with [`LLMError::NotConfigured`] when no API key is set.
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or(LLMError::NotConfigured)?;

        let mut endpoint = Url::parse(&format!(
            "{}/models/{}:generateContent",
            config.api_url.trim_end_matches('/'),
            config.model
        ))
        .map_err(|e| LLMError::InvalidUrl(e.to_string()))?;
        endpoint.query_pairs_mut().append_pair("key", api_key);

        let http = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .build()
            .map_err(|e| LLMError::Transport(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http,
            endpoint,
            model: config.model.clone(),
            max_retries: config.max_retries.max(1),
            retry_delay: Duration::from_millis(config.retry_delay_ms),
        })
    }

    async fn request_once(&self, body: &GenerateContentRequest<'_>) -> Result<String> {
        let response = self
            .http
            .post(self.endpoint.clone())
            .json(body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LLMError::Transport(
                        "Request timeout - the API took too long to respond".to_string(),
                    )
                } else if e.is_connect() {
                    LLMError::Transport("Connection error - unable to reach the API".to_string())
                } else {
                    LLMError::Transport(format!("Network error: {}", e.without_url()))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(classify_status(status.as_u16(), error_text));
        }

        let payload: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| LLMError::MalformedResponse(e.to_string()))?;

        let text = payload.text();
        if text.trim().is_empty() {
            return Err(LLMError::EmptyResponse);
        }
        Ok(text)
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    #[instrument(skip(self, prompt), fields(model = %self.model, prompt_len = prompt.len()))]
    async fn generate(&self, prompt: &str, config: &GenerationConfig) -> Result<String> {
        let body = GenerateContentRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![RequestPart { text: prompt }],
            }],
            generation_config: RequestGenerationConfig {
                response_mime_type: config.json_response.then_some("application/json"),
                temperature: config.temperature,
                max_output_tokens: config.max_output_tokens,
                thinking_config: ThinkingConfig {
                    thinking_budget: config.thinking_budget,
                },
            },
        };

        let mut attempt = 1;
        loop {
            match self.request_once(&body).await {
                Ok(text) => {
                    debug!(attempt, len = text.len(), "Generation succeeded");
                    return Ok(text);
                }
                Err(e) if e.is_retryable() && attempt < self.max_retries => {
                    warn!(attempt, max = self.max_retries, error = %e, "Generation attempt failed");
                    tokio::time::sleep(self.retry_delay * attempt).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

/// Maps a non-success status and body to an error.
pub(crate) fn classify_status(status: u16, body: String) -> LLMError {
    match status {
        400 if body.contains("API key not valid") => LLMError::InvalidApiKey,
        401 => LLMError::InvalidApiKey,
        403 => LLMError::Forbidden,
        429 => LLMError::RateLimited,
        500..=599 => LLMError::Server { status, body },
        _ => LLMError::Http { status, body },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::MockServer;

    #[test]
    fn missing_key_is_a_construction_error() {
        let config = ApiConfig::default();
        assert_eq!(GeminiClient::new(&config).unwrap_err(), LLMError::NotConfigured);

        let blank = ApiConfig {
            api_key: Some("  ".to_string()),
            ..ApiConfig::default()
        };
        assert_eq!(GeminiClient::new(&blank).unwrap_err(), LLMError::NotConfigured);
    }

    #[test]
    fn endpoint_carries_model_and_key() {
        let config = ApiConfig {
            api_key: Some("abc".to_string()),
            api_url: "https://example.test/v1beta/".to_string(),
            ..ApiConfig::default()
        };
        let client = GeminiClient::new(&config).unwrap();
        assert_eq!(
            client.endpoint.as_str(),
            "https://example.test/v1beta/models/gemini-2.5-flash-lite:generateContent?key=abc"
        );
        assert!(!format!("{:?}", client).contains("abc"));
    }

    #[test]
    fn status_codes_are_classified() {
        assert_eq!(
            classify_status(400, "API key not valid. Please pass a valid API key.".into()),
            LLMError::InvalidApiKey
        );
        assert_eq!(classify_status(401, String::new()), LLMError::InvalidApiKey);
        assert_eq!(classify_status(429, String::new()), LLMError::RateLimited);
        assert!(classify_status(503, "busy".into()).is_retryable());
        assert!(!classify_status(400, "bad request".into()).is_retryable());
        assert!(!LLMError::InvalidApiKey.is_retryable());
    }

    #[test]
    fn request_body_uses_service_field_names() {
        let body = GenerateContentRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![RequestPart { text: "hi" }],
            }],
            generation_config: RequestGenerationConfig {
                response_mime_type: Some("application/json"),
                temperature: None,
                max_output_tokens: None,
                thinking_config: ThinkingConfig {
                    thinking_budget: 15000,
                },
            },
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["contents"][0]["parts"][0]["text"], "hi");
        assert_eq!(
            value["generationConfig"]["responseMimeType"],
            "application/json"
        );
        assert_eq!(
            value["generationConfig"]["thinkingConfig"]["thinkingBudget"],
            15000
        );
        assert!(value["generationConfig"].get("temperature").is_none());
    }

    const ANSWER: &str = r#"{"candidates": [{"content": {"parts": [{"text": "Keep going."}]}}]}"#;

    fn local_client(base_url: &str) -> GeminiClient {
        GeminiClient::new(&ApiConfig {
            api_key: Some("test-key".to_string()),
            api_url: format!("{}/v1beta", base_url),
            max_retries: 3,
            retry_delay_ms: 0,
            ..ApiConfig::default()
        })
        .unwrap()
    }

    #[tokio::test]
    async fn server_errors_are_retried() {
        let server =
            MockServer::start(vec![("503 Service Unavailable", "busy"), ("200 OK", ANSWER)]).await;
        let client = local_client(&server.base_url);

        let text = client
            .generate("quote please", &GenerationConfig::quick())
            .await
            .unwrap();
        assert_eq!(text, "Keep going.");

        let requests = server.requests().await;
        assert_eq!(requests.len(), 2);
        assert!(requests[0]
            .starts_with("POST /v1beta/models/gemini-2.5-flash-lite:generateContent?key=test-key"));
        assert!(requests[1].contains("\"thinkingBudget\":0"));
    }

    #[tokio::test]
    async fn auth_failures_are_not_retried() {
        let server =
            MockServer::start(vec![("401 Unauthorized", "denied"), ("200 OK", ANSWER)]).await;
        let client = local_client(&server.base_url);

        let err = client
            .generate("quote please", &GenerationConfig::quick())
            .await
            .unwrap_err();
        assert_eq!(err, LLMError::InvalidApiKey);
        assert_eq!(server.hits(), 1);
    }

    #[tokio::test]
    async fn retries_stop_at_the_limit() {
        let server = MockServer::start(vec![
            ("429 Too Many Requests", "slow down"),
            ("429 Too Many Requests", "slow down"),
            ("429 Too Many Requests", "slow down"),
            ("200 OK", ANSWER),
        ])
        .await;
        let client = local_client(&server.base_url);

        let err = client
            .generate("quote please", &GenerationConfig::quick())
            .await
            .unwrap_err();
        assert_eq!(err, LLMError::RateLimited);
        assert_eq!(server.hits(), 3);
    }

    #[tokio::test]
    async fn reply_without_text_is_empty_response() {
        let server = MockServer::start(vec![("200 OK", r#"{"candidates": []}"#)]).await;
        let client = local_client(&server.base_url);

        let err = client
            .generate("quote please", &GenerationConfig::structured())
            .await
            .unwrap_err();
        assert_eq!(err, LLMError::EmptyResponse);
        assert_eq!(server.hits(), 1);
    }

    #[test]
    fn response_text_joins_answer_parts() {
        let payload: GenerateContentResponse = serde_json::from_str(
            r#"{"candidates": [{"content": {"parts": [
                {"text": "thinking...", "thought": true},
                {"text": "{\"title\":"},
                {"text": " \"X\"}"}
            ]}}]}"#,
        )
        .unwrap();
        assert_eq!(payload.text(), "{\"title\": \"X\"}");

        let empty: GenerateContentResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(empty.text(), "");
    }
}
