//! Claude API client backing the document generators.

use std::time::Duration;

use backon::{ExponentialBuilder, Retryable};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

const API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";
const DEFAULT_MAX_TOKENS: u32 = 4096;

#[derive(Debug, Clone, Error)]
pub enum ClaudeApiError {
    #[error("missing api key: ANTHROPIC_API_KEY is not set")]
    MissingApiKey,
    #[error("network error: {0}")]
    Transport(String),
    #[error("timeout")]
    Timeout,
    #[error("invalid api key")]
    InvalidApiKey,
    #[error("rate limited")]
    RateLimited,
    #[error("http {status}: {body}")]
    Http { status: u16, body: String },
    #[error("bad response: {0}")]
    BadResponse(String),
}

impl ClaudeApiError {
    fn is_transient(&self) -> bool {
        match self {
            Self::Transport(_) | Self::Timeout | Self::RateLimited => true,
            Self::Http { status, .. } => (500..=599).contains(status),
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
struct ApiMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Serialize)]
struct ApiRequest {
    model: String,
    max_tokens: u32,
    messages: Vec<ApiMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum ContentBlock {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    content: Vec<ContentBlock>,
}

impl ApiResponse {
    fn text(self) -> Option<String> {
        self.content.into_iter().find_map(|block| match block {
            ContentBlock::Text { text } => Some(text),
            ContentBlock::Other => None,
        })
    }
}

#[derive(Debug, Clone)]
pub struct ClaudeApiClient {
    http: Client,
    api_key: String,
    model: String,
}

impl ClaudeApiClient {
    const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

    pub fn new(api_key: String, model: Option<String>) -> Result<Self, ClaudeApiError> {
        let http = Client::builder()
            .timeout(Self::REQUEST_TIMEOUT)
            .user_agent(concat!("atelier/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ClaudeApiError::Transport(e.to_string()))?;
        Ok(Self {
            http,
            api_key,
            model: model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
        })
    }

    /// Build a client from `ANTHROPIC_API_KEY`, or `None` when the key is
    /// absent — callers degrade to their canned fallback in that case.
    pub fn from_env() -> Result<Option<Self>, ClaudeApiError> {
        match std::env::var("ANTHROPIC_API_KEY") {
            Ok(key) if !key.trim().is_empty() => Self::new(key, None).map(Some),
            _ => Ok(None),
        }
    }

    /// One user prompt in, response text out. Transient failures are retried
    /// with jittered exponential backoff.
    pub async fn ask(
        &self,
        prompt: &str,
        system: Option<String>,
    ) -> Result<String, ClaudeApiError> {
        let request = ApiRequest {
            model: self.model.clone(),
            max_tokens: DEFAULT_MAX_TOKENS,
            messages: vec![ApiMessage {
                role: "user",
                content: prompt.to_string(),
            }],
            system,
        };

        let response = (|| async { self.send(&request).await })
            .retry(
                &ExponentialBuilder::default()
                    .with_min_delay(Duration::from_secs(1))
                    .with_max_delay(Duration::from_secs(30))
                    .with_max_times(3)
                    .with_jitter(),
            )
            .when(ClaudeApiError::is_transient)
            .notify(|err, after| {
                warn!("Claude API call failed, retrying in {:.1}s: {err}", after.as_secs_f64());
            })
            .await?;

        response
            .text()
            .ok_or_else(|| ClaudeApiError::BadResponse("no text content".to_string()))
    }

    /// `ask`, then parse the reply as JSON — tolerating a fenced code block
    /// around it, since models tend to add one.
    pub async fn ask_json<T: for<'de> Deserialize<'de>>(
        &self,
        prompt: &str,
        system: Option<String>,
    ) -> Result<T, ClaudeApiError> {
        let reply = self.ask(prompt, system).await?;
        let json = strip_code_fence(&reply);
        serde_json::from_str(json).map_err(|e| {
            ClaudeApiError::BadResponse(format!(
                "{e} (reply preview: {})",
                json.chars().take(200).collect::<String>()
            ))
        })
    }

    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, ClaudeApiError> {
        let res = self
            .http
            .post(API_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ClaudeApiError::Timeout
                } else {
                    ClaudeApiError::Transport(e.to_string())
                }
            })?;

        match res.status() {
            s if s.is_success() => res
                .json::<ApiResponse>()
                .await
                .map_err(|e| ClaudeApiError::BadResponse(e.to_string())),
            StatusCode::UNAUTHORIZED => Err(ClaudeApiError::InvalidApiKey),
            StatusCode::TOO_MANY_REQUESTS => Err(ClaudeApiError::RateLimited),
            s => Err(ClaudeApiError::Http {
                status: s.as_u16(),
                body: res.text().await.unwrap_or_default(),
            }),
        }
    }
}

/// Strip a surrounding ``` or ```json fence, if present.
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    let rest = rest.strip_prefix('\n').unwrap_or(rest);
    match rest.rfind("```") {
        Some(end) => rest[..end].trim(),
        None => rest.trim(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_json_passes_through() {
        assert_eq!(strip_code_fence(r#"{"a":1}"#), r#"{"a":1}"#);
    }

    #[test]
    fn json_fence_is_stripped() {
        let input = "```json\n{\"a\":1}\n```";
        assert_eq!(strip_code_fence(input), r#"{"a":1}"#);
    }

    #[test]
    fn anonymous_fence_is_stripped() {
        let input = "```\n{\"a\":1}\n```";
        assert_eq!(strip_code_fence(input), r#"{"a":1}"#);
    }

    #[test]
    fn missing_key_yields_no_client() {
        // Only meaningful when the variable is unset in the test environment,
        // which is the default for CI.
        if std::env::var("ANTHROPIC_API_KEY").is_err() {
            assert!(ClaudeApiClient::from_env().unwrap().is_none());
        }
    }
}
