//! Chat-completion call: one round trip to the provider, classified failures.
//!
//! The pipeline only depends on [`CompletionTransport`], a single async
//! method from prompt to completion text. [`GroqClient`] is the production
//! implementation.
//!
//! ## Failure classification
//!
//! | Outcome                                   | Error                 |
//! |-------------------------------------------|-----------------------|
//! | key missing / not `gsk_…` (checked first) | `Unauthorized`        |
//! | reqwest error before any status           | `TransportFailure`    |
//! | 401                                       | `Unauthorized`        |
//! | 429, or "rate limit" in provider message  | `RateLimited`         |
//! | any other non-2xx                         | `ProviderError`       |
//! | 2xx without a first choice / content      | `EmptyCompletion`     |
//!
//! The rate-limit check on the message text is a heuristic tied to how Groq
//! words its errors.
//!
//! There is no retry and, unless configured, no timeout.

use crate::config::{ApiKey, AssistantConfig};
use crate::error::{Stage, StudyError};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Anything that can turn a prompt into completion text.
#[async_trait]
pub trait CompletionTransport: Send + Sync {
    /// Provider name for logging.
    fn name(&self) -> &str;

    /// Send one completion request and return the first choice's content.
    async fn complete(&self, prompt: &str) -> Result<String, StudyError>;
}

// ── Wire types ───────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub(crate) struct ChatRequest<'a> {
    pub model: &'a str,
    pub messages: [ChatMessage<'a>; 2],
    pub temperature: f32,
    pub max_tokens: u32,
}

#[derive(Debug, Serialize)]
pub(crate) struct ChatMessage<'a> {
    pub role: &'static str,
    pub content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<ResponseMessage>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    prompt_tokens: Option<u64>,
    completion_tokens: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: Option<ErrorBody>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

// ── Client ───────────────────────────────────────────────────────────────────

/// Groq (OpenAI-compatible) chat-completion client.
pub struct GroqClient {
    http: reqwest::Client,
    api_key: ApiKey,
    endpoint: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
    system_prompt: String,
}

impl GroqClient {
    /// Build a client from a validated config.
    ///
    /// Re-checks the credential so a client can never exist with a bad key.
    pub fn new(config: &AssistantConfig) -> Result<Self, StudyError> {
        config.api_key.validate()?;

        let mut builder = reqwest::Client::builder();
        if let Some(secs) = config.request_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let http = builder
            .build()
            .map_err(|e| StudyError::internal(Stage::Completion, e))?;

        Ok(Self {
            http,
            api_key: config.api_key.clone(),
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            system_prompt: config.system_prompt.clone(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn request_body<'a>(&'a self, prompt: &'a str) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: &self.system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        }
    }
}

#[async_trait]
impl CompletionTransport for GroqClient {
    fn name(&self) -> &str {
        "groq"
    }

    async fn complete(&self, prompt: &str) -> Result<String, StudyError> {
        self.api_key.validate()?;

        let start = Instant::now();
        info!("Sending request to Groq API ({} chars, model {})", prompt.len(), self.model);

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(self.api_key.expose())
            .json(&self.request_body(prompt))
            .send()
            .await
            .map_err(transport_failure)?;

        let status = response.status();
        let body = response.text().await.map_err(transport_failure)?;

        if !status.is_success() {
            let err = classify_failure(status, &body);
            warn!("Groq API returned {}: {}", status, err);
            return Err(err);
        }

        let content = extract_content(&body)?;
        info!(
            "Successfully received response from Groq API ({} chars, {:?})",
            content.len(),
            start.elapsed()
        );
        Ok(content)
    }
}

fn transport_failure(e: reqwest::Error) -> StudyError {
    let kind = if e.is_timeout() {
        "request timed out"
    } else if e.is_connect() {
        "connection failed"
    } else {
        "request failed"
    };
    // reqwest's Display never includes request headers, so the key stays out.
    StudyError::TransportFailure {
        reason: format!("{kind}: {e}"),
    }
}

/// Map a non-success response to a typed error.
///
/// The message is the provider's `error.message` when the body carries one,
/// otherwise the status's canonical reason phrase.
pub fn classify_failure(status: StatusCode, body: &str) -> StudyError {
    let message = serde_json::from_str::<ErrorEnvelope>(body)
        .ok()
        .and_then(|env| env.error)
        .and_then(|e| e.message)
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .map(str::to_string)
                .unwrap_or_else(|| status.as_str().to_string())
        });

    if status == StatusCode::TOO_MANY_REQUESTS || looks_rate_limited(&message) {
        return StudyError::RateLimited { message };
    }
    if status == StatusCode::UNAUTHORIZED {
        return StudyError::Unauthorized { reason: message };
    }
    StudyError::ProviderError {
        status: status.as_u16(),
        message,
    }
}

fn looks_rate_limited(message: &str) -> bool {
    message.to_ascii_lowercase().contains("rate limit")
}

/// Pull the first choice's content out of a 2xx body.
fn extract_content(body: &str) -> Result<String, StudyError> {
    let parsed: ChatResponse = serde_json::from_str(body).map_err(|e| {
        warn!("Groq API returned an unparsable body: {}", e);
        StudyError::EmptyCompletion
    })?;

    if let Some(usage) = &parsed.usage {
        debug!(
            "Groq usage: {} prompt tokens, {} completion tokens",
            usage.prompt_tokens.unwrap_or(0),
            usage.completion_tokens.unwrap_or(0)
        );
    }

    parsed
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message)
        .and_then(|m| m.content)
        .ok_or(StudyError::EmptyCompletion)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> GroqClient {
        let config = AssistantConfig::builder()
            .api_key("gsk_test")
            .build()
            .unwrap();
        GroqClient::new(&config).unwrap()
    }

    #[test]
    fn request_body_has_fixed_parameters() {
        let c = client();
        assert_eq!(c.model(), "deepseek-r1-distill-llama-70b");
        let json = serde_json::to_value(c.request_body("the prompt")).unwrap();
        assert_eq!(json["model"], "deepseek-r1-distill-llama-70b");
        assert_eq!(json["max_tokens"], 2000);
        assert!((json["temperature"].as_f64().unwrap() - 0.7).abs() < 1e-6);
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["role"], "user");
        assert_eq!(json["messages"][1]["content"], "the prompt");
    }

    #[test]
    fn classify_429_with_rate_limit_message() {
        let body = r#"{"error":{"message":"Rate limit reached for model","type":"tokens"}}"#;
        let err = classify_failure(StatusCode::TOO_MANY_REQUESTS, body);
        assert!(matches!(err, StudyError::RateLimited { ref message } if message.contains("Rate limit")));
    }

    #[test]
    fn classify_rate_limit_text_under_other_status() {
        let body = r#"{"error":{"message":"You hit the rate limit, slow down"}}"#;
        let err = classify_failure(StatusCode::SERVICE_UNAVAILABLE, body);
        assert!(matches!(err, StudyError::RateLimited { .. }));
    }

    #[test]
    fn classify_provider_message_preserved() {
        let body = r#"{"error":{"message":"The model `x` does not exist"}}"#;
        let err = classify_failure(StatusCode::NOT_FOUND, body);
        match err {
            StudyError::ProviderError { status, message } => {
                assert_eq!(status, 404);
                assert_eq!(message, "The model `x` does not exist");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn classify_falls_back_to_status_text() {
        let err = classify_failure(StatusCode::BAD_GATEWAY, "<html>oops</html>");
        match err {
            StudyError::ProviderError { status, message } => {
                assert_eq!(status, 502);
                assert_eq!(message, "Bad Gateway");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn classify_401_as_unauthorized() {
        let body = r#"{"error":{"message":"Invalid API Key"}}"#;
        let err = classify_failure(StatusCode::UNAUTHORIZED, body);
        assert!(matches!(err, StudyError::Unauthorized { ref reason } if reason == "Invalid API Key"));
    }

    #[test]
    fn extract_first_choice() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":"hi"}},{"message":{"content":"no"}}]}"#;
        assert_eq!(extract_content(body).unwrap(), "hi");
    }

    #[test]
    fn extract_rejects_missing_choices() {
        for body in [
            r#"{"choices":[]}"#,
            r#"{}"#,
            r#"{"choices":[{}]}"#,
            r#"{"choices":[{"message":{"content":null}}]}"#,
            "not json",
        ] {
            assert!(
                matches!(extract_content(body), Err(StudyError::EmptyCompletion)),
                "{body}"
            );
        }
    }
}
