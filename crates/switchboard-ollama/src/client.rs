// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for a local Ollama server.
//!
//! No authentication and no compliance header: prompts never leave the
//! host. Transient errors (a busy server or a model still loading) are
//! retried once like the external clients.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue};
use switchboard_core::{HealthStatus, ProviderErrorKind, SwitchboardError};
use tracing::{debug, warn};

use crate::types::{ApiErrorResponse, ChatRequest, ChatResponse};

const CHAT_PATH: &str = "/api/chat";
const TAGS_PATH: &str = "/api/tags";

/// Delay before the single transient retry.
const RETRY_DELAY: Duration = Duration::from_secs(1);

/// Build a typed provider error for this family.
pub(crate) fn provider_err(kind: ProviderErrorKind, message: String) -> SwitchboardError {
    SwitchboardError::Provider {
        provider: "ollama".to_string(),
        kind,
        message,
    }
}

/// HTTP client for Ollama API communication.
#[derive(Debug, Clone)]
pub struct OllamaClient {
    client: reqwest::Client,
    base_url: String,
    max_retries: u32,
}

impl OllamaClient {
    /// Creates a new Ollama client against the given server URL.
    pub fn new(base_url: String) -> Result<Self, SwitchboardError> {
        let mut headers = HeaderMap::new();
        headers.insert("content-type", HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(300))
            .build()
            .map_err(|e| {
                provider_err(
                    ProviderErrorKind::Unavailable,
                    format!("failed to build HTTP client: {e}"),
                )
            })?;

        Ok(Self {
            client,
            base_url,
            max_retries: 1,
        })
    }

    /// Sends a chat request and returns the complete response.
    pub async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse, SwitchboardError> {
        let url = format!("{}{CHAT_PATH}", self.base_url);
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                warn!(attempt, "retrying request after transient error");
                tokio::time::sleep(RETRY_DELAY).await;
            }

            let response = self
                .client
                .post(&url)
                .json(request)
                .send()
                .await
                .map_err(send_error)?;

            let status = response.status();
            debug!(status = %status, attempt, "response received");

            if status.is_success() {
                let body = response.text().await.map_err(|e| {
                    provider_err(
                        ProviderErrorKind::InvalidResponse,
                        format!("failed to read response body: {e}"),
                    )
                })?;
                return serde_json::from_str(&body).map_err(|e| {
                    provider_err(
                        ProviderErrorKind::InvalidResponse,
                        format!("failed to parse API response: {e}"),
                    )
                });
            }

            if is_transient(status) && attempt < self.max_retries {
                let body = response.text().await.unwrap_or_default();
                warn!(status = %status, body = %body, "transient error, will retry");
                last_error = Some(status_error(status, &body));
                continue;
            }

            // Non-transient error or exhausted retries.
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(status, &body));
        }

        Err(last_error.unwrap_or_else(|| {
            provider_err(
                ProviderErrorKind::Unavailable,
                "request failed after retries".to_string(),
            )
        }))
    }

    /// Cheap liveness probe: list installed models.
    ///
    /// A reachable server is `Up`; a server that answers with an error is
    /// `Degraded`; an unreachable server surfaces as an error so the
    /// prober marks the provider down.
    pub async fn health_probe(&self) -> Result<HealthStatus, SwitchboardError> {
        let url = format!("{}{TAGS_PATH}", self.base_url);
        let response = self.client.get(&url).send().await.map_err(send_error)?;
        if response.status().is_success() {
            Ok(HealthStatus::Up)
        } else {
            Ok(HealthStatus::Degraded)
        }
    }
}

/// Status codes worth a same-provider retry: a busy server or a model
/// still being loaded.
fn is_transient(status: reqwest::StatusCode) -> bool {
    matches!(status.as_u16(), 500 | 503)
}

fn status_kind(status: reqwest::StatusCode) -> ProviderErrorKind {
    match status.as_u16() {
        408 => ProviderErrorKind::Timeout,
        500..=599 => ProviderErrorKind::Unavailable,
        _ => ProviderErrorKind::InvalidResponse,
    }
}

fn status_error(status: reqwest::StatusCode, body: &str) -> SwitchboardError {
    let message = if let Ok(api_err) = serde_json::from_str::<ApiErrorResponse>(body) {
        format!("Ollama error: {}", api_err.error)
    } else {
        format!("API returned {status}: {body}")
    };
    provider_err(status_kind(status), message)
}

fn send_error(e: reqwest::Error) -> SwitchboardError {
    let kind = if e.is_timeout() {
        ProviderErrorKind::Timeout
    } else {
        ProviderErrorKind::Unavailable
    };
    provider_err(kind, format!("HTTP request failed: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ChatMessage;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_request() -> ChatRequest {
        ChatRequest {
            model: "llama3.1:8b".into(),
            messages: vec![ChatMessage {
                role: "user".into(),
                content: "Hello".into(),
            }],
            stream: false,
            options: None,
        }
    }

    fn success_body() -> serde_json::Value {
        serde_json::json!({
            "model": "llama3.1:8b",
            "created_at": "2026-03-01T10:00:00Z",
            "message": {"role": "assistant", "content": "Hi there!"},
            "done": true,
            "prompt_eval_count": 11,
            "eval_count": 6
        })
    }

    #[tokio::test]
    async fn chat_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(ResponseTemplate::new(200).set_body_json(success_body()))
            .mount(&server)
            .await;

        let client = OllamaClient::new(server.uri()).unwrap();
        let result = client.chat(&test_request()).await.unwrap();
        assert_eq!(result.message.content, "Hi there!");
        assert_eq!(result.prompt_eval_count, Some(11));
    }

    #[tokio::test]
    async fn model_not_found_is_invalid_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
                "error": "model 'missing:latest' not found"
            })))
            .mount(&server)
            .await;

        let client = OllamaClient::new(server.uri()).unwrap();
        let err = client.chat(&test_request()).await.unwrap_err();
        match err {
            SwitchboardError::Provider { kind, message, .. } => {
                assert_eq!(kind, ProviderErrorKind::InvalidResponse);
                assert!(message.contains("not found"), "got: {message}");
            }
            other => panic!("expected Provider error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn chat_retries_on_503() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(ResponseTemplate::new(200).set_body_json(success_body()))
            .mount(&server)
            .await;

        let client = OllamaClient::new(server.uri()).unwrap();
        let result = client.chat(&test_request()).await.unwrap();
        assert_eq!(result.message.content, "Hi there!");
    }

    #[tokio::test]
    async fn health_probe_up_when_server_answers() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/tags"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"models": []})),
            )
            .mount(&server)
            .await;

        let client = OllamaClient::new(server.uri()).unwrap();
        assert_eq!(client.health_probe().await.unwrap(), HealthStatus::Up);
    }

    #[tokio::test]
    async fn health_probe_errors_when_unreachable() {
        // Nothing listens on this port.
        let client = OllamaClient::new("http://127.0.0.1:9".to_string()).unwrap();
        let err = client.health_probe().await.unwrap_err();
        assert!(matches!(
            err,
            SwitchboardError::Provider {
                kind: ProviderErrorKind::Unavailable,
                ..
            }
        ));
    }
}
