// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the OpenAI Chat Completions API.
//!
//! Mirrors the Anthropic client: bearer authentication and the
//! `openai-data-retention` compliance header live in the default header
//! map, transient errors are retried once.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue};
use switchboard_core::compliance::OPENAI_OPT_OUT;
use switchboard_core::{HealthStatus, ProviderErrorKind, SwitchboardError};
use tracing::{debug, warn};

use crate::types::{ApiErrorResponse, ChatRequest, ChatResponse};

const COMPLETIONS_PATH: &str = "/v1/chat/completions";
const MODELS_PATH: &str = "/v1/models";

/// Delay before the single transient retry.
const RETRY_DELAY: Duration = Duration::from_secs(1);

/// Build a typed provider error for this family.
pub(crate) fn provider_err(kind: ProviderErrorKind, message: String) -> SwitchboardError {
    SwitchboardError::Provider {
        provider: "openai".to_string(),
        kind,
        message,
    }
}

/// HTTP client for OpenAI API communication.
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    client: reqwest::Client,
    base_url: String,
    max_retries: u32,
}

impl OpenAiClient {
    /// Creates a new OpenAI API client against the given base URL.
    pub fn new(api_key: &str, base_url: String) -> Result<Self, SwitchboardError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "authorization",
            HeaderValue::from_str(&format!("Bearer {api_key}")).map_err(|e| {
                SwitchboardError::Config(format!("invalid API key header value: {e}"))
            })?,
        );
        headers.insert("content-type", HeaderValue::from_static("application/json"));
        if let Some((header, value)) = OPENAI_OPT_OUT.header_pair() {
            headers.insert(header, HeaderValue::from_static(value));
        }

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

    /// Sends a request and returns the full response.
    ///
    /// On transient errors, retries once after a short delay.
    pub async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse, SwitchboardError> {
        let url = format!("{}{COMPLETIONS_PATH}", self.base_url);
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

    /// Cheap liveness probe against the models listing endpoint.
    pub async fn health_probe(&self) -> Result<HealthStatus, SwitchboardError> {
        let url = format!("{}{MODELS_PATH}", self.base_url);
        let response = self.client.get(&url).send().await.map_err(send_error)?;
        let status = response.status();
        if status.is_success() {
            return Ok(HealthStatus::Up);
        }
        if is_transient(status) {
            return Ok(HealthStatus::Degraded);
        }
        let body = response.text().await.unwrap_or_default();
        Err(status_error(status, &body))
    }
}

/// Status codes worth a same-provider retry.
fn is_transient(status: reqwest::StatusCode) -> bool {
    matches!(status.as_u16(), 429 | 500 | 503)
}

fn status_kind(status: reqwest::StatusCode) -> ProviderErrorKind {
    match status.as_u16() {
        401 | 403 => ProviderErrorKind::AuthFailure,
        429 => ProviderErrorKind::RateLimited,
        408 => ProviderErrorKind::Timeout,
        500..=599 => ProviderErrorKind::Unavailable,
        _ => ProviderErrorKind::InvalidResponse,
    }
}

fn status_error(status: reqwest::StatusCode, body: &str) -> SwitchboardError {
    let message = if let Ok(api_err) = serde_json::from_str::<ApiErrorResponse>(body) {
        format!(
            "OpenAI API error ({}): {}",
            api_err.error.type_.as_deref().unwrap_or("unknown"),
            api_err.error.message
        )
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
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_client(base_url: &str) -> OpenAiClient {
        OpenAiClient::new("test-api-key", base_url.to_string()).unwrap()
    }

    fn test_request() -> ChatRequest {
        ChatRequest {
            model: "gpt-4o".into(),
            messages: vec![ChatMessage {
                role: "user".into(),
                content: "Hello".into(),
            }],
            max_tokens: 256,
            temperature: None,
        }
    }

    fn success_body() -> serde_json::Value {
        serde_json::json!({
            "id": "chatcmpl-test",
            "object": "chat.completion",
            "model": "gpt-4o",
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": "Hi there!"},
                "finish_reason": "stop"
            }],
            "usage": {"prompt_tokens": 8, "completion_tokens": 4, "total_tokens": 12}
        })
    }

    #[tokio::test]
    async fn complete_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(success_body()))
            .mount(&server)
            .await;

        let result = test_client(&server.uri())
            .complete(&test_request())
            .await
            .unwrap();
        assert_eq!(result.id, "chatcmpl-test");
        assert_eq!(result.usage.prompt_tokens, 8);
    }

    #[tokio::test]
    async fn every_call_carries_the_retention_opt_out_header() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer test-api-key"))
            .and(header("openai-data-retention", "no-train"))
            .respond_with(ResponseTemplate::new(200).set_body_json(success_body()))
            .expect(1)
            .mount(&server)
            .await;

        let result = test_client(&server.uri()).complete(&test_request()).await;
        assert!(result.is_ok(), "headers should match: {result:?}");
    }

    #[tokio::test]
    async fn complete_retries_on_500() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(500))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(success_body()))
            .mount(&server)
            .await;

        let result = test_client(&server.uri())
            .complete(&test_request())
            .await
            .unwrap();
        assert_eq!(result.id, "chatcmpl-test");
    }

    #[tokio::test]
    async fn rate_limit_is_typed_after_retries() {
        let server = MockServer::start().await;
        let error_body = serde_json::json!({
            "error": {"message": "Rate limit reached", "type": "rate_limit_error"}
        });
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(429).set_body_json(&error_body))
            .expect(2)
            .mount(&server)
            .await;

        let err = test_client(&server.uri())
            .complete(&test_request())
            .await
            .unwrap_err();
        match err {
            SwitchboardError::Provider { kind, message, .. } => {
                assert_eq!(kind, ProviderErrorKind::RateLimited);
                assert!(message.contains("rate_limit_error"), "got: {message}");
            }
            other => panic!("expected Provider error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn auth_failure_is_typed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
                "error": {"message": "Incorrect API key", "type": "invalid_request_error"}
            })))
            .mount(&server)
            .await;

        let err = test_client(&server.uri())
            .complete(&test_request())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            SwitchboardError::Provider {
                kind: ProviderErrorKind::AuthFailure,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn health_probe_up_on_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/models"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"data": []})),
            )
            .mount(&server)
            .await;

        let status = test_client(&server.uri()).health_probe().await.unwrap();
        assert_eq!(status, HealthStatus::Up);
    }
}
