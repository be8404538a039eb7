// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the Anthropic Messages API.
//!
//! Provides [`AnthropicClient`] which handles request construction,
//! authentication, the exclude-from-training compliance header, and
//! transient error retry.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue};
use switchboard_core::compliance::ANTHROPIC_OPT_OUT;
use switchboard_core::{HealthStatus, ProviderErrorKind, SwitchboardError};
use tracing::{debug, warn};

use crate::types::{ApiErrorResponse, MessageRequest, MessageResponse};

const MESSAGES_PATH: &str = "/v1/messages";
const MODELS_PATH: &str = "/v1/models";

/// Delay before the single transient retry.
const RETRY_DELAY: Duration = Duration::from_secs(1);

/// Build a typed provider error for this family.
pub(crate) fn provider_err(kind: ProviderErrorKind, message: String) -> SwitchboardError {
    SwitchboardError::Provider {
        provider: "anthropic".to_string(),
        kind,
        message,
    }
}

/// HTTP client for Anthropic API communication.
///
/// Every request carries the `x-api-key`, `anthropic-version`, and
/// `anthropic-no-training` headers via the default header map, so no call
/// can leave without the opt-out asserted. Transient errors (429, 500,
/// 503, 529) are retried once.
#[derive(Debug, Clone)]
pub struct AnthropicClient {
    client: reqwest::Client,
    base_url: String,
    max_retries: u32,
}

impl AnthropicClient {
    /// Creates a new Anthropic API client against the given base URL.
    pub fn new(
        api_key: &str,
        api_version: &str,
        base_url: String,
    ) -> Result<Self, SwitchboardError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-api-key",
            HeaderValue::from_str(api_key).map_err(|e| {
                SwitchboardError::Config(format!("invalid API key header value: {e}"))
            })?,
        );
        headers.insert(
            "anthropic-version",
            HeaderValue::from_str(api_version).map_err(|e| {
                SwitchboardError::Config(format!("invalid API version header value: {e}"))
            })?,
        );
        headers.insert("content-type", HeaderValue::from_static("application/json"));
        if let Some((header, value)) = ANTHROPIC_OPT_OUT.header_pair() {
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
    pub async fn complete(
        &self,
        request: &MessageRequest,
    ) -> Result<MessageResponse, SwitchboardError> {
        let url = format!("{}{MESSAGES_PATH}", self.base_url);
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
    ///
    /// Spends no tokens. A reachable but erroring API maps to `Degraded`;
    /// auth failures surface as errors so the prober can mark the provider
    /// down.
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
    matches!(status.as_u16(), 429 | 500 | 503 | 529)
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

/// Build an error from a non-2xx status, preferring the structured API
/// error message when the body parses.
fn status_error(status: reqwest::StatusCode, body: &str) -> SwitchboardError {
    let message = if let Ok(api_err) = serde_json::from_str::<ApiErrorResponse>(body) {
        format!(
            "Anthropic API error ({}): {}",
            api_err.error.type_, api_err.error.message
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
