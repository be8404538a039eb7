// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! OpenAI provider adapter for the Switchboard routing service.
//!
//! Implements [`ProviderAdapter`] for the Chat Completions API. Every
//! outbound call carries the `openai-data-retention: no-train` header.

pub mod client;
pub mod types;

use async_trait::async_trait;
use switchboard_config::model::OpenAiConfig;
use switchboard_core::compliance::{CompliancePolicy, OPENAI_OPT_OUT};
use switchboard_core::{
    GenerationRequest, GenerationResponse, HealthStatus, ProviderAdapter, ProviderErrorKind,
    ProviderKind, SwitchboardError, TokenUsage,
};
use tracing::{debug, info};

use crate::client::{OpenAiClient, provider_err};
use crate::types::{ChatMessage, ChatRequest};

/// OpenAI provider implementing [`ProviderAdapter`].
///
/// API key resolution order: config -> `OPENAI_API_KEY` env var -> error.
pub struct OpenAiProvider {
    client: OpenAiClient,
    max_tokens: u32,
}

impl OpenAiProvider {
    /// Creates a new OpenAI provider from the given configuration.
    pub fn new(config: &OpenAiConfig) -> Result<Self, SwitchboardError> {
        let api_key = resolve_api_key(&config.api_key)?;
        let client = OpenAiClient::new(&api_key, config.base_url.clone())?;

        info!(base_url = %config.base_url, "openai provider initialized");

        Ok(Self {
            client,
            max_tokens: config.max_tokens,
        })
    }

    fn to_chat_request(&self, request: &GenerationRequest) -> ChatRequest {
        let mut messages = Vec::with_capacity(2);
        if !request.system_prompt.is_empty() {
            messages.push(ChatMessage {
                role: "system".to_string(),
                content: request.system_prompt.clone(),
            });
        }
        messages.push(ChatMessage {
            role: "user".to_string(),
            content: request.user_prompt.clone(),
        });

        ChatRequest {
            model: request.model.clone(),
            messages,
            max_tokens: request.options.max_tokens.unwrap_or(self.max_tokens),
            temperature: request.options.temperature,
        }
    }
}

#[async_trait]
impl ProviderAdapter for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::External
    }

    fn compliance(&self) -> &CompliancePolicy {
        &OPENAI_OPT_OUT
    }

    async fn generate(
        &self,
        request: GenerationRequest,
    ) -> Result<GenerationResponse, SwitchboardError> {
        let api_request = self.to_chat_request(&request);
        let response = self.client.complete(&api_request).await?;

        let choice = response.choices.into_iter().next().ok_or_else(|| {
            provider_err(
                ProviderErrorKind::InvalidResponse,
                "response contained no choices".to_string(),
            )
        })?;

        debug!(
            model = %response.model,
            input_tokens = response.usage.prompt_tokens,
            output_tokens = response.usage.completion_tokens,
            finish_reason = choice.finish_reason.as_deref().unwrap_or("none"),
            "generation complete"
        );

        Ok(GenerationResponse {
            text: choice.message.content,
            usage: TokenUsage {
                input_tokens: response.usage.prompt_tokens,
                output_tokens: response.usage.completion_tokens,
            },
        })
    }

    async fn health_check(&self) -> Result<HealthStatus, SwitchboardError> {
        self.client.health_probe().await
    }
}

fn resolve_api_key(config_key: &Option<String>) -> Result<String, SwitchboardError> {
    if let Some(key) = config_key
        && !key.is_empty()
    {
        return Ok(key.clone());
    }

    std::env::var("OPENAI_API_KEY").map_err(|_| {
        SwitchboardError::Config(
            "OpenAI API key not found. Set openai.api_key in config or OPENAI_API_KEY environment variable.".into(),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use switchboard_core::GenerationOptions;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config(base_url: &str) -> OpenAiConfig {
        OpenAiConfig {
            api_key: Some("test-api-key".into()),
            base_url: base_url.to_string(),
            ..OpenAiConfig::default()
        }
    }

    fn test_request() -> GenerationRequest {
        GenerationRequest {
            model: "gpt-4o".into(),
            system_prompt: "You are a router test.".into(),
            user_prompt: "Hello".into(),
            options: GenerationOptions::default(),
        }
    }

    #[test]
    fn resolve_api_key_from_config() {
        let result = resolve_api_key(&Some("sk-test-456".into()));
        assert_eq!(result.unwrap(), "sk-test-456");
    }

    #[test]
    fn adapter_metadata() {
        let provider = OpenAiProvider::new(&test_config("http://localhost:9")).unwrap();
        assert_eq!(provider.name(), "openai");
        assert_eq!(provider.kind(), ProviderKind::External);
        assert_eq!(
            provider.compliance().header_pair(),
            Some(("openai-data-retention", "no-train"))
        );
    }

    #[test]
    fn request_conversion_places_system_first() {
        let provider = OpenAiProvider::new(&test_config("http://localhost:9")).unwrap();
        let api_req = provider.to_chat_request(&test_request());

        assert_eq!(api_req.messages.len(), 2);
        assert_eq!(api_req.messages[0].role, "system");
        assert_eq!(api_req.messages[1].role, "user");
        assert_eq!(api_req.max_tokens, 4096);
    }

    #[test]
    fn request_conversion_drops_empty_system_prompt() {
        let provider = OpenAiProvider::new(&test_config("http://localhost:9")).unwrap();
        let mut request = test_request();
        request.system_prompt = String::new();

        let api_req = provider.to_chat_request(&request);
        assert_eq!(api_req.messages.len(), 1);
        assert_eq!(api_req.messages[0].role, "user");
    }

    #[tokio::test]
    async fn generate_returns_first_choice() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("openai-data-retention", "no-train"))
            .and(body_partial_json(serde_json::json!({"model": "gpt-4o"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "chatcmpl-adapter",
                "object": "chat.completion",
                "model": "gpt-4o",
                "choices": [{
                    "index": 0,
                    "message": {"role": "assistant", "content": "Routed!"},
                    "finish_reason": "stop"
                }],
                "usage": {"prompt_tokens": 15, "completion_tokens": 6, "total_tokens": 21}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let provider = OpenAiProvider::new(&test_config(&server.uri())).unwrap();
        let response = provider.generate(test_request()).await.unwrap();

        assert_eq!(response.text, "Routed!");
        assert_eq!(response.usage.input_tokens, 15);
        assert_eq!(response.usage.output_tokens, 6);
    }

    #[tokio::test]
    async fn empty_choices_is_invalid_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "chatcmpl-empty",
                "object": "chat.completion",
                "model": "gpt-4o",
                "choices": [],
                "usage": {"prompt_tokens": 2, "completion_tokens": 0, "total_tokens": 2}
            })))
            .mount(&server)
            .await;

        let provider = OpenAiProvider::new(&test_config(&server.uri())).unwrap();
        let err = provider.generate(test_request()).await.unwrap_err();
        assert!(matches!(
            err,
            SwitchboardError::Provider {
                kind: ProviderErrorKind::InvalidResponse,
                ..
            }
        ));
    }
}
