// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ollama local provider adapter for the Switchboard routing service.
//!
//! Implements [`ProviderAdapter`] for a local Ollama server. As a local
//! family its compliance policy is [`CompliancePolicy::NotRequired`]: no
//! opt-out header is attached because prompts never leave the host.

pub mod client;
pub mod types;

use async_trait::async_trait;
use switchboard_config::model::OllamaConfig;
use switchboard_core::compliance::CompliancePolicy;
use switchboard_core::{
    GenerationRequest, GenerationResponse, HealthStatus, ProviderAdapter, ProviderKind,
    SwitchboardError, TokenUsage,
};
use tracing::{debug, info};

use crate::client::OllamaClient;
use crate::types::{ChatMessage, ChatOptions, ChatRequest};

/// Ollama local provider implementing [`ProviderAdapter`].
pub struct OllamaProvider {
    client: OllamaClient,
}

impl OllamaProvider {
    /// Creates a new Ollama provider from the given configuration.
    pub fn new(config: &OllamaConfig) -> Result<Self, SwitchboardError> {
        let client = OllamaClient::new(config.base_url.clone())?;
        info!(base_url = %config.base_url, "ollama provider initialized");
        Ok(Self { client })
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

        let options = if request.options.temperature.is_none()
            && request.options.max_tokens.is_none()
        {
            None
        } else {
            Some(ChatOptions {
                temperature: request.options.temperature,
                num_predict: request.options.max_tokens,
            })
        };

        ChatRequest {
            model: request.model.clone(),
            messages,
            stream: false,
            options,
        }
    }
}

#[async_trait]
impl ProviderAdapter for OllamaProvider {
    fn name(&self) -> &str {
        "ollama"
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::Local
    }

    fn compliance(&self) -> &CompliancePolicy {
        &CompliancePolicy::NotRequired
    }

    async fn generate(
        &self,
        request: GenerationRequest,
    ) -> Result<GenerationResponse, SwitchboardError> {
        let api_request = self.to_chat_request(&request);
        let response = self.client.chat(&api_request).await?;

        let usage = TokenUsage {
            input_tokens: response.prompt_eval_count.unwrap_or(0),
            output_tokens: response.eval_count.unwrap_or(0),
        };

        debug!(
            model = %response.model,
            input_tokens = usage.input_tokens,
            output_tokens = usage.output_tokens,
            "generation complete"
        );

        Ok(GenerationResponse {
            text: response.message.content,
            usage,
        })
    }

    async fn health_check(&self) -> Result<HealthStatus, SwitchboardError> {
        self.client.health_probe().await
    }
}
