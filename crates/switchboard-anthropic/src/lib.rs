// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Anthropic Claude provider adapter for the Switchboard routing service.
//!
//! Implements [`ProviderAdapter`] for the Anthropic Messages API. Every
//! outbound call carries the `anthropic-no-training: opt-out` header; the
//! policy is exposed through [`ProviderAdapter::compliance`] so the
//! registry can verify it at registration time.

pub mod client;
pub mod types;

use async_trait::async_trait;
use switchboard_config::model::AnthropicConfig;
use switchboard_core::compliance::{ANTHROPIC_OPT_OUT, CompliancePolicy};
use switchboard_core::{
    GenerationRequest, GenerationResponse, HealthStatus, ProviderAdapter, ProviderKind,
    SwitchboardError, TokenUsage,
};
use tracing::{debug, info};

use crate::client::AnthropicClient;
use crate::types::{ApiMessage, MessageRequest, ResponseContentBlock};

/// Anthropic Claude provider implementing [`ProviderAdapter`].
///
/// API key resolution order: config -> `ANTHROPIC_API_KEY` env var -> error.
pub struct AnthropicProvider {
    client: AnthropicClient,
    max_tokens: u32,
}

impl AnthropicProvider {
    /// Creates a new Anthropic provider from the given configuration.
    pub fn new(config: &AnthropicConfig) -> Result<Self, SwitchboardError> {
        let api_key = resolve_api_key(&config.api_key)?;
        let client = AnthropicClient::new(&api_key, &config.api_version, config.base_url.clone())?;

        info!(base_url = %config.base_url, "anthropic provider initialized");

        Ok(Self {
            client,
            max_tokens: config.max_tokens,
        })
    }

    fn to_message_request(&self, request: &GenerationRequest) -> MessageRequest {
        let system = if request.system_prompt.is_empty() {
            None
        } else {
            Some(request.system_prompt.clone())
        };

        MessageRequest {
            model: request.model.clone(),
            messages: vec![ApiMessage {
                role: "user".to_string(),
                content: request.user_prompt.clone(),
            }],
            system,
            max_tokens: request.options.max_tokens.unwrap_or(self.max_tokens),
            temperature: request.options.temperature,
        }
    }
}

#[async_trait]
impl ProviderAdapter for AnthropicProvider {
    fn name(&self) -> &str {
        "anthropic"
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::External
    }

    fn compliance(&self) -> &CompliancePolicy {
        &ANTHROPIC_OPT_OUT
    }

    async fn generate(
        &self,
        request: GenerationRequest,
    ) -> Result<GenerationResponse, SwitchboardError> {
        let api_request = self.to_message_request(&request);
        let response = self.client.complete(&api_request).await?;

        let text = response
            .content
            .iter()
            .map(|block| match block {
                ResponseContentBlock::Text { text } => text.as_str(),
            })
            .collect::<Vec<_>>()
            .join("");

        debug!(
            model = %response.model,
            input_tokens = response.usage.input_tokens,
            output_tokens = response.usage.output_tokens,
            "generation complete"
        );

        Ok(GenerationResponse {
            text,
            usage: TokenUsage {
                input_tokens: response.usage.input_tokens,
                output_tokens: response.usage.output_tokens,
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

    std::env::var("ANTHROPIC_API_KEY").map_err(|_| {
        SwitchboardError::Config(
            "Anthropic API key not found. Set anthropic.api_key in config or ANTHROPIC_API_KEY environment variable.".into(),
        )
    })
}
