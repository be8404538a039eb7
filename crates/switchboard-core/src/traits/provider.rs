// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Provider adapter trait for LLM provider integrations (Anthropic, OpenAI,
//! Ollama, etc.).

use async_trait::async_trait;

use crate::compliance::CompliancePolicy;
use crate::error::SwitchboardError;
use crate::types::{GenerationRequest, GenerationResponse, HealthStatus, ProviderKind};

/// Adapter for one LLM provider family.
///
/// The execution orchestrator depends only on this capability: every
/// provider family implements `generate` against its own API, maps failures
/// to typed [`SwitchboardError::Provider`] values, and carries its
/// compliance policy so the attached headers can be verified and logged.
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    /// Registry name of this provider (e.g. "anthropic").
    fn name(&self) -> &str;

    /// Whether the provider runs locally or is an external API.
    fn kind(&self) -> ProviderKind;

    /// The exclude-from-training policy this adapter attaches to calls.
    fn compliance(&self) -> &CompliancePolicy;

    /// Sends one generation request and returns the full response.
    ///
    /// Failures are reported as [`SwitchboardError::Provider`] with an
    /// accurate error kind; the orchestrator uses the kind to build the
    /// attempt ledger.
    async fn generate(
        &self,
        request: GenerationRequest,
    ) -> Result<GenerationResponse, SwitchboardError>;

    /// Cheap liveness probe, called by the background prober -- never on the
    /// request path.
    async fn health_check(&self) -> Result<HealthStatus, SwitchboardError>;
}
