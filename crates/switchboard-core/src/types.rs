// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared across the Switchboard workspace.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::compliance::CompliancePolicy;

/// Unique identifier assigned to one inbound request.
///
/// A fresh `RunId` is generated at the service boundary for every request
/// and is never reused, even across retries of the same logical call. It
/// correlates the usage record, the attempt ledger, and all log lines of
/// that request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunId(pub String);

impl RunId {
    /// Generate a fresh run id.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier linking a `converse` call to a later `build` call and to all
/// usage records of that exchange.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConversationId(pub String);

impl ConversationId {
    /// Generate a fresh conversation id.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ConversationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for ConversationId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Request phase of the two-phase conversational workflow.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// First phase: accumulate conversational context, no deliverable.
    Converse,
    /// Second phase: consume prior context to produce a persisted deliverable.
    Build,
}

/// Coarse complexity classification driving provider selection.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ComplexityTier {
    /// Trivial exchanges: greetings, short factual questions.
    Simple,
    /// The default middle ground when no strong signal is present.
    Moderate,
    /// Multi-step reasoning, code generation, long analytical prompts.
    Complex,
}

/// Whether a provider runs on local infrastructure or is an external API.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Local,
    External,
}

/// Routing-facing health of a provider.
///
/// `Down` providers are excluded from routing; `Degraded` providers remain
/// routable but are noted in candidate reasons.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Up,
    Degraded,
    Down,
}

/// Lifecycle state of a conversation.
///
/// The pre-creation `NEW` state is represented by the absence of a stored
/// conversation, not by a variant.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ConversationState {
    Conversing,
    Building,
    Complete,
}

/// Author of a conversation turn.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Assistant,
}

/// Sampling options forwarded unmodified to every candidate in the chain.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationOptions {
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

/// One generation call as seen by a provider adapter.
///
/// The orchestrator varies only `model` between fallback attempts; prompts
/// and options are passed through unmodified.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub model: String,
    pub system_prompt: String,
    pub user_prompt: String,
    pub options: GenerationOptions,
}

/// Successful adapter response: generated text plus token accounting.
#[derive(Debug, Clone)]
pub struct GenerationResponse {
    pub text: String,
    pub usage: TokenUsage,
}

/// Token counts reported by a provider for one call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

/// Static description of a provider as registered with the registry.
///
/// Health lives in the registry (mutated by probes and failure reports),
/// not here; a descriptor never changes after registration.
#[derive(Debug, Clone)]
pub struct ProviderDescriptor {
    pub name: String,
    pub kind: ProviderKind,
    /// Model identifiers this provider serves, in preference order.
    pub models: Vec<String>,
    pub compliance: CompliancePolicy,
}

/// A stored conversation as returned by the conversation store.
#[derive(Debug, Clone)]
pub struct ConversationRecord {
    pub id: ConversationId,
    pub caller_type: String,
    pub caller_id: String,
    pub state: ConversationState,
    pub last_mode: Option<Mode>,
    /// Context snapshot consumed by `build`; refreshed after each completed
    /// `converse`. Empty until the first converse completes.
    pub pending_context: String,
    /// ISO 8601 timestamp.
    pub created_at: String,
    /// ISO 8601 timestamp.
    pub updated_at: String,
}

/// One turn of a conversation's ordered history.
#[derive(Debug, Clone)]
pub struct Turn {
    pub conversation_id: ConversationId,
    pub role: TurnRole,
    pub content: String,
    /// ISO 8601 timestamp.
    pub created_at: String,
}

/// Reference to a deliverable persisted by the deliverable store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliverableRef {
    pub id: String,
    pub version: DeliverableVersion,
}

/// One version of a deliverable, carrying its full content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliverableVersion {
    pub id: String,
    pub content: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn run_ids_are_distinct() {
        let a = RunId::new();
        let b = RunId::new();
        assert_ne!(a, b);
    }

    #[test]
    fn tier_display_round_trips() {
        for tier in [
            ComplexityTier::Simple,
            ComplexityTier::Moderate,
            ComplexityTier::Complex,
        ] {
            let s = tier.to_string();
            let parsed = ComplexityTier::from_str(&s).expect("should parse back");
            assert_eq!(tier, parsed);
        }
    }

    #[test]
    fn mode_serializes_lowercase() {
        let json = serde_json::to_string(&Mode::Converse).expect("should serialize");
        assert_eq!(json, "\"converse\"");
        let parsed: Mode = serde_json::from_str("\"build\"").expect("should deserialize");
        assert_eq!(parsed, Mode::Build);
    }

    #[test]
    fn conversation_state_display() {
        assert_eq!(ConversationState::Conversing.to_string(), "conversing");
        assert_eq!(ConversationState::Building.to_string(), "building");
        assert_eq!(ConversationState::Complete.to_string(), "complete");
    }

    #[test]
    fn health_status_from_str() {
        assert_eq!(HealthStatus::from_str("up").unwrap(), HealthStatus::Up);
        assert_eq!(
            HealthStatus::from_str("degraded").unwrap(),
            HealthStatus::Degraded
        );
        assert_eq!(HealthStatus::from_str("down").unwrap(), HealthStatus::Down);
    }
}
