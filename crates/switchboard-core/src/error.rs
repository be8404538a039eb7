// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error taxonomy for the Switchboard routing service.
//!
//! Propagation policy: per-attempt [`SwitchboardError::Provider`] failures
//! are always recovered inside the execution orchestrator by advancing the
//! fallback chain; only chain exhaustion and missing-context conditions are
//! user-visible, and both carry enough detail to be actionable.

use thiserror::Error;

use crate::types::ComplexityTier;

/// The primary error type used across the Switchboard workspace.
#[derive(Debug, Error)]
pub enum SwitchboardError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database connection, query failure, migration).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// No routing candidate exists for the request's tier. Fatal to the
    /// request; reported before any execution attempt.
    #[error("no provider available for tier {tier}")]
    NoProviderAvailable { tier: ComplexityTier },

    /// A single provider attempt failed. Recovered by the orchestrator,
    /// never surfaced to the caller on its own.
    #[error("provider {provider} failed ({kind}): {message}")]
    Provider {
        provider: String,
        kind: ProviderErrorKind,
        message: String,
    },

    /// Every candidate in the chain failed. Carries the ordered attempt
    /// summaries so the caller sees what was tried and why each failed.
    #[error("all providers exhausted: {}", summarize_attempts(attempts))]
    AllProvidersExhausted { attempts: Vec<AttemptSummary> },

    /// `build` was called without valid prior converse state. Fatal to that
    /// request only; no provider call is made.
    #[error("no conversation context for {conversation_id}: a build call requires a prior converse call on the same conversation")]
    MissingConversationContext { conversation_id: String },

    /// Usage telemetry could not be persisted. Isolated: logged and retried
    /// on a detached task, never propagated to the caller.
    #[error("usage persistence failed: {source}")]
    UsagePersistence {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Classification of a single provider attempt failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::EnumString)]
#[strum(serialize_all = "kebab-case")]
pub enum ProviderErrorKind {
    AuthFailure,
    RateLimited,
    Timeout,
    InvalidResponse,
    Unavailable,
}

impl ProviderErrorKind {
    /// Whether an immediate same-provider retry could plausibly succeed.
    ///
    /// Adapters use this to decide their single transient retry; the
    /// orchestrator advances the chain for every kind regardless.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ProviderErrorKind::RateLimited
                | ProviderErrorKind::Timeout
                | ProviderErrorKind::Unavailable
        )
    }
}

/// One failed attempt as carried by [`SwitchboardError::AllProvidersExhausted`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptSummary {
    pub provider: String,
    pub model: String,
    pub kind: ProviderErrorKind,
}

impl std::fmt::Display for AttemptSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{} ({})", self.provider, self.model, self.kind)
    }
}

fn summarize_attempts(attempts: &[AttemptSummary]) -> String {
    if attempts.is_empty() {
        return "no attempts were made".to_string();
    }
    attempts
        .iter()
        .map(|a| a.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
