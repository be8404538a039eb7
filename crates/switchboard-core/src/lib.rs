// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Switchboard LLM routing service.
//!
//! This crate provides the foundational trait definitions, the error
//! taxonomy, the compliance-header table, and the common types used
//! throughout the Switchboard workspace. Provider adapters and stores
//! implement traits defined here.

pub mod compliance;
pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use compliance::CompliancePolicy;
pub use error::{AttemptSummary, ProviderErrorKind, SwitchboardError};
pub use types::{
    ComplexityTier, ConversationId, ConversationRecord, ConversationState, DeliverableRef,
    DeliverableVersion, GenerationOptions, GenerationRequest, GenerationResponse, HealthStatus,
    Mode, ProviderDescriptor, ProviderKind, RunId, TokenUsage, Turn, TurnRole,
};

pub use traits::{ConversationStore, DeliverableStore, ProviderAdapter};
