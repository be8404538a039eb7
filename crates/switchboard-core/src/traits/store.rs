// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Persistence contracts for conversation state and deliverables.
//!
//! Conversation state is an explicit, externally persisted value keyed by
//! [`ConversationId`], loaded and saved by each request phase independently.
//! Serialization of operations on the same conversation is the caller's
//! responsibility (the coordinator holds a per-conversation guard); stores
//! only promise that each individual operation is atomic.

use async_trait::async_trait;

use crate::error::SwitchboardError;
use crate::types::{
    ConversationId, ConversationRecord, ConversationState, DeliverableRef, Mode, Turn, TurnRole,
};

/// Store for conversation lifecycle state, turn history, and the pending
/// context snapshot.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Create a new conversation in `Conversing` state with empty context.
    async fn create(
        &self,
        id: &ConversationId,
        caller_type: &str,
        caller_id: &str,
    ) -> Result<ConversationRecord, SwitchboardError>;

    /// Load a conversation, or `None` when the id is unknown.
    async fn get(
        &self,
        id: &ConversationId,
    ) -> Result<Option<ConversationRecord>, SwitchboardError>;

    /// Append one turn to the conversation's ordered history.
    async fn append_turn(
        &self,
        id: &ConversationId,
        role: TurnRole,
        content: &str,
    ) -> Result<(), SwitchboardError>;

    /// The conversation's turns in insertion order.
    async fn turns(&self, id: &ConversationId) -> Result<Vec<Turn>, SwitchboardError>;

    /// Record a completed converse: replace the pending context snapshot and
    /// refresh `last_mode`/`updated_at`. State stays `Conversing`.
    async fn record_converse(
        &self,
        id: &ConversationId,
        snapshot: &str,
    ) -> Result<(), SwitchboardError>;

    /// Transition the conversation's lifecycle state.
    async fn set_state(
        &self,
        id: &ConversationId,
        state: ConversationState,
        last_mode: Mode,
    ) -> Result<(), SwitchboardError>;
}

/// Store for build deliverables. Internals are opaque to the core: the
/// coordinator only consumes the returned reference.
#[async_trait]
pub trait DeliverableStore: Send + Sync {
    /// Persist one deliverable version for a conversation and return its
    /// reference (deliverable id plus version id and content).
    async fn create(
        &self,
        conversation_id: &ConversationId,
        content: &str,
    ) -> Result<DeliverableRef, SwitchboardError>;
}
