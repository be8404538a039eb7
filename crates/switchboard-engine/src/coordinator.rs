// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversational workflow state for the two-phase `task` operation.
//!
//! `converse` accumulates context, `build` consumes it. The coordinator
//! owns the conversation and deliverable stores plus a per-conversation
//! guard map; callers lock a conversation before operating on it, so
//! converse and build on the same conversation run strictly one at a
//! time and a build always observes the most recently completed
//! converse. Distinct conversations proceed in parallel.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, info};

use switchboard_core::{
    ConversationId, ConversationRecord, ConversationState, ConversationStore, DeliverableRef,
    DeliverableStore, Mode, SwitchboardError, Turn, TurnRole,
};

/// Drives the converse/build lifecycle over the conversation stores.
pub struct ConversationCoordinator {
    conversations: Arc<dyn ConversationStore>,
    deliverables: Arc<dyn DeliverableStore>,
    guards: DashMap<String, Arc<Mutex<()>>>,
}

impl ConversationCoordinator {
    pub fn new(
        conversations: Arc<dyn ConversationStore>,
        deliverables: Arc<dyn DeliverableStore>,
    ) -> Self {
        Self {
            conversations,
            deliverables,
            guards: DashMap::new(),
        }
    }

    /// Acquire the conversation's guard.
    pub async fn lock(&self, id: &str) -> OwnedMutexGuard<()> {
        let cell = self.guards.entry(id.to_string()).or_default().clone();
        cell.lock_owned().await
    }

    /// Get the conversation for a converse call, creating it when absent.
    ///
    /// Unknown caller-supplied ids are adopted: the conversation is
    /// created under that id so callers can mint their own identifiers.
    pub async fn open(
        &self,
        caller_type: &str,
        caller_id: &str,
        id: Option<&str>,
    ) -> Result<ConversationRecord, SwitchboardError> {
        if let Some(id) = id {
            let cid = ConversationId(id.to_string());
            if let Some(record) = self.conversations.get(&cid).await? {
                return Ok(record);
            }
            info!(conversation_id = id, "adopting caller-supplied conversation id");
            return self.conversations.create(&cid, caller_type, caller_id).await;
        }

        let cid = ConversationId::new();
        let record = self
            .conversations
            .create(&cid, caller_type, caller_id)
            .await?;
        info!(conversation_id = %record.id, "conversation created");
        Ok(record)
    }

    /// Finish a completed converse: append both turns, re-render the
    /// transcript into the context snapshot, and leave the conversation
    /// in `Conversing`. Returns the refreshed snapshot.
    pub async fn complete_converse(
        &self,
        id: &ConversationId,
        user_message: &str,
        assistant_reply: &str,
    ) -> Result<String, SwitchboardError> {
        self.conversations
            .append_turn(id, TurnRole::User, user_message)
            .await?;
        self.conversations
            .append_turn(id, TurnRole::Assistant, assistant_reply)
            .await?;
        let turns = self.conversations.turns(id).await?;
        let snapshot = render_transcript(&turns);
        self.conversations.record_converse(id, &snapshot).await?;
        debug!(
            conversation_id = %id,
            turns = turns.len(),
            "context snapshot refreshed"
        );
        Ok(snapshot)
    }

    /// Load and validate a conversation for `build` without touching its
    /// state. Unknown ids and conversations with no completed converse
    /// are rejected here, before any provider is called.
    pub async fn require_buildable(
        &self,
        id: &str,
    ) -> Result<ConversationRecord, SwitchboardError> {
        let cid = ConversationId(id.to_string());
        let Some(record) = self.conversations.get(&cid).await? else {
            return Err(SwitchboardError::MissingConversationContext {
                conversation_id: id.to_string(),
            });
        };
        if record.pending_context.is_empty() {
            return Err(SwitchboardError::MissingConversationContext {
                conversation_id: id.to_string(),
            });
        }
        Ok(record)
    }

    /// Mark the conversation `Building` for the duration of the provider
    /// call.
    pub async fn begin_build(&self, id: &ConversationId) -> Result<(), SwitchboardError> {
        self.conversations
            .set_state(id, ConversationState::Building, Mode::Build)
            .await
    }

    /// Persist the deliverable and mark the conversation `Complete`.
    pub async fn complete_build(
        &self,
        id: &ConversationId,
        content: &str,
    ) -> Result<DeliverableRef, SwitchboardError> {
        let deliverable = self.deliverables.create(id, content).await?;
        self.conversations
            .set_state(id, ConversationState::Complete, Mode::Build)
            .await?;
        info!(
            conversation_id = %id,
            deliverable_id = deliverable.id.as_str(),
            "deliverable persisted"
        );
        Ok(deliverable)
    }

    /// Return a failed build to `Conversing`. The accumulated context is
    /// untouched, so the caller can converse further or retry the build.
    pub async fn abort_build(&self, id: &ConversationId) -> Result<(), SwitchboardError> {
        self.conversations
            .set_state(id, ConversationState::Conversing, Mode::Build)
            .await
    }
}

/// Render the turn history as the context snapshot consumed by `build`.
fn render_transcript(turns: &[Turn]) -> String {
    turns
        .iter()
        .map(|t| format!("{}: {}", t.role, t.content))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Prompt for a converse call: the prior snapshot, when any, followed by
/// the new user message so later turns see the conversation so far.
pub(crate) fn converse_prompt(pending_context: &str, user_message: &str) -> String {
    if pending_context.is_empty() {
        user_message.to_string()
    } else {
        format!("{pending_context}\nuser: {user_message}")
    }
}

/// Prompt for a build call: the accumulated context followed by the
/// build instruction.
pub(crate) fn build_prompt(pending_context: &str, user_message: &str) -> String {
    format!("Conversation context:\n{pending_context}\n\nBuild request:\n{user_message}")
}
