// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Collaborator contracts consumed by the routing core.
//!
//! All traits use `#[async_trait]` for dynamic dispatch compatibility; the
//! orchestrator and coordinator depend only on these, never on concrete
//! provider or store types.

pub mod provider;
pub mod store;

pub use provider::ProviderAdapter;
pub use store::{ConversationStore, DeliverableStore};
