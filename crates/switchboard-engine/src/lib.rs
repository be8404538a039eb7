// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Execution engine for the Switchboard routing service.
//!
//! The [`Switchboard`] facade exposes the two inbound operations:
//! `generate` for one-shot requests and `task` for the two-phase
//! converse/build workflow. Underneath, the orchestrator walks a routed
//! fallback chain with per-attempt timeouts, the coordinator serializes
//! conversation state transitions, and the prober keeps registry health
//! fresh in the background.

pub mod coordinator;
pub mod orchestrator;
pub mod prober;
pub mod service;

pub use coordinator::ConversationCoordinator;
pub use orchestrator::{
    AttemptOutcome, AttemptRecord, ExecutionOrchestrator, ExecutionOutcome, ExecutionReport,
};
pub use prober::HealthProber;
pub use service::{
    GenerateParams, GenerateReply, Switchboard, TaskContent, TaskParams, TaskReply,
};
