// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence layer for the Switchboard routing service.
//!
//! Provides WAL-mode SQLite storage with embedded migrations, a
//! single-writer concurrency model via `tokio-rusqlite`, and store
//! implementations for conversations and deliverables. The usage ledger
//! shares the same database through a cloned connection handle.

pub mod conversations;
pub mod database;
pub mod deliverables;
pub mod migrations;

pub use conversations::SqliteConversationStore;
pub use database::Database;
pub use deliverables::SqliteDeliverableStore;
