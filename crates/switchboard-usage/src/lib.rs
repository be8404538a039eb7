// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Usage accounting for the Switchboard routing service.
//!
//! One [`UsageRecord`] is written per terminal request outcome, keyed by the
//! request's run id. The [`UsageLedger`] persists records to the shared
//! SQLite database and answers daily, per-conversation, and per-caller
//! totals. Request-path writes go through a detached task so telemetry can
//! never slow down or fail a response.

pub mod ledger;
pub mod record;

pub use ledger::{UsageLedger, UsageTotals};
pub use record::{UsageOutcome, UsageRecord, now_timestamp};
