// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Usage record types written to the ledger.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use switchboard_core::ComplexityTier;

/// Terminal outcome of one routed request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum UsageOutcome {
    /// A candidate in the fallback chain produced a response.
    Success,
    /// Every candidate failed; the user saw the exhaustion error.
    Exhausted,
    /// The caller cancelled mid-chain; no response was produced.
    Cancelled,
}

/// A single usage record representing one terminal request outcome.
///
/// `provider` and `model` name the candidate that produced the response,
/// or the last attempted candidate when the chain was exhausted or
/// cancelled. Records are append-only and never mutated after insert.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageRecord {
    /// Run identifier, unique per request (UUID v4, never reused).
    pub run_id: String,
    /// Conversation this request belonged to, if any.
    pub conversation_id: Option<String>,
    /// Caller channel (e.g. "cli", "api").
    pub caller_type: String,
    /// Caller identity within the channel.
    pub caller_id: String,
    /// Provider that answered, or the last one attempted.
    pub provider: String,
    /// Model that answered, or the last one attempted.
    pub model: String,
    /// Tier the request was classified into.
    pub complexity_tier: ComplexityTier,
    /// Data classification tag stamped on the request.
    pub data_classification: String,
    /// Number of input tokens.
    pub input_tokens: u64,
    /// Number of output tokens.
    pub output_tokens: u64,
    /// Wall-clock latency across the whole chain, in milliseconds.
    pub latency_ms: u64,
    /// Terminal outcome of the request.
    pub outcome: UsageOutcome,
    /// ISO 8601 timestamp.
    pub created_at: String,
}

/// Current UTC time in the ledger's timestamp format.
pub fn now_timestamp() -> String {
    chrono::Utc::now().format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn outcome_display_round_trips() {
        for outcome in [
            UsageOutcome::Success,
            UsageOutcome::Exhausted,
            UsageOutcome::Cancelled,
        ] {
            let s = outcome.to_string();
            let parsed = UsageOutcome::from_str(&s).unwrap();
            assert_eq!(outcome, parsed);
        }
        assert_eq!(UsageOutcome::Success.to_string(), "success");
        assert_eq!(UsageOutcome::Exhausted.to_string(), "exhausted");
    }

    #[test]
    fn timestamp_has_millisecond_precision() {
        let ts = now_timestamp();
        assert!(ts.ends_with('Z'));
        assert_eq!(ts.len(), "2026-01-01T00:00:00.000Z".len());
    }
}
