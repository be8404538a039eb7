// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Usage ledger for persisting per-request accounting records to SQLite.
//!
//! Every terminal request outcome is recorded with the provider, model,
//! tier, token counts, and latency. The ledger supports daily, per
//! conversation, and per caller totals for reporting.
//!
//! Writes from the request path go through [`UsageLedger::record_detached`]:
//! the insert runs on a spawned task with bounded retries so that a slow or
//! failing database can never delay or fail the user-facing response.

use std::time::Duration;

use switchboard_config::model::UsageConfig;
use switchboard_core::SwitchboardError;
use tracing::{info, warn};

use crate::record::UsageRecord;

/// Convert a tokio-rusqlite error on the write path.
///
/// Write failures are [`SwitchboardError::UsagePersistence`]: isolated to
/// the detached writer and never propagated to the caller.
fn map_write_err(e: tokio_rusqlite::Error<rusqlite::Error>) -> SwitchboardError {
    SwitchboardError::UsagePersistence {
        source: Box::new(e),
    }
}

/// Convert a tokio-rusqlite error on the query path.
fn map_query_err(e: tokio_rusqlite::Error<rusqlite::Error>) -> SwitchboardError {
    SwitchboardError::Storage {
        source: Box::new(e),
    }
}

/// Aggregated usage over some slice of the ledger.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct UsageTotals {
    pub requests: u64,
    pub input_tokens: u64,
    pub output_tokens: u64,
}

/// Persistent usage ledger backed by SQLite.
///
/// Records are written to the `usage_records` table (created by V1
/// migration). All operations go through the single tokio-rusqlite
/// background thread.
#[derive(Clone)]
pub struct UsageLedger {
    conn: tokio_rusqlite::Connection,
    write_retries: u32,
    retry_delay: Duration,
}

impl UsageLedger {
    /// Create a new usage ledger using the given tokio-rusqlite connection.
    pub fn new(conn: tokio_rusqlite::Connection, config: &UsageConfig) -> Self {
        Self {
            conn,
            write_retries: config.write_retries.max(1),
            retry_delay: Duration::from_millis(config.retry_delay_ms),
        }
    }

    /// Insert one usage record.
    ///
    /// The `run_id` column is the primary key, so recording the same run
    /// twice fails rather than double-counting a request.
    pub async fn record(&self, record: &UsageRecord) -> Result<(), SwitchboardError> {
        let run_id = record.run_id.clone();
        let conversation_id = record.conversation_id.clone();
        let caller_type = record.caller_type.clone();
        let caller_id = record.caller_id.clone();
        let provider = record.provider.clone();
        let model = record.model.clone();
        let complexity_tier = record.complexity_tier.to_string();
        let data_classification = record.data_classification.clone();
        let input_tokens = record.input_tokens;
        let output_tokens = record.output_tokens;
        let latency_ms = record.latency_ms;
        let outcome = record.outcome.to_string();
        let created_at = record.created_at.clone();

        self.conn
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO usage_records (run_id, conversation_id, caller_type, \
                     caller_id, provider, model, complexity_tier, data_classification, \
                     input_tokens, output_tokens, latency_ms, outcome, created_at) \
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
                    rusqlite::params![
                        run_id,
                        conversation_id,
                        caller_type,
                        caller_id,
                        provider,
                        model,
                        complexity_tier,
                        data_classification,
                        input_tokens,
                        output_tokens,
                        latency_ms,
                        outcome,
                        created_at,
                    ],
                )?;
                Ok(())
            })
            .await
            .map_err(map_write_err)?;

        info!(
            run_id = %record.run_id,
            provider = %record.provider,
            model = %record.model,
            tier = %record.complexity_tier,
            outcome = %record.outcome,
            input_tokens = record.input_tokens,
            output_tokens = record.output_tokens,
            latency_ms = record.latency_ms,
            "usage recorded"
        );

        Ok(())
    }

    /// Persist a record on a detached task, off the request path.
    ///
    /// The insert is retried up to the configured count with a fixed delay
    /// between attempts; every failure is logged at warn level and the
    /// record is dropped after the final retry. Nothing propagates back to
    /// the caller. The returned handle may be dropped (the task keeps
    /// running) or awaited in tests.
    pub fn record_detached(&self, record: UsageRecord) -> tokio::task::JoinHandle<()> {
        let ledger = self.clone();
        tokio::spawn(async move { ledger.persist_with_retries(record).await })
    }

    async fn persist_with_retries(&self, record: UsageRecord) {
        for attempt in 1..=self.write_retries {
            match self.record(&record).await {
                Ok(()) => return,
                Err(error) => {
                    warn!(
                        run_id = %record.run_id,
                        attempt,
                        retries = self.write_retries,
                        %error,
                        "usage record write failed"
                    );
                    if attempt < self.write_retries {
                        tokio::time::sleep(self.retry_delay).await;
                    }
                }
            }
        }
        warn!(run_id = %record.run_id, "usage record dropped after retries");
    }

    /// Totals for a given date (ISO 8601 date, e.g. "2026-03-01").
    pub async fn daily_totals(&self, date: &str) -> Result<UsageTotals, SwitchboardError> {
        let date = date.to_string();
        self.conn
            .call(move |conn| {
                let totals = conn.query_row(
                    "SELECT COUNT(*), COALESCE(SUM(input_tokens), 0), \
                     COALESCE(SUM(output_tokens), 0) FROM usage_records \
                     WHERE created_at >= ?1 AND created_at < date(?1, '+1 day')",
                    rusqlite::params![date],
                    row_to_totals,
                )?;
                Ok(totals)
            })
            .await
            .map_err(map_query_err)
    }

    /// Totals for a given conversation.
    pub async fn conversation_totals(
        &self,
        conversation_id: &str,
    ) -> Result<UsageTotals, SwitchboardError> {
        let conversation_id = conversation_id.to_string();
        self.conn
            .call(move |conn| {
                let totals = conn.query_row(
                    "SELECT COUNT(*), COALESCE(SUM(input_tokens), 0), \
                     COALESCE(SUM(output_tokens), 0) FROM usage_records \
                     WHERE conversation_id = ?1",
                    rusqlite::params![conversation_id],
                    row_to_totals,
                )?;
                Ok(totals)
            })
            .await
            .map_err(map_query_err)
    }

    /// Totals for a given caller.
    pub async fn caller_totals(
        &self,
        caller_type: &str,
        caller_id: &str,
    ) -> Result<UsageTotals, SwitchboardError> {
        let caller_type = caller_type.to_string();
        let caller_id = caller_id.to_string();
        self.conn
            .call(move |conn| {
                let totals = conn.query_row(
                    "SELECT COUNT(*), COALESCE(SUM(input_tokens), 0), \
                     COALESCE(SUM(output_tokens), 0) FROM usage_records \
                     WHERE caller_type = ?1 AND caller_id = ?2",
                    rusqlite::params![caller_type, caller_id],
                    row_to_totals,
                )?;
                Ok(totals)
            })
            .await
            .map_err(map_query_err)
    }
}

fn row_to_totals(row: &rusqlite::Row<'_>) -> Result<UsageTotals, rusqlite::Error> {
    Ok(UsageTotals {
        requests: row.get(0)?,
        input_tokens: row.get(1)?,
        output_tokens: row.get(2)?,
    })
}
