// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `switchboard usage` command implementation.
//!
//! Reads the usage ledger and prints aggregate totals for a day
//! (default: today) or for a single conversation.

use switchboard_config::SwitchboardConfig;
use switchboard_core::SwitchboardError;
use switchboard_storage::Database;
use switchboard_usage::{UsageLedger, UsageTotals};

/// Run the `switchboard usage` command.
pub async fn run_usage(
    config: &SwitchboardConfig,
    date: Option<String>,
    conversation: Option<String>,
) -> Result<(), SwitchboardError> {
    let db = Database::open(&config.storage).await?;
    let ledger = UsageLedger::new(db.connection().clone(), &config.usage);

    let (label, totals) = match conversation {
        Some(id) => {
            let totals = ledger.conversation_totals(&id).await?;
            (format!("conversation {id}"), totals)
        }
        None => {
            let day = date.unwrap_or_else(today);
            let totals = ledger.daily_totals(&day).await?;
            (day, totals)
        }
    };

    print_totals(&label, &totals);
    db.close().await?;
    Ok(())
}

/// Today's date in the ledger's day format.
fn today() -> String {
    chrono::Utc::now().format("%Y-%m-%d").to_string()
}

fn print_totals(label: &str, totals: &UsageTotals) {
    println!();
    println!("  switchboard usage -- {label}");
    println!("  {}", "-".repeat(35));
    println!("    Requests:      {}", totals.requests);
    println!("    Input tokens:  {}", totals.input_tokens);
    println!("    Output tokens: {}", totals.output_tokens);
    println!();
}
