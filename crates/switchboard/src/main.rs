// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Switchboard - a complexity-routing LLM provider service.
//!
//! This is the binary entry point for the Switchboard CLI.

use clap::{Parser, Subcommand};

mod ask;
mod bootstrap;
mod usage;

/// Switchboard - route LLM requests across local and external providers.
#[derive(Parser, Debug)]
#[command(name = "switchboard", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Send a one-shot prompt through tier routing and fallback.
    Ask(ask::AskArgs),
    /// Show recorded usage totals.
    Usage {
        /// Day to report, as YYYY-MM-DD. Defaults to today.
        #[arg(long)]
        date: Option<String>,
        /// Report a single conversation instead of a day.
        #[arg(long)]
        conversation: Option<String>,
    },
    /// Manage Switchboard configuration.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Actions under `switchboard config`.
#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Load the configuration and report any problems.
    Validate,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Load and validate configuration at startup.
    let config = match switchboard_config::load_and_validate() {
        Ok(config) => config,
        Err(errors) => {
            switchboard_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Some(Commands::Ask(args)) => ask::run_ask(config, args).await,
        Some(Commands::Usage { date, conversation }) => {
            usage::run_usage(&config, date, conversation).await
        }
        Some(Commands::Config {
            action: ConfigAction::Validate,
        }) => {
            println!(
                "switchboard: configuration valid (service.name={})",
                config.service.name
            );
            Ok(())
        }
        None => {
            println!("switchboard: use --help for available commands");
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    #[test]
    #[serial_test::serial]
    fn binary_loads_config_defaults() {
        // Verify config loads with defaults (no config file needed).
        let config =
            switchboard_config::load_and_validate().expect("default config should be valid");
        assert_eq!(config.service.name, "switchboard");
    }
}
