// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `switchboard ask` command implementation.
//!
//! Sends a one-shot prompt through tier routing and sequential fallback,
//! prints the reply to stdout, and puts a run/provider/usage summary on
//! stderr so piped output stays clean. Ctrl+C cancels the in-flight
//! request gracefully.

use clap::Args;
use tokio_util::sync::CancellationToken;
use tracing::info;

use switchboard_config::SwitchboardConfig;
use switchboard_core::{ComplexityTier, SwitchboardError};
use switchboard_engine::{GenerateParams, HealthProber};

use crate::bootstrap;

/// Arguments for `switchboard ask`.
#[derive(Args, Debug)]
pub struct AskArgs {
    /// The prompt to send.
    pub prompt: String,

    /// Pin a provider instead of routing by complexity tier.
    #[arg(long)]
    pub provider: Option<String>,

    /// Pin a model on the pinned or routed provider.
    #[arg(long)]
    pub model: Option<String>,

    /// System prompt sent ahead of the user prompt.
    #[arg(long)]
    pub system: Option<String>,

    /// Sampling temperature.
    #[arg(long)]
    pub temperature: Option<f32>,

    /// Cap on generated tokens.
    #[arg(long)]
    pub max_tokens: Option<u32>,

    /// Complexity override: simple, moderate, or complex.
    #[arg(long)]
    pub complexity: Option<ComplexityTier>,
}

/// Run the `switchboard ask` command.
pub async fn run_ask(config: SwitchboardConfig, args: AskArgs) -> Result<(), SwitchboardError> {
    init_tracing(&config.service.log_level);

    let runtime = bootstrap::start(&config).await?;
    let cancel = install_signal_handler();

    // Long chains can run for minutes; keep registry health fresh so a
    // recovered provider is routable again mid-run.
    let prober = HealthProber::new(runtime.registry.clone(), &config.health).spawn(cancel.clone());

    let params = GenerateParams {
        caller_type: "cli".to_string(),
        caller_id: caller_id(),
        system_prompt: args.system.unwrap_or_default(),
        user_prompt: args.prompt,
        provider: args.provider,
        model: args.model,
        temperature: args.temperature,
        max_tokens: args.max_tokens,
        complexity_hint: args.complexity,
        data_classification: None,
    };
    let result = runtime.service.generate(params, cancel.clone()).await;

    cancel.cancel();
    let _ = prober.await;

    // The usage write runs on a detached task; yield so it reaches the
    // connection queue before close.
    tokio::task::yield_now().await;
    runtime.db.close().await?;

    let reply = result?;
    println!("{}", reply.response);
    eprintln!(
        "[{}] {}/{} -- {} in, {} out",
        reply.run_id,
        reply.provider,
        reply.model,
        reply.usage.input_tokens,
        reply.usage.output_tokens
    );
    Ok(())
}

/// Attribute CLI usage to the invoking OS user.
fn caller_id() -> String {
    std::env::var("USER").unwrap_or_else(|_| "local".to_string())
}

/// Installs signal handlers for SIGTERM and SIGINT.
///
/// Returns a [`CancellationToken`] that is cancelled when either signal
/// is received.
fn install_signal_handler() -> CancellationToken {
    let token = CancellationToken::new();
    let token_clone = token.clone();

    tokio::spawn(async move {
        let ctrl_c = tokio::signal::ctrl_c();

        #[cfg(unix)]
        {
            use tokio::signal::unix::{SignalKind, signal};
            let mut sigterm =
                signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");

            tokio::select! {
                _ = ctrl_c => {
                    info!("received SIGINT (Ctrl+C), cancelling request");
                }
                _ = sigterm.recv() => {
                    info!("received SIGTERM, cancelling request");
                }
            }
        }

        #[cfg(not(unix))]
        {
            let _ = ctrl_c.await;
            info!("received Ctrl+C, cancelling request");
        }

        token_clone.cancel();
    });

    token
}

fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("switchboard={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_names(false)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        args: AskArgs,
    }

    #[test]
    fn flags_map_to_generate_fields() {
        let cli = TestCli::parse_from([
            "ask",
            "hello there",
            "--provider",
            "ollama",
            "--model",
            "llama3.2",
            "--max-tokens",
            "128",
            "--complexity",
            "complex",
        ]);
        assert_eq!(cli.args.prompt, "hello there");
        assert_eq!(cli.args.provider.as_deref(), Some("ollama"));
        assert_eq!(cli.args.model.as_deref(), Some("llama3.2"));
        assert_eq!(cli.args.max_tokens, Some(128));
        assert_eq!(cli.args.complexity, Some(ComplexityTier::Complex));
    }

    #[test]
    fn bare_prompt_needs_no_flags() {
        let cli = TestCli::parse_from(["ask", "hi"]);
        assert_eq!(cli.args.prompt, "hi");
        assert!(cli.args.provider.is_none());
        assert!(cli.args.complexity.is_none());
    }

    #[test]
    #[serial_test::serial]
    fn caller_id_falls_back_without_user_env() {
        let saved = std::env::var("USER").ok();
        // SAFETY: test-only env mutation, serialized across the process.
        unsafe {
            std::env::remove_var("USER");
        }
        assert_eq!(caller_id(), "local");
        if let Some(user) = saved {
            unsafe {
                std::env::set_var("USER", user);
            }
        }
    }
}
