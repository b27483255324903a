//! CLI for inspecting and exercising rpcretry policies.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use rpcretry_core::config;

use commands::{run_config, run_delays, run_simulate, SimulateArgs};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "rpcretry")]
#[command(about = "rpcretry: client-side retry policy inspector", long_about = None)]
pub struct Cli {
    /// Use the policy configured for this service instead of the default one.
    #[arg(long, global = true, value_name = "NAME")]
    pub service: Option<String>,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Sample the configured backoff delays for each retry.
    Delays {
        /// Attempt indices to sample (1..=N).
        #[arg(long, default_value = "5", value_name = "N")]
        attempts: u32,
        /// Samples drawn per attempt index.
        #[arg(long, default_value = "3", value_name = "K")]
        samples: usize,
    },

    /// Run calls against an in-process fake service and report each session.
    Simulate(SimulateArgs),

    /// Show the config file path and the effective policy.
    Config,
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);
        let policy_cfg = match cli.service.as_deref() {
            Some(name) => cfg.for_service(name),
            None => &cfg.retry,
        };

        match cli.command {
            CliCommand::Delays { attempts, samples } => run_delays(policy_cfg, attempts, samples)?,
            CliCommand::Simulate(args) => run_simulate(policy_cfg, &args).await?,
            CliCommand::Config => run_config(&cfg, cli.service.as_deref())?,
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
