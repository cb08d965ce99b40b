//! CLI for the Linkguard URL-reputation checker.

mod check_socket;
mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use linkguard_core::{config, whitelist};
use std::path::PathBuf;

use commands::{run_check, run_check_via_socket, run_serve, run_whitelist};

/// Top-level CLI for the Linkguard URL-reputation checker.
#[derive(Debug, Parser)]
#[command(name = "linkguard")]
#[command(about = "Linkguard: URL reputation checks for hover tooltips", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Resolve one URL to a reputation verdict.
    Check {
        /// HTTP/HTTPS URL to check.
        url: String,

        /// Print the raw verdict as JSON instead of the human summary.
        #[arg(long)]
        json: bool,

        /// Send the request to a running check service instead of resolving
        /// in-process.
        #[arg(long, value_name = "PATH")]
        socket: Option<PathBuf>,
    },

    /// Run the check service on a Unix socket (one JSON request per line).
    Serve {
        /// Socket path (default: the linkguard state dir).
        #[arg(long, value_name = "PATH")]
        socket: Option<PathBuf>,
    },

    /// Show the trusted-host whitelist.
    Whitelist,
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);
        let wl = whitelist::load_or_init()?;

        match cli.command {
            CliCommand::Check { url, json, socket } => match socket {
                Some(path) => run_check_via_socket(&path, &wl, &url, json).await?,
                None => run_check(&cfg, wl, &url, json).await?,
            },
            CliCommand::Serve { socket } => run_serve(&cfg, wl, socket).await?,
            CliCommand::Whitelist => run_whitelist(&wl),
        }

        Ok(())
    }
}
