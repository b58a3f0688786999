//! CLI for the sdm speed monitor.

mod commands;
mod control_socket;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use commands::{
    run_check, run_monitor, run_pause, run_resume, run_status, run_threshold, run_toggle,
    run_watch,
};

/// Top-level CLI for the sdm speed monitor.
#[derive(Debug, Parser)]
#[command(name = "sdm")]
#[command(about = "sdm: pauses downloads on slow networks, resumes them on fast ones", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Run the monitor daemon: sample network speed and react to changes.
    Run {
        /// Path to the download manager's socket (default from config/XDG).
        #[arg(long, value_name = "PATH")]
        downloads_socket: Option<PathBuf>,
    },

    /// Show the daemon's current status.
    Status,

    /// Toggle speed-based pause/resume on or off.
    Toggle,

    /// Set the Fast/Slow threshold in Mbps.
    Threshold {
        /// Threshold value in Mbps; must be greater than 0.
        mbps: f64,
    },

    /// Pause all in-progress downloads now.
    Pause,

    /// Resume the downloads paused by the monitor.
    Resume,

    /// Run one classification cycle immediately.
    Check,

    /// Stream status updates as the daemon broadcasts them.
    Watch,
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();

        match cli.command {
            CliCommand::Run { downloads_socket } => run_monitor(downloads_socket).await?,
            CliCommand::Status => run_status().await?,
            CliCommand::Toggle => run_toggle().await?,
            CliCommand::Threshold { mbps } => run_threshold(mbps).await?,
            CliCommand::Pause => run_pause().await?,
            CliCommand::Resume => run_resume().await?,
            CliCommand::Check => run_check().await?,
            CliCommand::Watch => run_watch().await?,
        }

        Ok(())
    }
}
