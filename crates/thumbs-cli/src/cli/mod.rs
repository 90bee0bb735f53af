//! CLI for the thumbs image pipeline.

mod commands;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use thumbs_core::config;

use commands::{run_checksum, run_config, run_pipeline};

/// Top-level CLI for thumbs.
#[derive(Debug, Parser)]
#[command(name = "thumbs")]
#[command(about = "thumbs: download images and write resized variants", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Download images and produce every configured width of each.
    Run(RunArgs),

    /// Print SHA-256 of every file in a directory (e.g. `outgoing/`).
    Checksum {
        /// Directory to digest.
        dir: PathBuf,
    },

    /// Show the config file path and the effective configuration.
    Config,
}

/// Options for `thumbs run`. Flags override values from config.toml.
#[derive(Debug, Args)]
pub struct RunArgs {
    /// Image URLs to process.
    pub urls: Vec<String>,

    /// Read URLs from a file, one per line (`#` starts a comment).
    #[arg(long, value_name = "PATH")]
    pub file: Option<PathBuf>,

    /// Base directory for `incoming/` and `outgoing/` (default: config, then current dir).
    #[arg(long, value_name = "DIR")]
    pub home: Option<PathBuf>,

    /// Comma-separated target widths in pixels.
    #[arg(long, value_delimiter = ',', value_name = "W,...")]
    pub widths: Vec<u32>,

    /// Number of download threads.
    #[arg(long, value_name = "N")]
    pub download_workers: Option<usize>,

    /// Number of resize threads (default: one per core).
    #[arg(long, value_name = "N")]
    pub resize_workers: Option<usize>,

    /// Abort the whole run after this many seconds.
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Print the run report as JSON.
    #[arg(long)]
    pub json: bool,
}

impl CliCommand {
    pub fn run_from_args() -> Result<()> {
        let cli = Cli::parse();

        match cli.command {
            CliCommand::Run(args) => {
                let cfg = config::load_or_init()?;
                tracing::debug!("loaded config: {:?}", cfg);
                run_pipeline(cfg, &args)?;
            }
            CliCommand::Checksum { dir } => run_checksum(&dir)?,
            CliCommand::Config => run_config()?,
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
