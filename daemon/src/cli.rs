//! Command-line flags.

use std::path::PathBuf;

use clap::Parser;

/// Watches IMAP folders and threads translated replies next to foreign-language mail.
#[derive(Debug, Parser)]
#[command(name = "pigeonhunter", version, about)]
pub struct Args {
    /// Config file (default: $PIGEONHUNTER_CONFIG or <config dir>/PigeonHunter/config.json)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Ledger database (default: <config dir>/PigeonHunter/processed.db)
    #[arg(long, value_name = "PATH")]
    pub db: Option<PathBuf>,

    /// Run a single pass and exit
    #[arg(long)]
    pub once: bool,

    /// Replay subject-tagged messages every pass
    #[arg(long)]
    pub debug_scan: bool,

    /// Write a template config if none exists, then exit
    #[arg(long, conflicts_with = "reconfig")]
    pub init: bool,

    /// Replace the config with a fresh template, then exit
    #[arg(long)]
    pub reconfig: bool,

    /// Debug logging
    #[arg(short, long)]
    pub verbose: bool,
}
