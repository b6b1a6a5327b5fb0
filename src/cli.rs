use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::report::ReportFormat;

#[derive(Parser)]
#[command(name = "hashwatch")]
#[command(about = "Detect new, modified and deleted files between scans")]
#[command(version)]
pub struct Cli {
    /// Config file (defaults to the platform config directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Snapshot store file, overrides the config file
    #[arg(long, global = true)]
    pub store: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Scan a directory, report changes since the last scan and save a snapshot
    Scan(ScanArgs),

    /// List stored snapshots
    History(HistoryArgs),

    /// Delete store backups older than the retention window
    Purge,
}

#[derive(Parser)]
pub struct ScanArgs {
    /// Directory to scan (prompted for when omitted)
    pub dir: Option<String>,

    /// Report format
    #[arg(long, value_enum)]
    pub format: Option<ReportFormat>,

    /// Directory reports are written to
    #[arg(long)]
    pub report_dir: Option<PathBuf>,

    /// Do not write a report file
    #[arg(long, default_value_t = false)]
    pub no_report: bool,

    /// Print the change set as JSON instead of a summary
    #[arg(long, default_value_t = false)]
    pub json: bool,

    /// Follow symlinked directories (cycles are detected and skipped)
    #[arg(long, default_value_t = false)]
    pub follow_links: bool,

    /// Exit with status 1 when any change is detected
    #[arg(long, default_value_t = false)]
    pub fail_on_change: bool,

    /// Show every fingerprint, skipped files and debug logs
    #[arg(long, short = 'v', default_value_t = false)]
    pub verbose: bool,
}

#[derive(Parser)]
pub struct HistoryArgs {
    /// Only list snapshots of this directory
    pub dir: Option<String>,
}
