pub mod html;
pub mod json;
pub mod text;

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{Local, NaiveDateTime};
use clap::ValueEnum;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::scan::ScanResult;
use crate::store::backup;
use crate::store::diff::ChangeSet;

pub const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    Text,
    Html,
    Json,
}

impl ReportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ReportFormat::Text => "txt",
            ReportFormat::Html => "html",
            ReportFormat::Json => "json",
        }
    }
}

/// Everything a rendered report needs. Owns its data; nothing is shared
/// with the snapshots it was computed from.
#[derive(Debug, Clone)]
pub struct Report {
    pub root: String,
    pub generated_at: NaiveDateTime,
    pub changes: ChangeSet,
}

impl Report {
    pub fn new(root: impl Into<String>, changes: ChangeSet) -> Self {
        Report {
            root: root.into(),
            generated_at: Local::now().naive_local(),
            changes,
        }
    }
}

pub fn render(report: &Report, format: ReportFormat) -> String {
    match format {
        ReportFormat::Text => text::render(report),
        ReportFormat::Html => html::render(report),
        ReportFormat::Json => json::render(report),
    }
}

/// Write `report` to `dir/report_<YYYYmmdd_HHMMSS>.<ext>`.
///
/// A report already sitting at that path is first copied into
/// `dir/archive/`, and archives of it older than `retention` are deleted.
/// Archive failures are logged and do not stop the write.
pub fn write(report: &Report, dir: &Path, format: ReportFormat, retention: Duration) -> Result<PathBuf> {
    fs::create_dir_all(dir).map_err(|source| Error::Report {
        path: dir.to_path_buf(),
        source,
    })?;

    let path = dir.join(format!(
        "report_{}.{}",
        report.generated_at.format("%Y%m%d_%H%M%S"),
        format.extension()
    ));

    let archive_dir = dir.join("archive");
    let now = Local::now().naive_local();

    if path.is_file() {
        match backup::create_backup(&path, &archive_dir, now) {
            Ok(archived) => debug!(path = %archived.display(), "previous report archived"),
            Err(e) => warn!(path = %path.display(), error = %e, "cannot archive previous report"),
        }
    }

    let purged = backup::purge_old_backups(&path, &archive_dir, now, retention);
    if !purged.removed.is_empty() {
        debug!(removed = purged.removed.len(), "expired report archives deleted");
    }

    fs::write(&path, render(report, format)).map_err(|source| Error::Report {
        path: path.clone(),
        source,
    })?;

    Ok(path)
}

/// Console output for a finished scan.
pub fn print(result: &ScanResult, report: &Report, config: &Config) {
    if config.json_output {
        println!("{}", json::render(report));
        return;
    }

    if config.verbose {
        print_fingerprints(result);
        print_skipped(result);
    }

    print_summary(&report.changes);
    print_scan_info(result, config.verbose);
}

fn print_fingerprints(result: &ScanResult) {
    println!("Current hashes:");
    for (path, fingerprint) in result.snapshot.iter() {
        println!("{path} -> {fingerprint}");
    }
}

fn print_skipped(result: &ScanResult) {
    if result.skipped.is_empty() {
        return;
    }

    println!("\nSkipped:");
    for skipped in &result.skipped {
        println!("  {}: {}", skipped.path, skipped.reason);
    }
}

fn print_summary(changes: &ChangeSet) {
    println!("\nSummary of changes:");
    for kind in crate::store::diff::ChangeKind::ALL {
        println!("{}: {} file(s)", kind.label(), changes.paths(kind).len());
    }
}

fn print_scan_info(result: &ScanResult, verbose: bool) {
    let Some(duration_ms) = result.duration_ms else { return };

    let duration_sec = duration_ms as f64 / 1000.0;
    println!(
        "\nscanned {} file(s) in {duration_sec:.2}s",
        result.snapshot.len()
    );

    if verbose {
        if let Some(peak_bytes) = result.peak_memory_bytes {
            println!("peak memory: {:.1} MB", peak_bytes as f64 / 1_024_f64 / 1_024_f64);
        }
    }
}
