//! Timestamped backup copies and their retention.
//!
//! A backup of `hashes.json` taken at 2024-05-01 13:45:09 is named
//! `hashes.json.2024-05-01_13-45-09.bak`. Purging only ever removes files
//! whose embedded timestamp parses and is older than the retention window.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::NaiveDateTime;
use regex::Regex;
use tracing::{debug, info, warn};

pub const STAMP_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

#[derive(Debug, Default)]
pub struct PurgeReport {
    pub removed: Vec<PathBuf>,
    pub failed: Vec<(PathBuf, String)>,
}

pub fn backup_path(original: &Path, backup_dir: &Path, now: NaiveDateTime) -> PathBuf {
    let name = original
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    backup_dir.join(format!("{name}.{}.bak", now.format(STAMP_FORMAT)))
}

/// Copy `original` byte for byte into `backup_dir`.
///
/// An earlier backup with the same stamp is never overwritten; the copy takes
/// the next second with no backup file instead.
pub fn create_backup(original: &Path, backup_dir: &Path, now: NaiveDateTime) -> io::Result<PathBuf> {
    fs::create_dir_all(backup_dir)?;

    let mut stamp = now;
    let mut target = backup_path(original, backup_dir, stamp);
    while target.is_file() {
        stamp += chrono::Duration::seconds(1);
        target = backup_path(original, backup_dir, stamp);
    }

    fs::copy(original, &target)?;
    debug!(from = %original.display(), to = %target.display(), "backup created");
    Ok(target)
}

/// Remove backups of `reference` in `backup_dir` older than `retention`.
///
/// Never fails: unreadable directories and failed removals are logged and
/// reported, names with an unparseable timestamp are left alone.
pub fn purge_old_backups(
    reference: &Path,
    backup_dir: &Path,
    now: NaiveDateTime,
    retention: Duration,
) -> PurgeReport {
    let mut report = PurgeReport::default();

    let Some(base_name) = reference.file_name().and_then(|n| n.to_str()) else {
        return report;
    };

    // out of chrono's range means nothing can ever expire
    let Ok(retention) = chrono::Duration::from_std(retention) else {
        return report;
    };

    let pattern = format!(
        r"^{}\.(\d{{4}}-\d{{2}}-\d{{2}}_\d{{2}}-\d{{2}}-\d{{2}})\.bak$",
        regex::escape(base_name)
    );
    let matcher = match Regex::new(&pattern) {
        Ok(re) => re,
        Err(e) => {
            warn!(error = %e, "backup name pattern rejected");
            return report;
        }
    };

    let entries = match fs::read_dir(backup_dir) {
        Ok(entries) => entries,
        Err(e) => {
            if e.kind() != io::ErrorKind::NotFound {
                warn!(dir = %backup_dir.display(), error = %e, "cannot list backups");
            }
            return report;
        }
    };

    for entry in entries.filter_map(|e| e.ok()) {
        let file_name = entry.file_name();
        let Some(name) = file_name.to_str() else { continue };
        let Some(stamp) = matcher.captures(name).and_then(|c| c.get(1)) else { continue };

        let taken_at = match NaiveDateTime::parse_from_str(stamp.as_str(), STAMP_FORMAT) {
            Ok(t) => t,
            Err(_) => {
                debug!(file = name, "backup timestamp does not parse, kept");
                continue;
            }
        };

        if now.signed_duration_since(taken_at) <= retention {
            continue;
        }

        let path = entry.path();
        match fs::remove_file(&path) {
            Ok(()) => {
                info!(path = %path.display(), "deleted old backup");
                report.removed.push(path);
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "cannot delete old backup");
                report.failed.push((path, e.to_string()));
            }
        }
    }

    report
}
