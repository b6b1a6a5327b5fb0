//! JSON snapshot store.
//!
//! One canonical file holds every snapshot ever taken, keyed by scanned
//! directory and then by capture time:
//!
//! ```json
//! { "/srv/www": { "2024-05-01 13:45:09": { "/srv/www/index.html": "9f86d0…" } } }
//! ```
//!
//! Supports:
//! - Backup of the previous file before each save, with 30 day retention
//! - Atomic rewrite (temp file + rename)
//! - Loading the latest snapshot for a directory
//!
//! A missing or corrupt file reads as empty history. Only the write path
//! (creating the directory, writing the file) returns errors.

pub mod backup;
pub mod diff;

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::DEFAULT_RETENTION;
use crate::error::{Error, Result};
use crate::snapshot::{Snapshot, SnapshotTime};
use backup::PurgeReport;

/// Snapshots of one directory, oldest first.
pub type History = BTreeMap<SnapshotTime, Snapshot>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StoreData {
    directories: BTreeMap<String, History>,
}

impl StoreData {
    pub fn is_empty(&self) -> bool {
        self.directories.is_empty()
    }

    pub fn directories(&self) -> impl Iterator<Item = &str> {
        self.directories.keys().map(String::as_str)
    }

    pub fn history(&self, directory: &str) -> Option<&History> {
        self.directories.get(directory)
    }

    pub fn latest(&self, directory: &str) -> Option<(SnapshotTime, &Snapshot)> {
        self.directories
            .get(directory)?
            .last_key_value()
            .map(|(time, snapshot)| (*time, snapshot))
    }

    /// Insert `snapshot` under `at`, or one second past the newest existing
    /// key when `at` is not later than it. Returns the key used.
    pub fn insert(&mut self, directory: &str, at: SnapshotTime, snapshot: Snapshot) -> SnapshotTime {
        let history = self.directories.entry(directory.to_string()).or_default();

        let key = match history.last_key_value() {
            Some((newest, _)) if *newest >= at => newest.next_second(),
            _ => at,
        };

        history.insert(key, snapshot);
        key
    }
}

#[derive(Debug)]
pub struct SaveOutcome {
    pub timestamp: SnapshotTime,
    pub backup: Option<PathBuf>,
    /// Set when the pre-save backup could not be written. The save itself
    /// still went through.
    pub backup_error: Option<io::Error>,
    pub purged: PurgeReport,
}

/// Handle to the canonical store file. Open once per command.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    path: PathBuf,
    retention: Duration,
}

impl SnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        SnapshotStore {
            path: path.into(),
            retention: DEFAULT_RETENTION,
        }
    }

    pub fn with_retention(mut self, retention: Duration) -> Self {
        self.retention = retention;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Backups live next to the canonical file.
    fn backup_dir(&self) -> &Path {
        self.path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."))
    }

    /// Read the canonical file.
    ///
    /// A missing, empty or unparseable file is empty history. Each directory
    /// is read on its own: one whose history is malformed is dropped with a
    /// warning and the others are kept. A dropped history is gone from the
    /// canonical file after the next save; the pre-save backup still has it.
    pub fn load(&self) -> StoreData {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return StoreData::default(),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "store unreadable, treating as empty history");
                return StoreData::default();
            }
        };

        if contents.trim().is_empty() {
            return StoreData::default();
        }

        let raw: BTreeMap<String, serde_json::Value> = match serde_json::from_str(&contents) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "store corrupt, treating as empty history");
                return StoreData::default();
            }
        };

        let mut directories = BTreeMap::new();
        for (directory, value) in raw {
            match serde_json::from_value::<History>(value) {
                Ok(history) => {
                    directories.insert(directory, history);
                }
                Err(e) => {
                    warn!(path = %self.path.display(), directory = %directory, error = %e, "history malformed, directory dropped");
                }
            }
        }

        StoreData { directories }
    }

    /// Most recent snapshot of `directory`, empty when there is none.
    pub fn load_latest(&self, directory: &str) -> Snapshot {
        self.load()
            .latest(directory)
            .map(|(_, snapshot)| snapshot.clone())
            .unwrap_or_default()
    }

    /// Capture times and file counts for `directory`, oldest first.
    pub fn history(&self, directory: &str) -> Vec<(SnapshotTime, usize)> {
        self.load()
            .history(directory)
            .map(|h| h.iter().map(|(time, s)| (*time, s.len())).collect())
            .unwrap_or_default()
    }

    pub fn save(&self, snapshot: Snapshot, directory: &str) -> Result<SaveOutcome> {
        self.save_at(snapshot, directory, Local::now().naive_local())
    }

    /// Save with an explicit clock reading.
    pub fn save_at(&self, snapshot: Snapshot, directory: &str, now: NaiveDateTime) -> Result<SaveOutcome> {
        let dir = self.backup_dir().to_path_buf();
        fs::create_dir_all(&dir).map_err(|e| Error::create_dir(&dir, e))?;

        let (backup, backup_error) = if self.path.is_file() {
            match backup::create_backup(&self.path, &dir, now) {
                Ok(path) => (Some(path), None),
                Err(e) => {
                    warn!(path = %self.path.display(), error = %e, "backup failed, saving anyway");
                    (None, Some(e))
                }
            }
        } else {
            (None, None)
        };

        let purged = backup::purge_old_backups(&self.path, &dir, now, self.retention);

        let mut data = self.load();
        let files = snapshot.len();
        let timestamp = data.insert(directory, SnapshotTime::from_datetime(now), snapshot);

        self.write_atomic(&data)?;

        info!(directory, %timestamp, files, "snapshot saved");

        Ok(SaveOutcome {
            timestamp,
            backup,
            backup_error,
            purged,
        })
    }

    pub fn purge_old_backups(&self) -> PurgeReport {
        backup::purge_old_backups(
            &self.path,
            self.backup_dir(),
            Local::now().naive_local(),
            self.retention,
        )
    }

    fn temp_path(&self) -> PathBuf {
        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "store".to_string());
        self.backup_dir()
            .join(format!(".{name}.{}.tmp", std::process::id()))
    }

    fn write_atomic(&self, data: &StoreData) -> Result<()> {
        let json = serde_json::to_string_pretty(data)?;
        let tmp_path = self.temp_path();

        let write = || -> io::Result<()> {
            let mut file = File::create(&tmp_path)?;
            file.write_all(json.as_bytes())?;
            file.write_all(b"\n")?;
            file.sync_all()?;
            fs::rename(&tmp_path, &self.path)
        };

        if let Err(e) = write() {
            let _ = fs::remove_file(&tmp_path);
            return Err(Error::write(&self.path, e));
        }

        Ok(())
    }
}
