//! Error types shared across the crate.
//!
//! Only failures that must stop the current operation live in [`Error`]:
//! an invalid scan root, or the store/report write path. Per-file hashing
//! failures are [`crate::scan::hasher::HashError`] and never abort a scan.

use std::path::{Path, PathBuf};

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("scan root {path} is not a directory")]
    InvalidRoot { path: PathBuf },

    #[error("cannot create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot serialize snapshot store: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("invalid configuration in {path}: {details}")]
    Config { path: PathBuf, details: String },

    #[error("cannot write report {path}: {source}")]
    Report {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    pub fn create_dir(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::CreateDir {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    pub fn write(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Write {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// True for failures in persisting the snapshot history.
    pub fn is_persistence_failure(&self) -> bool {
        matches!(
            self,
            Self::CreateDir { .. } | Self::Write { .. } | Self::Serialize(_)
        )
    }
}
