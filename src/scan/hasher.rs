//! Chunked SHA-256 hashing of single files.

use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::snapshot::Fingerprint;

/// Read buffer size. Peak memory per file is bounded by this.
pub const CHUNK_SIZE: usize = 8 * 1024;

/// Why a file could not be fingerprinted. The scanner skips such files.
#[derive(Debug, Error)]
pub enum HashError {
    #[error("cannot open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("read failed for {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

pub fn hash_file(path: &Path) -> Result<Fingerprint, HashError> {
    let mut file = File::open(path).map_err(|source| HashError::Open {
        path: path.to_path_buf(),
        source,
    })?;

    let mut hasher = Sha256::new();
    let mut buffer = [0u8; CHUNK_SIZE];

    loop {
        let bytes_read = match file.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(source) => {
                return Err(HashError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(Fingerprint::from_digest(hasher.finalize().into()))
}

pub fn hash_bytes(data: &[u8]) -> Fingerprint {
    Fingerprint::from_digest(Sha256::digest(data).into())
}
