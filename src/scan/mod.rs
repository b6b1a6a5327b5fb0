pub mod hasher;

use std::fs;
use std::path::{Component, Path, PathBuf};
use std::time::Instant;

use tracing::{debug, info, warn};
use walkdir::{DirEntry, WalkDir};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::snapshot::Snapshot;

/// A path left out of the snapshot, with the reason.
#[derive(Debug, Clone)]
pub struct SkippedEntry {
    pub path: String,
    pub reason: String,
}

#[derive(Debug)]
pub struct ScanResult {
    pub root: PathBuf,
    pub snapshot: Snapshot,
    pub skipped: Vec<SkippedEntry>,
    pub duration_ms: Option<u128>,
    pub peak_memory_bytes: Option<usize>,
}

/// Hash every readable file beneath `root`.
///
/// Fails only when `root` is not a directory. Unreadable files, unreadable
/// directories and symlink loops are recorded in `skipped` and the walk goes on.
pub fn run(root: &Path, config: &Config) -> Result<ScanResult> {
    let start = Instant::now();

    let is_dir = fs::metadata(root).map(|m| m.is_dir()).unwrap_or(false);
    if !is_dir {
        return Err(Error::InvalidRoot {
            path: root.to_path_buf(),
        });
    }

    info!(root = %root.display(), follow_links = config.follow_links, "scan started");

    let mut files = Vec::new();
    let mut skipped = Vec::new();

    for entry in WalkDir::new(root).follow_links(config.follow_links) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                let path = normalize_path(e.path().unwrap_or(root));
                warn!(path = %path, error = %e, "walk error, entry skipped");
                skipped.push(SkippedEntry {
                    path,
                    reason: e.to_string(),
                });
                continue;
            }
        };

        if !is_hashable(&entry) {
            continue;
        }

        let key = normalize_path(entry.path());
        match hasher::hash_file(entry.path()) {
            Ok(fingerprint) => files.push((key, fingerprint)),
            Err(e) => {
                debug!(path = %key, error = %e, "unreadable file skipped");
                skipped.push(SkippedEntry {
                    path: key,
                    reason: e.to_string(),
                });
            }
        }
    }

    let snapshot: Snapshot = files.into_iter().collect();
    let duration = start.elapsed();

    info!(
        root = %root.display(),
        files = snapshot.len(),
        skipped = skipped.len(),
        duration_ms = duration.as_millis() as u64,
        "scan complete"
    );

    Ok(ScanResult {
        root: root.to_path_buf(),
        snapshot,
        skipped,
        duration_ms: Some(duration.as_millis()),
        peak_memory_bytes: memory_stats::memory_stats().map(|s| s.physical_mem),
    })
}

fn is_hashable(entry: &DirEntry) -> bool {
    let file_type = entry.file_type();
    if file_type.is_file() {
        return true;
    }

    // unfollowed symlinks: hash through the link when it points at a regular
    // file, never descend into linked directories
    file_type.is_symlink()
        && fs::metadata(entry.path())
            .map(|m| m.is_file())
            .unwrap_or(false)
}

/// Render a path as a stable snapshot key.
///
/// Separators become `/`, `.` components are dropped and `..` is resolved
/// lexically, so repeated scans of an unchanged tree yield identical keys.
pub fn normalize_path(path: &Path) -> String {
    let mut prefix = String::new();
    let mut absolute = false;
    let mut parts: Vec<String> = Vec::new();

    for component in path.components() {
        match component {
            Component::Prefix(p) => {
                prefix = p.as_os_str().to_string_lossy().replace('\\', "/");
            }
            Component::RootDir => absolute = true,
            Component::CurDir => {}
            Component::ParentDir => {
                let can_pop = matches!(parts.last(), Some(last) if last != "..");
                if can_pop {
                    parts.pop();
                } else if !absolute {
                    parts.push("..".to_string());
                }
            }
            Component::Normal(name) => parts.push(name.to_string_lossy().into_owned()),
        }
    }

    let mut out = prefix;
    if absolute {
        out.push('/');
    }
    out.push_str(&parts.join("/"));
    if out.is_empty() {
        out.push('.');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn config() -> Config {
        Config::for_data_dir(Path::new("unused"))
    }

    fn key(dir: &TempDir, rel: &str) -> String {
        normalize_path(&dir.path().join(rel))
    }

    #[test]
    fn scan_finds_every_file() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a"), "a").unwrap();
        fs::write(dir.path().join("b"), "b").unwrap();
        fs::write(dir.path().join("c"), "c").unwrap();

        let result = run(dir.path(), &config()).unwrap();
        assert_eq!(result.snapshot.len(), 3);
        assert!(result.skipped.is_empty());
        assert!(result.snapshot.contains(&key(&dir, "b")));
    }

    #[test]
    fn scan_descends_nested_directories() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("sub/deeper")).unwrap();
        fs::write(dir.path().join("root.txt"), "root").unwrap();
        fs::write(dir.path().join("sub/nested.txt"), "nested").unwrap();
        fs::write(dir.path().join("sub/deeper/deep.txt"), "deep").unwrap();

        let result = run(dir.path(), &config()).unwrap();
        assert_eq!(result.snapshot.len(), 3);
        assert!(result.snapshot.contains(&key(&dir, "sub/deeper/deep.txt")));
    }

    #[test]
    fn repeated_scans_yield_identical_snapshots() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("d")).unwrap();
        fs::write(dir.path().join("d/x"), "x").unwrap();
        fs::write(dir.path().join("y"), "y").unwrap();

        let first = run(dir.path(), &config()).unwrap();
        let second = run(dir.path(), &config()).unwrap();
        assert_eq!(first.snapshot, second.snapshot);
    }

    #[test]
    fn missing_root_is_an_error() {
        let dir = TempDir::new().unwrap();
        let err = run(&dir.path().join("nope"), &config()).unwrap_err();
        assert!(matches!(err, Error::InvalidRoot { .. }));
    }

    #[test]
    fn file_root_is_an_error() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("file.txt");
        fs::write(&file, "x").unwrap();
        assert!(matches!(run(&file, &config()), Err(Error::InvalidRoot { .. })));
    }

    #[cfg(unix)]
    #[test]
    fn unreadable_file_is_excluded() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let locked = dir.path().join("locked.txt");
        fs::write(dir.path().join("open.txt"), "open").unwrap();
        fs::write(&locked, "secret").unwrap();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

        // privileged users read through the mode bits; nothing to check then
        if fs::File::open(&locked).is_ok() {
            return;
        }

        let result = run(dir.path(), &config()).unwrap();
        assert_eq!(result.snapshot.len(), 1);
        assert!(!result.snapshot.contains(&key(&dir, "locked.txt")));
        assert_eq!(result.skipped.len(), 1);
        assert_eq!(result.skipped[0].path, key(&dir, "locked.txt"));

        fs::set_permissions(&locked, fs::Permissions::from_mode(0o644)).unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn symlinked_file_is_hashed_but_linked_dir_is_not_descended() {
        use std::os::unix::fs::symlink;

        let dir = TempDir::new().unwrap();
        let outside = TempDir::new().unwrap();
        fs::write(outside.path().join("far.txt"), "far").unwrap();
        fs::write(dir.path().join("real.txt"), "real").unwrap();
        symlink(dir.path().join("real.txt"), dir.path().join("alias.txt")).unwrap();
        symlink(outside.path(), dir.path().join("linked_dir")).unwrap();
        symlink(dir.path(), dir.path().join("loop")).unwrap();

        let result = run(dir.path(), &config()).unwrap();
        assert_eq!(result.snapshot.len(), 2);
        assert_eq!(
            result.snapshot.get(&key(&dir, "alias.txt")),
            result.snapshot.get(&key(&dir, "real.txt"))
        );
        assert!(!result.snapshot.contains(&key(&dir, "linked_dir/far.txt")));
    }

    #[cfg(unix)]
    #[test]
    fn following_links_survives_cycles() {
        use std::os::unix::fs::symlink;

        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("sub/file.txt"), "data").unwrap();
        symlink(dir.path(), dir.path().join("sub/back")).unwrap();

        let mut config = config();
        config.follow_links = true;

        let result = run(dir.path(), &config).unwrap();
        assert_eq!(result.snapshot.len(), 1);
        assert!(!result.skipped.is_empty());
    }

    #[test]
    fn normalize_path_cleans_components() {
        assert_eq!(normalize_path(Path::new("a/./b/../c")), "a/c");
        assert_eq!(normalize_path(Path::new("./a")), "a");
        assert_eq!(normalize_path(Path::new("../a/..")), "..");
        assert_eq!(normalize_path(Path::new(".")), ".");
    }

    #[cfg(unix)]
    #[test]
    fn normalize_path_keeps_absolute_root() {
        assert_eq!(normalize_path(Path::new("/data//logs/../x")), "/data/x");
        assert_eq!(normalize_path(Path::new("/..")), "/");
    }
}
