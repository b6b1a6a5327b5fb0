use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use serde::Deserialize;

use crate::cli::ScanArgs;
use crate::error::{Error, Result};
use crate::report::ReportFormat;

/// Backups older than this are purged on the next save.
pub const DEFAULT_RETENTION: Duration = Duration::from_secs(30 * 24 * 60 * 60);

pub const STORE_FILE_NAME: &str = "hashes.json";

#[derive(Debug, Clone)]
pub struct Config {
    pub store_path: PathBuf,
    pub report_dir: PathBuf,
    pub log_dir: PathBuf,
    pub report_format: ReportFormat,
    pub write_report: bool,
    pub backup_retention: Duration,
    pub follow_links: bool,
    pub json_output: bool,
    pub fail_on_change: bool,
    pub verbose: bool,
}

/// Optional keys of config.toml. Anything unset keeps its default.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct FileConfig {
    store_path: Option<PathBuf>,
    report_dir: Option<PathBuf>,
    log_dir: Option<PathBuf>,
    report_format: Option<ReportFormat>,
    backup_retention: Option<String>,
    follow_links: Option<bool>,
}

impl Config {
    /// Defaults with every persisted artifact under `data_dir`.
    pub fn for_data_dir(data_dir: &Path) -> Self {
        Config {
            store_path: data_dir.join(STORE_FILE_NAME),
            report_dir: data_dir.join("reports"),
            log_dir: data_dir.join("logs"),
            report_format: ReportFormat::Html,
            write_report: true,
            backup_retention: DEFAULT_RETENTION,
            follow_links: false,
            json_output: false,
            fail_on_change: false,
            verbose: false,
        }
    }

    /// Platform data directory (~/.local/share/hashwatch on Linux), or ./data.
    pub fn default_data_dir() -> PathBuf {
        ProjectDirs::from("", "", "hashwatch")
            .map(|dirs| dirs.data_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("data"))
    }

    pub fn default_config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "hashwatch").map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Defaults overlaid with the config file.
    ///
    /// An explicitly given file must exist; the default one may be absent.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let base = Config::default();

        let (path, required) = match explicit {
            Some(path) => (path.to_path_buf(), true),
            None => match Self::default_config_path() {
                Some(path) => (path, false),
                None => return Ok(base),
            },
        };

        match fs::read_to_string(&path) {
            Ok(contents) => base.merge_toml(&contents, &path),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound && !required => Ok(base),
            Err(e) => Err(Error::Config {
                path,
                details: e.to_string(),
            }),
        }
    }

    fn merge_toml(mut self, contents: &str, path: &Path) -> Result<Self> {
        let config_error = |details: String| Error::Config {
            path: path.to_path_buf(),
            details,
        };

        let file: FileConfig = toml::from_str(contents).map_err(|e| config_error(e.to_string()))?;

        if let Some(store_path) = file.store_path {
            self.store_path = store_path;
        }
        if let Some(report_dir) = file.report_dir {
            self.report_dir = report_dir;
        }
        if let Some(log_dir) = file.log_dir {
            self.log_dir = log_dir;
        }
        if let Some(format) = file.report_format {
            self.report_format = format;
        }
        if let Some(retention) = file.backup_retention {
            self.backup_retention = humantime::parse_duration(&retention)
                .map_err(|e| config_error(format!("backup_retention {retention:?}: {e}")))?;
        }
        if let Some(follow_links) = file.follow_links {
            self.follow_links = follow_links;
        }

        Ok(self)
    }

    pub fn apply_scan_args(&mut self, args: &ScanArgs) {
        if let Some(format) = args.format {
            self.report_format = format;
        }
        if let Some(dir) = &args.report_dir {
            self.report_dir = dir.clone();
        }
        self.write_report = !args.no_report;
        self.follow_links |= args.follow_links;
        self.json_output = args.json;
        self.fail_on_change = args.fail_on_change;
        self.verbose = args.verbose;
    }
}

impl Default for Config {
    fn default() -> Self {
        Config::for_data_dir(&Self::default_data_dir())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn base() -> Config {
        Config::for_data_dir(Path::new("/var/lib/hashwatch"))
    }

    #[test]
    fn defaults_live_under_data_dir() {
        let config = base();
        assert_eq!(config.store_path, Path::new("/var/lib/hashwatch/hashes.json"));
        assert_eq!(config.report_dir, Path::new("/var/lib/hashwatch/reports"));
        assert_eq!(config.backup_retention, DEFAULT_RETENTION);
        assert!(!config.follow_links);
    }

    #[test]
    fn toml_overrides_defaults() {
        let config = base()
            .merge_toml(
                r#"
                store_path = "/srv/integrity/hashes.json"
                report_format = "text"
                backup_retention = "2w"
                follow_links = true
                "#,
                Path::new("config.toml"),
            )
            .unwrap();

        assert_eq!(config.store_path, Path::new("/srv/integrity/hashes.json"));
        assert_eq!(config.report_format, ReportFormat::Text);
        assert_eq!(config.backup_retention, Duration::from_secs(14 * 24 * 60 * 60));
        assert!(config.follow_links);
        assert_eq!(config.log_dir, Path::new("/var/lib/hashwatch/logs"));
    }

    #[test]
    fn bad_retention_is_rejected() {
        let err = base()
            .merge_toml("backup_retention = \"soon\"", Path::new("config.toml"))
            .unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(base().merge_toml("colour = true", Path::new("c.toml")).is_err());
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("absent.toml");
        assert!(matches!(Config::load(Some(&missing)), Err(Error::Config { .. })));
    }

    #[test]
    fn explicit_file_is_read() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "report_format = \"json\"\n").unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.report_format, ReportFormat::Json);
    }
}
