//! Subscriber setup for the binary. Library code only emits `tracing` events.

use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

pub const LOG_FILE_NAME: &str = "activity.log";

/// Log to stderr and append to `<log_dir>/activity.log`.
///
/// `RUST_LOG` overrides the level. When the log file cannot be opened only
/// stderr is used. Returns the log file path when file logging is active.
pub fn init(log_dir: &Path, verbose: bool) -> Option<PathBuf> {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let stderr_layer = fmt::layer().with_writer(io::stderr).with_target(false);

    let log_path = log_dir.join(LOG_FILE_NAME);
    let file = fs::create_dir_all(log_dir).and_then(|_| {
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)
    });

    match file {
        Ok(file) => {
            let file_layer = fmt::layer().with_writer(Mutex::new(file)).with_ansi(false);
            let _ = tracing_subscriber::registry()
                .with(filter)
                .with(stderr_layer)
                .with(file_layer)
                .try_init();
            Some(log_path)
        }
        Err(e) => {
            let _ = tracing_subscriber::registry()
                .with(filter)
                .with(stderr_layer)
                .try_init();
            tracing::warn!(path = %log_path.display(), error = %e, "file logging disabled");
            None
        }
    }
}
