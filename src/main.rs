use clap::Parser;
use hashwatch::cli::{Cli, Command};
use hashwatch::config::Config;
use hashwatch::logging;
use hashwatch::report::{self, Report};
use hashwatch::scan::{self, normalize_path};
use hashwatch::store::{diff, SnapshotStore};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process;
use tracing::{error, info, warn};

/// Exit status when a scan or save could not complete.
const EXIT_FAILURE: i32 = 2;
/// Exit status for `--fail-on-change` when changes were found.
const EXIT_CHANGED: i32 = 1;

fn prompt_for_folder() -> io::Result<String> {
    print!("Enter the folder path to scan: ");
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;

    let folder = line.trim();
    if folder.is_empty() {
        return Err(io::Error::new(io::ErrorKind::InvalidInput, "no folder given"));
    }
    Ok(folder.to_string())
}

/// Resolve to an absolute path so every spelling of a directory shares one
/// history. Nonexistent paths are kept as given; the scan rejects them.
fn canonical_root(folder: &str) -> PathBuf {
    std::fs::canonicalize(folder).unwrap_or_else(|_| PathBuf::from(folder))
}

fn run_scan(dir: Option<String>, config: &Config) -> i32 {
    let folder = match dir {
        Some(dir) => dir,
        None => match prompt_for_folder() {
            Ok(folder) => folder,
            Err(e) => {
                eprintln!("error: cannot read folder path: {e}");
                return EXIT_FAILURE;
            }
        },
    };

    let root = canonical_root(&folder);
    let key = normalize_path(&root);
    info!(folder = %key, "integrity check started");

    let result = match scan::run(&root, config) {
        Ok(result) => result,
        Err(e) => {
            error!(error = %e, "scan failed");
            eprintln!("error: {e}");
            return EXIT_FAILURE;
        }
    };

    let store = SnapshotStore::new(&config.store_path).with_retention(config.backup_retention);
    let previous = store.load_latest(&key);
    if !config.json_output {
        println!("Previously stored: {} file(s) for this folder", previous.len());
    }

    let changes = diff::compare(&result.snapshot, &previous);
    info!(
        new = changes.new.len(),
        modified = changes.modified.len(),
        deleted = changes.deleted.len(),
        "comparison complete"
    );

    let report = Report::new(key.clone(), changes);
    report::print(&result, &report, config);

    if config.write_report {
        match report::write(
            &report,
            &config.report_dir,
            config.report_format,
            config.backup_retention,
        ) {
            Ok(path) => {
                if !config.json_output {
                    println!("Report saved to: {}", path.display());
                }
            }
            Err(e) => {
                warn!(error = %e, "report not written");
                eprintln!("warning: {e}");
            }
        }
    }

    match store.save(result.snapshot, &key) {
        Ok(outcome) => {
            if let Some(e) = &outcome.backup_error {
                eprintln!("warning: store backup failed, previous history has no copy: {e}");
            }
            for (path, reason) in &outcome.purged.failed {
                eprintln!("warning: cannot delete old backup {}: {reason}", path.display());
            }
            if !config.json_output {
                println!("\nHashes saved as snapshot {}.", outcome.timestamp);
            }
        }
        Err(e) => {
            error!(error = %e, "snapshot not persisted");
            eprintln!("error: failed to persist snapshot: {e}");
            eprintln!("this run was NOT recorded; the next scan compares against the previous snapshot");
            return EXIT_FAILURE;
        }
    }

    if config.fail_on_change && !report.changes.is_empty() {
        EXIT_CHANGED
    } else {
        0
    }
}

fn print_history(dir: Option<String>, config: &Config) {
    let store = SnapshotStore::new(&config.store_path);

    let directories: Vec<String> = match dir {
        Some(dir) => vec![normalize_path(&canonical_root(&dir))],
        None => store.load().directories().map(String::from).collect(),
    };

    if directories.is_empty() {
        println!("No snapshots found. Run 'hashwatch scan <DIR>' to create one.");
        return;
    }

    for directory in directories {
        let history = store.history(&directory);
        println!("{directory}");
        if history.is_empty() {
            println!("  no snapshots");
        }
        for (time, files) in history {
            println!("  {time}  {files:>8} file(s)");
        }
    }
}

fn main() {
    let cli = Cli::parse();

    let mut config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(EXIT_FAILURE);
        }
    };

    if let Some(store) = &cli.store {
        config.store_path = store.clone();
    }

    match cli.command {
        Command::Scan(args) => {
            config.apply_scan_args(&args);
            logging::init(&config.log_dir, config.verbose);
            process::exit(run_scan(args.dir, &config));
        }
        Command::History(args) => {
            logging::init(&config.log_dir, false);
            print_history(args.dir, &config);
        }
        Command::Purge => {
            logging::init(&config.log_dir, false);
            let store = SnapshotStore::new(&config.store_path).with_retention(config.backup_retention);
            let purged = store.purge_old_backups();

            for path in &purged.removed {
                println!("deleted {}", path.display());
            }
            for (path, reason) in &purged.failed {
                eprintln!("cannot delete {}: {reason}", path.display());
            }
            if purged.removed.is_empty() && purged.failed.is_empty() {
                println!("No expired backups.");
            }
            if !purged.failed.is_empty() {
                process::exit(EXIT_FAILURE);
            }
        }
    }
}
