//! File integrity checking: hash a directory tree, compare it with the last
//! stored snapshot and keep a timestamped history of snapshots.

pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod report;
pub mod scan;
pub mod snapshot;
pub mod store;
