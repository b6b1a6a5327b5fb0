//! JSON output for change reports.
//!
//! Serializes a Report to JSON for scripting and piping.

use serde::Serialize;

use super::{Report, TIME_FORMAT};

#[derive(Serialize)]
struct JsonReport<'a> {
    root: &'a str,
    generated_at: String,
    new: &'a [String],
    modified: &'a [String],
    deleted: &'a [String],
}

pub fn render(report: &Report) -> String {
    let json = JsonReport {
        root: &report.root,
        generated_at: report.generated_at.format(TIME_FORMAT).to_string(),
        new: &report.changes.new,
        modified: &report.changes.modified,
        deleted: &report.changes.deleted,
    };

    // a struct of strings always serializes
    serde_json::to_string_pretty(&json).unwrap_or_else(|_| String::from("{}"))
}
