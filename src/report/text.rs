//! Plain-text change report.

use super::{Report, TIME_FORMAT};

pub fn render(report: &Report) -> String {
    let mut output = String::new();

    output.push_str(&format!("Scan Report for: {}\n", report.root));
    output.push_str(&format!(
        "Scan Time: {}\n\n",
        report.generated_at.format(TIME_FORMAT)
    ));

    if report.changes.is_empty() {
        output.push_str("No changes detected.\n");
        return output;
    }

    for (kind, paths) in report.changes.sections() {
        output.push_str(&format!("{} Files:\n", kind.label()));
        for path in paths {
            output.push_str(&format!("    - {path}\n"));
        }
        output.push('\n');
    }

    output
}
