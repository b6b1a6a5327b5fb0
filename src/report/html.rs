//! HTML change report.
//!
//! Paths come straight from the filesystem, so everything interpolated into
//! the document is escaped.

use super::{Report, TIME_FORMAT};

pub fn render(report: &Report) -> String {
    let mut output = String::new();

    output.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
    output.push_str("<title>File Integrity Report</title>\n</head>\n<body>\n");
    output.push_str(&format!("<h2>Scan Report for: {}</h2>\n", escape(&report.root)));
    output.push_str(&format!(
        "<p><strong>Scan Time:</strong> {}</p>\n",
        report.generated_at.format(TIME_FORMAT)
    ));

    if report.changes.is_empty() {
        output.push_str("<p>No changes detected.</p>\n");
    } else {
        for (kind, paths) in report.changes.sections() {
            output.push_str(&format!("<h3>{} Files:</h3>\n<ul>\n", kind.label()));
            for path in paths {
                output.push_str(&format!("<li>{}</li>\n", escape(path)));
            }
            output.push_str("</ul>\n");
        }
    }

    output.push_str("</body>\n</html>\n");
    output
}

fn escape(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::tests::sample;

    #[test]
    fn renders_sections_as_lists() {
        let output = render(&sample());
        assert!(output.contains("<h2>Scan Report for: /srv/www</h2>"));
        assert!(output.contains("<h3>New Files:</h3>\n<ul>\n<li>/srv/www/new.html</li>"));
        assert!(output.trim_end().ends_with("</html>"));
    }

    #[test]
    fn escapes_markup_in_paths() {
        let mut report = sample();
        report.changes.new = vec!["/srv/<script>&\"x\".html".to_string()];
        let output = render(&report);
        assert!(output.contains("<li>/srv/&lt;script&gt;&amp;&quot;x&quot;.html</li>"));
        assert!(!output.contains("<script>"));
    }
}
