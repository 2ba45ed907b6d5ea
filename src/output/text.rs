//! Plain-text report for the terminal

use crate::output::report::AnalysisReport;
use std::fmt::Write;

/// Formats a report as aligned plain text
pub fn format_text_report(report: &AnalysisReport) -> String {
    let mut out = String::new();

    // Writing to a String cannot fail
    let _ = writeln!(out, "=== Page Analysis ===\n");
    let _ = writeln!(out, "URL: {}", report.url);
    let _ = writeln!(out, "Stage: {}", report.stage);
    if let Some(status) = report.status_code {
        let _ = writeln!(out, "Status code: {}", status);
    }
    let _ = writeln!(
        out,
        "Analyzed at: {}",
        report.analyzed_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    out.push('\n');

    if let Some(error) = &report.error {
        let _ = writeln!(out, "Error ({}): {}", error.code, error.message);
        let _ = writeln!(out, "  {}", error.error);
        if let Some(stage) = report.failed_in {
            let _ = writeln!(out, "  Failed during the {} stage", stage);
        }
        out.push('\n');
    }

    let _ = writeln!(out, "Document:");
    let version = if report.html_version.is_empty() {
        "(no doctype)"
    } else {
        report.html_version.as_str()
    };
    let _ = writeln!(out, "  HTML version: {}", version);
    let _ = writeln!(out, "  Title: {}", report.title);
    let _ = writeln!(
        out,
        "  Login form: {}",
        if report.has_login_form { "yes" } else { "no" }
    );
    out.push('\n');

    let _ = writeln!(out, "Headings:");
    for (tag, count) in report.headings.iter() {
        let _ = writeln!(out, "  {}: {}", tag, count);
    }
    out.push('\n');

    let _ = writeln!(out, "Links:");
    let _ = writeln!(out, "  Internal: {}", report.internal_links);
    let _ = writeln!(out, "  External: {}", report.external_links);
    let _ = writeln!(out, "  Inaccessible: {}", report.inaccessible_links);

    out
}

/// Prints a report to stdout
pub fn print_report(report: &AnalysisReport) {
    print!("{}", format_text_report(report));
}
