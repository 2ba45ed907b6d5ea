//! Markdown report generation
//!
//! This module renders an analysis report as a markdown document with a run
//! summary, document facts, a heading table and link counts.

use crate::output::report::AnalysisReport;
use crate::Result;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Writes a markdown report to a file
///
/// # Arguments
///
/// * `report` - The analysis report
/// * `output_path` - Path where the markdown file should be written
///
/// # Returns
///
/// * `Ok(())` - Successfully wrote the report
/// * `Err(AnalyzerError::Io)` - Failed to write the file
pub fn write_markdown_report(report: &AnalysisReport, output_path: &Path) -> Result<()> {
    let markdown = format_markdown_report(report);

    let mut file = File::create(output_path)?;
    file.write_all(markdown.as_bytes())?;

    Ok(())
}

/// Formats an analysis report as markdown
///
/// # Arguments
///
/// * `report` - The analysis report
///
/// # Returns
///
/// A formatted markdown string
pub fn format_markdown_report(report: &AnalysisReport) -> String {
    let mut md = String::new();

    // Title
    md.push_str("# Page Analysis Report\n\n");

    // Run metadata
    md.push_str("## Run Information\n\n");
    md.push_str(&format!("- **URL**: {}\n", report.url));
    md.push_str(&format!("- **Stage**: {}\n", report.stage));
    if let Some(status) = report.status_code {
        md.push_str(&format!("- **Status Code**: {}\n", status));
    }
    md.push_str(&format!(
        "- **Analyzed At**: {}\n\n",
        report.analyzed_at.to_rfc3339()
    ));

    if let Some(error) = &report.error {
        md.push_str("## Error\n\n");
        md.push_str(&format!("- **Code**: {}\n", error.code));
        if !error.message.is_empty() {
            md.push_str(&format!("- **Message**: {}\n", error.message));
        }
        md.push_str(&format!("- **Error**: {}\n", error.error));
        if let Some(stage) = report.failed_in {
            md.push_str(&format!("- **Failed In**: {}\n", stage));
        }
        md.push('\n');
    }

    // Document facts
    md.push_str("## Document\n\n");
    md.push_str(&format!(
        "- **HTML Version**: {}\n",
        if report.html_version.is_empty() {
            "none"
        } else {
            report.html_version.as_str()
        }
    ));
    md.push_str(&format!("- **Title**: {}\n", report.title));
    md.push_str(&format!(
        "- **Login Form**: {}\n\n",
        if report.has_login_form { "yes" } else { "no" }
    ));

    // Headings
    md.push_str("## Headings\n\n");
    md.push_str("| Level | Count |\n");
    md.push_str("|-------|-------|\n");
    for (tag, count) in report.headings.iter() {
        md.push_str(&format!("| {} | {} |\n", tag, count));
    }
    md.push('\n');

    // Links
    md.push_str("## Links\n\n");
    md.push_str("| Kind | Count |\n");
    md.push_str("|------|-------|\n");
    md.push_str(&format!("| Internal | {} |\n", report.internal_links));
    md.push_str(&format!("| External | {} |\n", report.external_links));
    md.push_str(&format!(
        "| Inaccessible | {} |\n",
        report.inaccessible_links
    ));

    md
}
