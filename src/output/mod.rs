//! Output module for rendering analysis reports
//!
//! This module handles:
//! - Building a serializable report from an analysis outcome
//! - Mapping failures to a caller-facing error payload
//! - Rendering reports as plain text, JSON or markdown

mod markdown;
mod report;
mod text;

pub use markdown::{format_markdown_report, write_markdown_report};
pub use report::{AnalysisReport, ErrorReport};
pub use text::{format_text_report, print_report};

use crate::config::OutputFormat;
use crate::Result;
use std::path::Path;

/// Renders a report in the requested format
///
/// # Returns
///
/// * `Ok(String)` - The rendered report
/// * `Err(AnalyzerError::Json)` - JSON encoding failed
pub fn render_report(report: &AnalysisReport, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Text => Ok(format_text_report(report)),
        OutputFormat::Json => Ok(serde_json::to_string_pretty(report)? + "\n"),
        OutputFormat::Markdown => Ok(format_markdown_report(report)),
    }
}

/// Renders an error payload as pretty JSON
pub fn render_error(error: &ErrorReport) -> Result<String> {
    Ok(serde_json::to_string_pretty(error)? + "\n")
}

/// Writes rendered output to `path`, or to stdout when no path is given
pub fn emit(rendered: &str, path: Option<&Path>) -> Result<()> {
    match path {
        Some(path) => {
            std::fs::write(path, rendered)?;
            tracing::info!("Report written to {}", path.display());
        }
        None => print!("{}", rendered),
    }
    Ok(())
}
