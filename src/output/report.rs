//! Serializable views of an analysis run

use crate::analyzer::AnalysisOutcome;
use crate::state::{AnalysisResult, HeadingCounts, PipelineStage};
use crate::AnalyzerError;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Caller-facing description of a failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorReport {
    /// What the tool was doing when it failed
    #[serde(skip_serializing_if = "String::is_empty")]
    pub message: String,

    /// The underlying error
    #[serde(skip_serializing_if = "String::is_empty")]
    pub error: String,

    /// HTTP-style status: the status observed on the page, 400 for other
    /// input problems, 500 for internal failures
    pub code: u16,
}

impl ErrorReport {
    /// Builds a report for a failed analysis run
    pub fn from_error(message: &str, error: &AnalyzerError) -> Self {
        let code = if error.is_client_error() {
            error.status_code().unwrap_or(400)
        } else {
            500
        };

        Self {
            message: message.to_string(),
            error: error.to_string(),
            code,
        }
    }

    /// Builds a report for input rejected before the pipeline ran
    pub fn rejected(message: &str, error: &AnalyzerError) -> Self {
        Self {
            message: message.to_string(),
            error: error.to_string(),
            code: 400,
        }
    }
}

/// Everything reported about one page
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    /// The URL as supplied by the caller
    pub url: String,

    /// `done` or `failed`
    pub stage: PipelineStage,

    /// Stage that was running when the run failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed_in: Option<PipelineStage>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,

    pub html_version: String,
    pub title: String,
    pub headings: HeadingCounts,
    pub internal_links: usize,
    pub external_links: usize,
    pub inaccessible_links: usize,
    pub has_login_form: bool,

    /// When the report was produced (UTC)
    pub analyzed_at: DateTime<Utc>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorReport>,
}

impl AnalysisReport {
    /// Builds a report from the collected result
    ///
    /// # Arguments
    ///
    /// * `url` - The URL as supplied by the caller
    /// * `result` - Collected facts, possibly partial
    /// * `stage` - Final stage of the run
    pub fn from_result(url: &str, result: &AnalysisResult, stage: PipelineStage) -> Self {
        Self {
            url: url.to_string(),
            stage,
            failed_in: None,
            status_code: result.status_code,
            html_version: result.html_version.clone(),
            title: result.title.clone(),
            headings: result.headings,
            internal_links: result.internal_links,
            external_links: result.external_links,
            inaccessible_links: result.inaccessible_links,
            has_login_form: result.has_login_form,
            analyzed_at: Utc::now(),
            error: None,
        }
    }

    /// Builds a report from a finished run, including its error if it failed
    pub fn from_outcome(url: &str, outcome: &AnalysisOutcome) -> Self {
        let mut report = Self::from_result(url, &outcome.result, outcome.stage);
        report.failed_in = outcome.failed_in;
        report.error = outcome
            .error
            .as_ref()
            .map(|e| ErrorReport::from_error("failed to analyze web page", e));
        report
    }

    /// Returns true if the run completed every task
    pub fn is_success(&self) -> bool {
        self.stage.is_success()
    }

    /// Total links found on the page
    pub fn total_links(&self) -> usize {
        self.internal_links + self.external_links
    }
}
