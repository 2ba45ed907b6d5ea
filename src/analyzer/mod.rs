//! Analyzer module - the two-stage page analysis pipeline
//!
//! This module contains the logic that turns one URL into an [`AnalysisResult`](crate::state::AnalysisResult):
//! - `coordinator`: Drives the prerequisite and analysis stages over task pools
//! - `fetcher`: The HTTP capability used for the page fetch and link probes
//! - `parser`: Owned, shareable document tree
//! - `extract`: Version, title, heading, link and login-form extraction
//! - `reachability`: Bounded fan-out of link probes

mod coordinator;
mod extract;
mod fetcher;
mod parser;
mod reachability;

#[cfg(test)]
pub(crate) mod test_support;

pub use coordinator::{AnalysisOutcome, Analyzer};
pub use extract::{
    classify_links, collect_links, count_headings, detect_html_version, extract_title,
    has_login_form, LinkCounts, LinkInfo,
};
pub use fetcher::{build_http_client, FetchResponse, HttpWebClient, WebClient};
pub use parser::{Children, Descendants, Document, NodeId, NodeKind, NodeRef};
pub use reachability::{LinkProbe, DEFAULT_PROBE_CONCURRENCY};

use crate::state::{HeadingCounts, PipelineStage, ResultAccumulator};
use std::fmt;
use std::sync::Arc;
use url::Url;

/// Identifies one task of the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskLabel {
    // ===== Prerequisite stage =====
    ParseUrl,
    FetchPage,

    // ===== Analysis stage =====
    HtmlVersion,
    Title,
    Headings,
    LinkCounts,
    LinkAccessibility,
    LoginForm,
}

impl TaskLabel {
    /// Returns the task name used in logs and error messages
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ParseUrl => "parse_url",
            Self::FetchPage => "fetch_page",
            Self::HtmlVersion => "html_version",
            Self::Title => "title",
            Self::Headings => "headings",
            Self::LinkCounts => "link_counts",
            Self::LinkAccessibility => "link_accessibility",
            Self::LoginForm => "login_form",
        }
    }

    /// Returns the stage this task belongs to
    pub fn stage(&self) -> PipelineStage {
        match self {
            Self::ParseUrl | Self::FetchPage => PipelineStage::Prerequisite,
            _ => PipelineStage::Analysis,
        }
    }
}

impl fmt::Display for TaskLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Value produced by a successful pipeline task
#[derive(Debug, Clone)]
pub enum TaskOutput {
    BaseUrl(Url),
    Page {
        status: u16,
        body: Arc<[u8]>,
        document: Arc<Document>,
    },
    HtmlVersion(String),
    Title(String),
    Headings(HeadingCounts),
    LinkCounts(LinkCounts),
    InaccessibleLinks(usize),
    LoginForm(bool),
}

impl TaskOutput {
    /// Writes this output into the field of the accumulator it owns
    pub fn apply(self, accumulator: &ResultAccumulator) {
        match self {
            Self::BaseUrl(url) => accumulator.set_base_url(url),
            Self::Page {
                status,
                body,
                document,
            } => {
                accumulator.set_status_code(status);
                accumulator.set_page(body, document);
            }
            Self::HtmlVersion(version) => accumulator.set_html_version(version),
            Self::Title(title) => accumulator.set_title(title),
            Self::Headings(headings) => accumulator.set_headings(headings),
            Self::LinkCounts(counts) => accumulator.set_link_counts(counts.internal, counts.external),
            Self::InaccessibleLinks(count) => accumulator.set_inaccessible_links(count),
            Self::LoginForm(present) => accumulator.set_login_form(present),
        }
    }
}
