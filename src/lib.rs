//! Page Analyzer: structural analysis of a single web page
//!
//! This crate fetches one document, reports structural facts about it (markup
//! version, title, heading counts, internal/external links, login-form presence)
//! and probes the reachability of every hyperlink it contains.
//!
//! The work is driven by a bounded task pool ([`pool::TaskPool`]) in two stages:
//! the page fetch and base-URL parse run first, then six extraction tasks run
//! concurrently over the parsed document. The reachability task fans out its own
//! bounded sub-pool of link probes.

pub mod analyzer;
pub mod config;
pub mod output;
pub mod pool;
pub mod state;
pub mod url;

use thiserror::Error;

/// Main error type for page analysis
#[derive(Debug, Error)]
pub enum AnalyzerError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] UrlError),

    #[error("Failed to fetch {url}: {message}")]
    Fetch {
        url: String,
        status: Option<u16>,
        message: String,
    },

    #[error("Failed to parse document from {url}: {message}")]
    Parse { url: String, message: String },

    #[error("Worker pool error: {0}")]
    Pool(#[from] pool::PoolError),

    #[error("Task {label} failed: {source}")]
    Task {
        label: analyzer::TaskLabel,
        #[source]
        source: Box<AnalyzerError>,
    },

    #[error("Analysis was cancelled")]
    Cancelled,

    #[error("Missing pipeline input: {0}")]
    MissingInput(&'static str),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON encoding error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AnalyzerError {
    /// Wraps an error with the label of the pipeline task that produced it
    pub fn task(label: analyzer::TaskLabel, source: AnalyzerError) -> Self {
        Self::Task {
            label,
            source: Box::new(source),
        }
    }

    /// Returns the innermost error, unwrapping task context
    pub fn root_cause(&self) -> &AnalyzerError {
        match self {
            Self::Task { source, .. } => source.root_cause(),
            other => other,
        }
    }

    /// Returns the HTTP status code carried by a fetch failure, if any
    pub fn status_code(&self) -> Option<u16> {
        match self.root_cause() {
            Self::Fetch { status, .. } => *status,
            _ => None,
        }
    }

    /// Returns true if the error describes a problem with the caller's input
    /// rather than an internal defect
    ///
    /// Invalid URLs, failed fetches and unparseable documents are reported to
    /// the caller. Pool misuse and other internal errors are not.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self.root_cause(),
            Self::InvalidUrl(_) | Self::Fetch { .. } | Self::Parse { .. }
        )
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing host in URL")]
    MissingHost,

    #[error("URL is empty")]
    Empty,
}

/// Result type alias for analysis operations
pub type Result<T> = std::result::Result<T, AnalyzerError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use analyzer::{AnalysisOutcome, Analyzer};
pub use config::Config;
pub use state::{AnalysisResult, PipelineStage};
pub use crate::url::{canonical_host, parse_base_url};
