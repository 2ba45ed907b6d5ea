//! Configuration module for the page analyzer
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Every section and key has a default, so running without a file is the same
//! as running with an empty one.
//!
//! # Example
//!
//! ```no_run
//! use page_analyzer::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("analyzer.toml")).unwrap();
//! println!("Probing links with concurrency {}", config.analyzer.probe_concurrency);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    AnalyzerConfig, ClientConfig, Config, OutputConfig, OutputFormat, DEFAULT_USER_AGENT,
};

// Re-export parser functions
pub use parser::{hash_config, load_config, load_config_with_hash, parse_config};

pub use validation::{validate, MAX_PROBE_CONCURRENCY, MAX_REDIRECTS};
