//! URL handling module
//!
//! This module provides base-URL validation, link resolution and the
//! canonical-host comparison used to classify links as internal or external.

mod canonical;
mod resolve;

// Re-export main functions
pub use canonical::{canonical_host, same_host};
pub use resolve::{parse_base_url, resolve_link};
