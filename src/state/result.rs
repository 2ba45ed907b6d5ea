use crate::analyzer::Document;
use serde::ser::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use url::Url;

/// Heading tag names, in order
pub const HEADING_TAGS: [&str; 6] = ["h1", "h2", "h3", "h4", "h5", "h6"];

/// Count of each heading level; all six levels are always present
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HeadingCounts {
    counts: [usize; 6],
}

impl HeadingCounts {
    /// Creates counts with every level at zero
    pub fn new() -> Self {
        Self::default()
    }

    fn index(tag: &str) -> Option<usize> {
        HEADING_TAGS
            .iter()
            .position(|heading| heading.eq_ignore_ascii_case(tag))
    }

    /// Increments the count for `tag`; returns false if it is not a heading tag
    pub fn increment(&mut self, tag: &str) -> bool {
        match Self::index(tag) {
            Some(i) => {
                self.counts[i] += 1;
                true
            }
            None => false,
        }
    }

    /// Returns the count for `tag`, or zero for anything that is not a heading tag
    pub fn get(&self, tag: &str) -> usize {
        Self::index(tag).map_or(0, |i| self.counts[i])
    }

    /// Total number of headings across all levels
    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }

    /// Iterates over `(tag, count)` pairs from h1 to h6
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, usize)> + '_ {
        HEADING_TAGS.iter().copied().zip(self.counts.iter().copied())
    }

    /// Returns the counts as a map keyed by tag name
    pub fn to_map(&self) -> BTreeMap<String, usize> {
        self.iter()
            .map(|(tag, count)| (tag.to_string(), count))
            .collect()
    }
}

impl Serialize for HeadingCounts {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.iter())
    }
}

/// Everything learned about one page during an analysis run
///
/// Returned to the caller whether the run finished or failed; after a failure
/// only the fields written before the failure are populated.
#[derive(Clone, Default)]
pub struct AnalysisResult {
    /// The parsed URL that was analyzed
    pub base_url: Option<Url>,

    /// Raw bytes of the fetched document
    pub body: Option<Arc<[u8]>>,

    /// Parsed document tree
    pub document: Option<Arc<Document>>,

    /// Markup version derived from the doctype (empty if none)
    pub html_version: String,

    /// Text of the first `<title>` element (empty if none)
    pub title: String,

    /// Heading counts for h1 to h6
    pub headings: HeadingCounts,

    /// Links whose canonical host matches the base URL
    pub internal_links: usize,

    /// Links pointing at any other host
    pub external_links: usize,

    /// Links whose probe failed or returned a status >= 400
    pub inaccessible_links: usize,

    /// True if the page contains a form with a password input
    pub has_login_form: bool,

    /// Status code of the primary fetch, recorded even when it was not 200
    pub status_code: Option<u16>,
}

impl fmt::Debug for AnalysisResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnalysisResult")
            .field("base_url", &self.base_url.as_ref().map(Url::as_str))
            .field("body_len", &self.body.as_ref().map(|b| b.len()))
            .field("document_nodes", &self.document.as_ref().map(|d| d.len()))
            .field("html_version", &self.html_version)
            .field("title", &self.title)
            .field("headings", &self.headings)
            .field("internal_links", &self.internal_links)
            .field("external_links", &self.external_links)
            .field("inaccessible_links", &self.inaccessible_links)
            .field("has_login_form", &self.has_login_form)
            .field("status_code", &self.status_code)
            .finish()
    }
}

/// Shared destination for task outputs
///
/// Every write locks the accumulator only for the duration of that write, so
/// tasks that read stage-1 fields are never serialized behind each other.
/// Each field has exactly one owning task per run.
#[derive(Debug, Default)]
pub struct ResultAccumulator {
    inner: Mutex<AnalysisResult>,
}

impl ResultAccumulator {
    /// Creates an empty accumulator
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, AnalysisResult> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set_base_url(&self, url: Url) {
        self.lock().base_url = Some(url);
    }

    pub fn set_status_code(&self, status: u16) {
        self.lock().status_code = Some(status);
    }

    /// Stores the fetched body together with its parsed tree
    pub fn set_page(&self, body: Arc<[u8]>, document: Arc<Document>) {
        let mut result = self.lock();
        result.body = Some(body);
        result.document = Some(document);
    }

    pub fn set_html_version(&self, version: String) {
        self.lock().html_version = version;
    }

    pub fn set_title(&self, title: String) {
        self.lock().title = title;
    }

    pub fn set_headings(&self, headings: HeadingCounts) {
        self.lock().headings = headings;
    }

    pub fn set_link_counts(&self, internal: usize, external: usize) {
        let mut result = self.lock();
        result.internal_links = internal;
        result.external_links = external;
    }

    pub fn set_inaccessible_links(&self, count: usize) {
        self.lock().inaccessible_links = count;
    }

    pub fn set_login_form(&self, present: bool) {
        self.lock().has_login_form = present;
    }

    pub fn base_url(&self) -> Option<Url> {
        self.lock().base_url.clone()
    }

    pub fn body(&self) -> Option<Arc<[u8]>> {
        self.lock().body.clone()
    }

    pub fn document(&self) -> Option<Arc<Document>> {
        self.lock().document.clone()
    }

    pub fn status_code(&self) -> Option<u16> {
        self.lock().status_code
    }

    /// Returns a copy of the current state
    pub fn snapshot(&self) -> AnalysisResult {
        self.lock().clone()
    }

    /// Consumes the accumulator and returns the collected result
    pub fn into_result(self) -> AnalysisResult {
        self.inner
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
