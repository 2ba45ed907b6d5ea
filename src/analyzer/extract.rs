//! Structural extraction over a parsed page
//!
//! Each function here is the body of one analysis task:
//! - Markup version from the parsed doctype declaration
//! - Title text
//! - Heading counts
//! - Hyperlinks, resolved and classified as internal or external
//! - Login-form detection

use crate::analyzer::parser::{Document, NodeKind};
use crate::state::HeadingCounts;
use crate::url::{resolve_link, same_host};
use url::Url;

/// A hyperlink found on the page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkInfo {
    /// Absolute URL of the link target
    pub url: String,

    /// True if the target's canonical host matches the base URL's
    pub internal: bool,
}

/// Internal and external link totals
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LinkCounts {
    pub internal: usize,
    pub external: usize,
}

/// Detects the markup version from the document's doctype declaration
///
/// Only a declaration the HTML parser recognised as the document's doctype
/// counts; `<!DOCTYPE` text inside scripts, comments or the body is ignored.
///
/// # Returns
///
/// A version name such as `HTML5` or `XHTML 1.0 Strict`, the declaration
/// itself if it is not recognised, or an empty string if the document has no
/// doctype.
///
/// # Example
///
/// ```
/// use page_analyzer::analyzer::{detect_html_version, Document};
///
/// let page = Document::parse_str("<!DOCTYPE html><html></html>");
/// assert_eq!(detect_html_version(&page), "HTML5");
///
/// let bare = Document::parse_str("<html></html>");
/// assert_eq!(detect_html_version(&bare), "");
/// ```
pub fn detect_html_version(document: &Document) -> String {
    let Some(doctype) = document.doctype() else {
        return String::new();
    };

    match doctype.kind() {
        NodeKind::Doctype {
            name,
            public_id,
            system_id,
        } => classify_doctype(&doctype_declaration(name, public_id, system_id)),
        _ => String::new(),
    }
}

/// Rebuilds the declaration as `<!DOCTYPE name PUBLIC "..." "...">`
fn doctype_declaration(name: &str, public_id: &str, system_id: &str) -> String {
    let mut declaration = format!("<!DOCTYPE {}", name);
    if !public_id.is_empty() {
        declaration.push_str(&format!(" PUBLIC \"{}\"", public_id));
        if !system_id.is_empty() {
            declaration.push_str(&format!(" \"{}\"", system_id));
        }
    } else if !system_id.is_empty() {
        declaration.push_str(&format!(" SYSTEM \"{}\"", system_id));
    }
    declaration.push('>');
    declaration
}

fn classify_doctype(declaration: &str) -> String {
    let lower = declaration.to_ascii_lowercase();
    let rest = lower
        .trim_start_matches("<!doctype")
        .trim_end_matches('>')
        .trim();

    let version = if rest == "html" || lower.contains("about:legacy-compat") || lower.contains("html 5") {
        "HTML5"
    } else if lower.contains("xhtml 1.1") {
        "XHTML 1.1"
    } else if lower.contains("xhtml 1.0 strict") {
        "XHTML 1.0 Strict"
    } else if lower.contains("xhtml 1.0 transitional") {
        "XHTML 1.0 Transitional"
    } else if lower.contains("xhtml 1.0 frameset") {
        "XHTML 1.0 Frameset"
    } else if lower.contains("html 4.01 transitional") {
        "HTML 4.01 Transitional"
    } else if lower.contains("html 4.01 frameset") {
        "HTML 4.01 Frameset"
    } else if lower.contains("html 4.01") {
        "HTML 4.01 Strict"
    } else if lower.contains("html 3.2") {
        "HTML 3.2"
    } else if lower.contains("html 2.0") {
        "HTML 2.0"
    } else {
        return declaration.to_string();
    };

    version.to_string()
}

/// Returns the trimmed text of the first `<title>` element, or an empty string
pub fn extract_title(document: &Document) -> String {
    document
        .elements("title")
        .next()
        .map(|title| title.own_text().trim().to_string())
        .unwrap_or_default()
}

/// Counts h1 to h6 elements anywhere in the document
pub fn count_headings(document: &Document) -> HeadingCounts {
    let mut counts = HeadingCounts::new();
    for name in document.descendants().filter_map(|node| node.element_name()) {
        counts.increment(name);
    }
    counts
}

/// Collects every followable hyperlink in one traversal
///
/// # Link Rules
///
/// - Only `<a>` elements with an `href` attribute are considered
/// - Hrefs are resolved against `base_url`
/// - Empty and non-HTTP(S) targets are skipped; `#fragment` hrefs point at the page itself
/// - A link is internal when its canonical host equals the base URL's
///
/// # Arguments
///
/// * `document` - The parsed page
/// * `base_url` - The URL the page was fetched from
pub fn collect_links(document: &Document, base_url: &Url) -> Vec<LinkInfo> {
    document
        .elements("a")
        .filter_map(|anchor| anchor.attr("href"))
        .filter_map(|href| resolve_link(href, base_url))
        .map(|target| LinkInfo {
            internal: same_host(&target, base_url),
            url: target.into(),
        })
        .collect()
}

/// Splits links into internal and external totals
pub fn classify_links(links: &[LinkInfo]) -> LinkCounts {
    links
        .iter()
        .fold(LinkCounts::default(), |mut counts, link| {
            if link.internal {
                counts.internal += 1;
            } else {
                counts.external += 1;
            }
            counts
        })
}

/// Returns true if some `<form>` contains an `<input type="password">`
pub fn has_login_form(document: &Document) -> bool {
    document.elements("form").any(|form| {
        form.descendants().any(|node| {
            node.is_element("input")
                && node
                    .attr("type")
                    .is_some_and(|kind| kind.trim().eq_ignore_ascii_case("password"))
        })
    })
}
