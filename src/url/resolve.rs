use crate::{UrlError, UrlResult};
use url::Url;

/// Parses and validates the URL a caller asked to analyze
///
/// # Validation Steps
///
/// 1. Reject empty input
/// 2. Parse the URL; reject if malformed
/// 3. Only `http` and `https` schemes are accepted
/// 4. The URL must have a host
///
/// # Arguments
///
/// * `input` - The URL string supplied by the caller
///
/// # Returns
///
/// * `Ok(Url)` - The parsed base URL
/// * `Err(UrlError)` - The input is not an analyzable URL
///
/// # Examples
///
/// ```
/// use page_analyzer::url::parse_base_url;
///
/// let url = parse_base_url("http://example.com/page").unwrap();
/// assert_eq!(url.host_str(), Some("example.com"));
///
/// assert!(parse_base_url("ftp://example.com/file").is_err());
/// ```
pub fn parse_base_url(input: &str) -> UrlResult<Url> {
    let input = input.trim();
    if input.is_empty() {
        return Err(UrlError::Empty);
    }

    let url = Url::parse(input).map_err(|e| UrlError::Parse(format!("{}: {}", input, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "only http and https are supported, got: {}",
            url.scheme()
        )));
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(UrlError::MissingHost);
    }

    Ok(url)
}

/// Resolves an `href` value against the base URL
///
/// Fragment-only hrefs (`#top`) resolve to the base page itself and are kept.
///
/// Returns None if the link should not be counted:
/// - Empty hrefs
/// - Hrefs that fail to resolve
/// - Anything that is not HTTP(S) after resolution (`mailto:`, `javascript:`, ...)
pub fn resolve_link(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() {
        return None;
    }

    match base_url.join(href) {
        Ok(absolute) if absolute.scheme() == "http" || absolute.scheme() == "https" => {
            Some(absolute)
        }
        Ok(_) => None,
        Err(e) => {
            tracing::debug!("Failed to resolve link {}: {}", href, e);
            None
        }
    }
}
