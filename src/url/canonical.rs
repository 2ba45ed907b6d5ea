use url::Url;

/// Returns the canonical host of a URL
///
/// The canonical host is the lowercase hostname, followed by `:port` only when
/// the port is not the default for the URL's scheme. `http://x.test:80` and
/// `http://x.test` therefore share the canonical host `x.test`, while
/// `http://x.test:8080` has `x.test:8080`.
///
/// # Arguments
///
/// * `url` - The URL to canonicalize
///
/// # Returns
///
/// * `Some(String)` - The canonical host
/// * `None` - If the URL has no host
///
/// # Examples
///
/// ```
/// use url::Url;
/// use page_analyzer::url::canonical_host;
///
/// let url = Url::parse("https://Example.COM:443/path").unwrap();
/// assert_eq!(canonical_host(&url), Some("example.com".to_string()));
///
/// let url = Url::parse("http://example.com:8080/").unwrap();
/// assert_eq!(canonical_host(&url), Some("example.com:8080".to_string()));
/// ```
pub fn canonical_host(url: &Url) -> Option<String> {
    let host = url.host_str()?.to_lowercase();

    // Url::port() is None when the port is the scheme's default
    match url.port() {
        Some(port) => Some(format!("{}:{}", host, port)),
        None => Some(host),
    }
}

/// Returns true if both URLs have the same canonical host
///
/// URLs without a host never match.
pub fn same_host(a: &Url, b: &Url) -> bool {
    match (canonical_host(a), canonical_host(b)) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}
