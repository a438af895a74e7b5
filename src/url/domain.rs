use crate::CrawlError;
use url::Url;

/// Returns the `host[:port]` authority used for host scoping
///
/// The port is only included when it is not the scheme default, so
/// `http://a.test:80/` and `http://a.test/` share a key while
/// `http://a.test:8080/` does not.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use image_crawler::url::host_key;
///
/// let url = Url::parse("http://a.test:8080/x").unwrap();
/// assert_eq!(host_key(&url), Some("a.test:8080".to_string()));
/// ```
pub fn host_key(url: &Url) -> Option<String> {
    let host = url.host_str()?;
    Some(match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    })
}

/// Returns true if `candidate` lives on exactly the same host as `domain`
pub fn same_host(candidate: &Url, domain: &Url) -> bool {
    match (host_key(candidate), host_key(domain)) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

/// Parses a submitted root URL
///
/// A root must be an absolute URL with a host; everything scoped to the root
/// is decided relative to it.
pub fn parse_root(raw: &str) -> Result<Url, CrawlError> {
    let url = Url::parse(raw.trim()).map_err(|e| CrawlError::InvalidRoot {
        url: raw.to_string(),
        reason: e.to_string(),
    })?;

    if url.host_str().is_none() {
        return Err(CrawlError::InvalidRoot {
            url: raw.to_string(),
            reason: "missing host".to_string(),
        });
    }

    Ok(url)
}
