//! URL handling module for the image crawler
//!
//! This module provides reference resolution against a root domain, the
//! image suffix filter, host scoping and the link-depth policy.

mod depth;
mod domain;

pub use depth::{collects_links, link_depth};
pub use domain::{host_key, parse_root, same_host};

use url::Url;

/// Final `.`-delimited suffixes of image URLs worth collecting
///
/// Compared case-sensitively against the whole resolved URL string, so
/// `photo.JPEG` or `photo.png?v=2` do not qualify.
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "gif", "jpeg"];

/// Resolves an `href`/`src` attribute value against the root domain
///
/// References are resolved against the root URL, not against the page they
/// were found on. Values that fail to parse are dropped.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use image_crawler::url::resolve_reference;
///
/// let domain = Url::parse("http://a.test/").unwrap();
/// let resolved = resolve_reference("/x.png", &domain).unwrap();
/// assert_eq!(resolved.as_str(), "http://a.test/x.png");
/// ```
pub fn resolve_reference(raw: &str, domain: &Url) -> Option<Url> {
    domain.join(raw).ok()
}

/// Returns true if the URL string ends in one of [`IMAGE_EXTENSIONS`]
pub fn is_wanted_image(url: &str) -> bool {
    url.rsplit('.')
        .next()
        .map(|suffix| IMAGE_EXTENSIONS.contains(&suffix))
        .unwrap_or(false)
}
