//! HTML parser for extracting links and images
//!
//! Scans start tags in document order:
//! - `<a href>` and `<link href>` become candidate links (when link collection is enabled)
//! - `<img src>` becomes a discovered image when its suffix is `png`, `gif` or `jpeg`
//!
//! Every reference is resolved against the root domain URL. Values that do
//! not resolve are dropped without failing the page.

use crate::url::{is_wanted_image, resolve_reference};
use scraper::{Html, Selector};
use url::Url;

/// Links and images extracted from a single page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedPage {
    /// Candidate links, absolute, in document order (not yet host-scoped)
    pub links: Vec<Url>,

    /// Image URLs, absolute, deduplicated in document order
    pub images: Vec<String>,
}

/// Parses HTML content and extracts candidate links and images
///
/// The HTML5 parser is error tolerant: malformed markup simply ends up as
/// whatever tree the parser recovers, so parsing never fails.
///
/// # Arguments
///
/// * `html` - The HTML content to parse
/// * `domain` - The root URL references are resolved against
/// * `collect_links` - Whether `<a>`/`<link>` targets are collected
///
/// # Example
///
/// ```
/// use image_crawler::crawler::parse_page;
/// use url::Url;
///
/// let html = r#"<a href="/about">About</a><img src="/logo.png">"#;
/// let domain = Url::parse("http://a.test/").unwrap();
/// let parsed = parse_page(html, &domain, true);
/// assert_eq!(parsed.links[0].as_str(), "http://a.test/about");
/// assert_eq!(parsed.images, vec!["http://a.test/logo.png"]);
/// ```
pub fn parse_page(html: &str, domain: &Url, collect_links: bool) -> ParsedPage {
    let document = Html::parse_document(html);
    let mut parsed = ParsedPage::default();

    let selector = match Selector::parse("a, link, img") {
        Ok(selector) => selector,
        Err(_) => return parsed,
    };

    for element in document.select(&selector) {
        let tag = element.value();
        match tag.name() {
            "a" | "link" if collect_links => {
                if let Some(link) = tag.attr("href").and_then(|href| resolve_reference(href, domain))
                {
                    parsed.links.push(link);
                }
            }
            "img" => {
                let image = match tag.attr("src").and_then(|src| resolve_reference(src, domain)) {
                    Some(image) => image.to_string(),
                    None => continue,
                };
                if is_wanted_image(&image) && !parsed.images.contains(&image) {
                    parsed.images.push(image);
                }
            }
            _ => {}
        }
    }

    parsed
}
