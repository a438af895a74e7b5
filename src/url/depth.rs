use url::Url;

/// Counts the `/`-separated pieces of a page URL beyond its root
///
/// The suffix is whatever follows the last occurrence of the root's URL
/// string inside the page URL; a page that does not contain the root string
/// at all is measured whole. The root itself and its direct children both
/// measure 1, grandchildren measure 2.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use image_crawler::url::link_depth;
///
/// let domain = Url::parse("http://a.test/").unwrap();
/// assert_eq!(link_depth("http://a.test/about", &domain), 1);
/// assert_eq!(link_depth("http://a.test/about/team", &domain), 2);
/// ```
pub fn link_depth(page: &str, domain: &Url) -> usize {
    let root = domain.as_str();
    let suffix = match page.rfind(root) {
        Some(start) => &page[start + root.len()..],
        None => page,
    };
    suffix.split('/').count()
}

/// Decides whether outbound links of `page` are followed
///
/// Links are collected on the root page itself (as submitted or as parsed)
/// and on any page whose [`link_depth`] is below `link_levels`.
pub fn collects_links(page: &str, root: &str, domain: &Url, link_levels: usize) -> bool {
    page == root || page == domain.as_str() || link_depth(page, domain) < link_levels
}
