use crate::state::PageState;
use crate::url::{parse_root, same_host};
use crate::CrawlError;
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};
use url::Url;

/// Final record of a fetched page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawledPage {
    /// Images found on the page, deduplicated in first-seen order
    pub images: Vec<String>,

    /// Whether the fetch failed and the page was abandoned
    pub failed: bool,
}

/// Sizes of the three frontier collections
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrontierCounts {
    pub waiting: usize,
    pub processing: usize,
    pub crawled: usize,
    /// Subset of `crawled` whose fetch failed
    pub failed: usize,
}

/// The three mutually exclusive collections guarded by one lock
#[derive(Debug, Default)]
struct Frontier {
    waiting: HashSet<String>,
    processing: HashMap<String, Vec<String>>,
    crawled: HashMap<String, CrawledPage>,
    /// Crawled URLs in completion order, for stable result ordering
    completion_order: Vec<String>,
}

impl Frontier {
    fn is_known(&self, url: &str) -> bool {
        self.waiting.contains(url)
            || self.processing.contains_key(url)
            || self.crawled.contains_key(url)
    }

    fn finish(&mut self, url: &str, failed: bool) -> bool {
        match self.processing.remove(url) {
            Some(images) => {
                let images = if failed { Vec::new() } else { images };
                self.crawled
                    .insert(url.to_string(), CrawledPage { images, failed });
                self.completion_order.push(url.to_string());
                true
            }
            None => false,
        }
    }
}

/// Crawl frontier of a single root URL
///
/// Tracks every URL discovered under the root in exactly one of three
/// collections: `waiting` (admitted, not yet claimed), `processing`
/// (claimed, being fetched, with the images found so far) and `crawled`
/// (done). All transitions happen under a single lock per root, and no lock
/// is held across a network call.
#[derive(Debug)]
pub struct RootCrawlState {
    /// Root URL as submitted
    root: String,

    /// Parsed root URL; admission and resolution are relative to it
    domain: Url,

    inner: Mutex<Frontier>,
}

impl RootCrawlState {
    /// Creates a frontier whose only waiting URL is the root itself
    ///
    /// The root enters `waiting` in its parsed form, so a root submitted as
    /// `http://a.test` and a later link to `/` are the same page.
    pub fn new(root: &str) -> Result<Self, CrawlError> {
        let domain = parse_root(root)?;

        let mut frontier = Frontier::default();
        frontier.waiting.insert(domain.to_string());

        Ok(Self {
            root: root.to_string(),
            domain,
            inner: Mutex::new(frontier),
        })
    }

    /// Root URL as submitted
    pub fn root(&self) -> &str {
        &self.root
    }

    /// Parsed root URL
    pub fn domain(&self) -> &Url {
        &self.domain
    }

    fn lock(&self) -> MutexGuard<'_, Frontier> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Admits a candidate link into `waiting`
    ///
    /// The membership check across all three collections and the insertion
    /// happen in one critical section, so racing discoverers of the same URL
    /// admit it exactly once. Off-host candidates are discarded.
    ///
    /// Returns true if the candidate was newly admitted.
    pub fn admit_link(&self, candidate: &Url) -> bool {
        if !same_host(candidate, &self.domain) {
            return false;
        }

        let key = candidate.as_str();
        let mut frontier = self.lock();
        if frontier.is_known(key) {
            return false;
        }
        frontier.waiting.insert(key.to_string());
        true
    }

    /// Records an image found on a page that is currently being fetched
    ///
    /// Duplicates within the same page are ignored. Returns false if the
    /// image was already recorded or the page is not in `processing`.
    pub fn record_image(&self, page: &str, image: &str) -> bool {
        let mut frontier = self.lock();
        match frontier.processing.get_mut(page) {
            Some(images) if !images.iter().any(|i| i == image) => {
                images.push(image.to_string());
                true
            }
            _ => false,
        }
    }

    /// Claims an arbitrary waiting URL for exclusive fetching
    ///
    /// The URL moves from `waiting` straight into `processing` with an empty
    /// image list, so it stays known to the root throughout.
    pub fn claim_next(&self) -> Option<String> {
        let mut frontier = self.lock();
        let url = frontier.waiting.iter().next().cloned()?;
        frontier.waiting.remove(&url);
        frontier.processing.insert(url.clone(), Vec::new());
        Some(url)
    }

    /// Moves a fetched page from `processing` to `crawled` with its images
    pub fn complete(&self, url: &str) -> bool {
        self.lock().finish(url, false)
    }

    /// Moves a page whose fetch failed to `crawled` with no images
    pub fn abandon(&self, url: &str) -> bool {
        self.lock().finish(url, true)
    }

    /// Returns true if some URL is waiting to be claimed
    pub fn has_waiting(&self) -> bool {
        !self.lock().waiting.is_empty()
    }

    /// Returns true once both `waiting` and `processing` are empty
    pub fn is_settled(&self) -> bool {
        let frontier = self.lock();
        frontier.waiting.is_empty() && frontier.processing.is_empty()
    }

    /// Returns the current sizes of the frontier collections
    pub fn counts(&self) -> FrontierCounts {
        let frontier = self.lock();
        FrontierCounts {
            waiting: frontier.waiting.len(),
            processing: frontier.processing.len(),
            crawled: frontier.crawled.len(),
            failed: frontier.crawled.values().filter(|p| p.failed).count(),
        }
    }

    /// Returns where a URL currently sits, if it is known to this root
    pub fn state_of(&self, url: &str) -> Option<PageState> {
        let frontier = self.lock();
        if frontier.waiting.contains(url) {
            Some(PageState::Waiting)
        } else if frontier.processing.contains_key(url) {
            Some(PageState::Processing)
        } else {
            frontier.crawled.get(url).map(|page| {
                if page.failed {
                    PageState::Failed
                } else {
                    PageState::Crawled
                }
            })
        }
    }

    /// Returns the final record of a crawled page
    #[cfg(test)]
    fn crawled_page(&self, url: &str) -> Option<CrawledPage> {
        self.lock().crawled.get(url).cloned()
    }

    /// Returns every URL known to this root, in no particular order
    pub fn known_urls(&self) -> Vec<String> {
        let frontier = self.lock();
        frontier
            .waiting
            .iter()
            .chain(frontier.processing.keys())
            .chain(frontier.crawled.keys())
            .cloned()
            .collect()
    }

    /// Collects the deduplicated images found under this root
    ///
    /// Crawled pages contribute in completion order. With
    /// `include_in_flight`, images already found on pages still being
    /// fetched follow. Equality is case-sensitive; first occurrence wins.
    pub fn images(&self, include_in_flight: bool) -> Vec<String> {
        let frontier = self.lock();
        let mut seen = HashSet::new();
        let mut images = Vec::new();

        let crawled = frontier
            .completion_order
            .iter()
            .filter_map(|url| frontier.crawled.get(url))
            .flat_map(|page| page.images.iter());

        let in_flight = frontier
            .processing
            .values()
            .flatten()
            .filter(|_| include_in_flight);

        for image in crawled.chain(in_flight) {
            if seen.insert(image.as_str()) {
                images.push(image.clone());
            }
        }
        images
    }
}
