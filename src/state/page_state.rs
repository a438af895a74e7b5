/// Page state definitions for tracking crawl progress
///
/// A URL known to a root frontier is in exactly one of these states.
use std::fmt;

/// Represents the current state of a page within its root's frontier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageState {
    // ===== Active States =====
    /// Discovered and admitted, waiting for a worker to claim it
    Waiting,

    /// Claimed by a worker and currently being fetched
    Processing,

    // ===== Terminal States =====
    /// Fetched and scanned; its images are final
    Crawled,

    /// Fetch failed; recorded as crawled with no images
    Failed,
}

impl PageState {
    /// Returns the lowercase label used in logs
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Waiting => "waiting",
            Self::Processing => "processing",
            Self::Crawled => "crawled",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for PageState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
