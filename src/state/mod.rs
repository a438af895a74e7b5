//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `PageState`: where a URL sits within its root's frontier
//! - `RootCrawlState`: the per-root frontier (waiting, processing, crawled)
//!   with its admission policy and image results

mod frontier;
mod page_state;

// Re-export main types
pub use frontier::{CrawledPage, FrontierCounts, RootCrawlState};
pub use page_state::PageState;
