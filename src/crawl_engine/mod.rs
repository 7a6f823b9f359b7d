//! Listing-discovery crawl engine
//!
//! Walks the paginated search results, resolves collective bundles and
//! collects one URL per property into a run artifact.

pub mod collective;
pub mod crawl_types;
pub mod dedup;
pub mod orchestrator;
pub mod page_processor;

// Re-export main types
pub use collective::{CollectiveError, resolve_collective};
pub use crawl_types::{CrawlError, CrawlOutcome, CrawlStats, CrawlStatsSnapshot};
pub use dedup::{SeenIds, UrlCollection};
pub use orchestrator::crawl_listings;
pub use page_processor::{CrawlState, PageResult, process_listing, process_results_page};
