pub mod config;
pub mod crawl_engine;
pub mod extraction;
pub mod fetcher;
pub mod page_extractor;
pub mod run_store;
pub mod utils;

pub use config::{ScrapeConfig, SiteSelectors};
pub use crawl_engine::{CrawlError, CrawlOutcome, CrawlStatsSnapshot, crawl_listings};
pub use extraction::{
    CsvRecordSink, ExtractError, ExtractionOutcome, ExtractionStatsSnapshot, RecordSink,
    SurveyReport, extract_records, survey_labels,
};
pub use fetcher::{FetchError, FetchedPage, HttpFetcher, PageFetcher};
pub use page_extractor::schema::*;
pub use page_extractor::ParseError;
pub use run_store::{ArtifactError, RunId};
pub use utils::PropertyId;

// Test-accessible modules
pub use fetcher::rate_limiter as crawl_rate_limiter;
