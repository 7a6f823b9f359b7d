//! Configuration module for listing crawls and detail extraction
//!
//! This module provides the `ScrapeConfig` struct and its type-safe builder
//! for configuring crawl and extraction runs with validation and sensible
//! defaults.

// Sub-modules
pub mod builder;
pub mod getters;
pub mod selectors;
pub mod types;

// Re-exports for public API
pub use builder::{ScrapeConfigBuilder, WithBaseUrl, WithOutputDir};
pub use selectors::{CompiledSelectors, SiteSelectors};
pub use types::ScrapeConfig;
