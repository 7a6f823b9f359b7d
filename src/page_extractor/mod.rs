//! Pure parsers for the site's pages.
//!
//! Every function here takes an already-parsed document (or a piece of text)
//! and returns owned data, with no I/O. When the site changes its markup,
//! the fix lands in one of these functions or in the selector set, never in
//! the controllers that drive them.

// Sub-modules
pub mod collective;
pub mod detail;
pub mod listing;
pub mod schema;
pub mod title;
pub mod totals;

use thiserror::Error;

// Re-exports for public API
pub use collective::parse_collective_members;
pub use detail::{DetailPage, parse_detail_page};
pub use listing::{ArticleCard, ListingPage, country_qualifier, is_foreign, parse_listing_page};
pub use schema::{CharacteristicRecord, LOCALITY_KEY, PROPERTY_TYPE_KEY, RecordTable};
pub use title::{ParsedTitle, parse_title};
pub use totals::{SearchTotals, parse_search_totals};

/// A page did not have the shape the selectors expect
///
/// Always means markup drift (or a page that is not what the caller thought
/// it fetched), never "this property lacks the feature".
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// A selector that must match found nothing
    ///
    /// `field` names the [`SiteSelectors`](crate::config::SiteSelectors)
    /// entry to revisit.
    #[error("No {what} found (selector `{field}` matched nothing)")]
    MissingElement {
        what: &'static str,
        field: &'static str,
    },

    /// An element was found but its text is not the expected number
    #[error("Could not read {what} from '{text}'")]
    InvalidNumber { what: &'static str, text: String },
}
