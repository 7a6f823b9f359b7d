//! Result totals from the first search-results page

use scraper::Html;

use super::ParseError;
use crate::config::CompiledSelectors;
use crate::utils::{collapse_whitespace, parse_grouped_integer};

/// What the first results page advertises about the whole search
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchTotals {
    /// Advertised number of results; informational only
    pub total_results: u64,
    /// Index of the last results page, the page loop's bound
    pub last_page: u32,
}

/// Read the advertised result count and last page index
///
/// The count is the leading number of the results header
/// (`"12,345 properties for sale"`); the last page is the text of the
/// pagination control's last link.
///
/// # Errors
///
/// Fails if either element is missing or does not hold a number. Without
/// the last page index a crawl has no bound, so callers treat this as fatal.
pub fn parse_search_totals(
    document: &Html,
    selectors: &CompiledSelectors,
) -> Result<SearchTotals, ParseError> {
    let header = document
        .select(&selectors.total_results)
        .next()
        .ok_or(ParseError::MissingElement {
            what: "result count header",
            field: "total_results",
        })?;
    let header_text = collapse_whitespace(&header.text().collect::<String>());
    let total_results = header_text
        .split(' ')
        .next()
        .and_then(parse_grouped_integer)
        .ok_or_else(|| ParseError::InvalidNumber {
            what: "total result count",
            text: header_text.clone(),
        })?;

    let last = document
        .select(&selectors.last_page)
        .next()
        .ok_or(ParseError::MissingElement {
            what: "last page link",
            field: "last_page",
        })?;
    let last_text = collapse_whitespace(&last.text().collect::<String>());
    let last_page = last_text
        .parse::<u32>()
        .ok()
        .filter(|n| *n > 0)
        .ok_or(ParseError::InvalidNumber {
            what: "last page index",
            text: last_text,
        })?;

    Ok(SearchTotals {
        total_results,
        last_page,
    })
}
