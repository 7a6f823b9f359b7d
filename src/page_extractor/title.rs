//! Detail-page title parsing
//!
//! Titles read like `Apartment for sale in Belair`: the first word is the
//! property type and the word after the literal `in` is the locality. This
//! is positional text parsing, so it is kept apart from the page walk.

/// Type and locality read from a detail-page title
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedTitle {
    pub property_type: Option<String>,
    pub locality: Option<String>,
    /// False when the title had no `in` marker (or nothing after it)
    pub has_locality_marker: bool,
}

/// Split a title into property type and locality
///
/// ```
/// # use athome_scrape::page_extractor::parse_title;
/// let title = parse_title("Apartment for sale in Belair");
/// assert_eq!(title.property_type.as_deref(), Some("Apartment"));
/// assert_eq!(title.locality.as_deref(), Some("Belair"));
/// ```
#[must_use]
pub fn parse_title(text: &str) -> ParsedTitle {
    let words: Vec<&str> = text.split_whitespace().collect();
    let property_type = words.first().map(|w| (*w).to_string());

    let locality = words
        .iter()
        .position(|w| *w == "in")
        .and_then(|i| words.get(i + 1))
        .map(|w| (*w).to_string());

    ParsedTitle {
        property_type,
        has_locality_marker: locality.is_some(),
        locality,
    }
}
