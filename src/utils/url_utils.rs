//! URL helpers for listing pages and property identifiers.

use std::fmt;

use url::Url;

/// Numeric id embedded in a property URL's trailing path segment.
///
/// Identifies one property no matter how many listing pages or collective
/// bundles it appears in, and is the crawl's dedup key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PropertyId(pub u64);

impl fmt::Display for PropertyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Extract the `PropertyId` of a property URL.
///
/// Takes the last non-empty path segment and keeps only its ASCII digits,
/// so `/en/buy/apartment/hesperange/id-7707193.html` yields `7707193`.
/// Returns `None` when that segment holds no digits.
#[must_use]
pub fn property_id(url: &Url) -> Option<PropertyId> {
    let segment = url
        .path_segments()?
        .filter(|s| !s.is_empty())
        .next_back()?;
    let digits: String = segment.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return None;
    }
    digits.parse().ok().map(PropertyId)
}

/// Resolve an `href` found in a page against the site base.
///
/// Relative hrefs (the site's usual form) are joined onto `base`; absolute
/// ones are kept. Fragments are dropped since they never name a different
/// property.
pub fn resolve_href(base: &Url, href: &str) -> Result<Url, url::ParseError> {
    let mut resolved = base.join(href.trim())?;
    resolved.set_fragment(None);
    Ok(resolved)
}

/// Build the URL of search-results page `page` (1-based).
pub fn listing_page_url(
    base: &Url,
    search_path: &str,
    page: u32,
) -> Result<Url, url::ParseError> {
    let mut url = base.join(search_path)?;
    url.query_pairs_mut().append_pair("page", &page.to_string());
    Ok(url)
}
