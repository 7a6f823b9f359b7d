//! Search-results page parsing
//!
//! Turns one results page into owned [`ArticleCard`]s in document order.
//! Deciding what to do with each card (filter, dedup, resolve) is the crawl
//! engine's job; the locality predicate lives here so it can be tested
//! against card markup alone.

use regex::Regex;
use scraper::{ElementRef, Html};
use std::sync::LazyLock;

use super::ParseError;
use crate::config::CompiledSelectors;
use crate::utils::collapse_whitespace;

/// Trailing country qualifier in a locality, e.g. `Thionville (FR)`
static COUNTRY_QUALIFIER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\(\s*([A-Za-z]{2})\s*\)\s*$").expect("COUNTRY_QUALIFIER: hardcoded regex is valid")
});

/// One parsed search-results page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingPage {
    /// 1-based page index
    pub page_index: u32,
    pub cards: Vec<ArticleCard>,
}

/// One entry on a results page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArticleCard {
    /// Locality annotation text, whitespace-collapsed
    pub locality: Option<String>,
    /// Value of a dedicated country element, when the template has one
    pub country: Option<String>,
    pub is_collective: bool,
    /// Href of the card's canonical link; for a collective this is the
    /// bundle's landing page
    pub primary_href: Option<String>,
    /// Landing-page href of a collective card
    pub landing_href: Option<String>,
}

impl ArticleCard {
    /// Href to fetch when resolving a collective card; `None` for an
    /// individual one
    #[must_use]
    pub fn landing(&self) -> Option<&str> {
        if !self.is_collective {
            return None;
        }
        self.landing_href
            .as_deref()
            .or(self.primary_href.as_deref())
    }
}

/// Parse every card of a search-results page
///
/// # Errors
///
/// A results page with no cards at all is markup drift: every page up to
/// the advertised last one carries at least one card.
pub fn parse_listing_page(
    document: &Html,
    page_index: u32,
    selectors: &CompiledSelectors,
) -> Result<ListingPage, ParseError> {
    let cards: Vec<ArticleCard> = document
        .select(&selectors.article_card)
        .map(|card| parse_card(card, selectors))
        .collect();

    if cards.is_empty() {
        return Err(ParseError::MissingElement {
            what: "article card",
            field: "article_card",
        });
    }

    Ok(ListingPage { page_index, cards })
}

fn parse_card(card: ElementRef<'_>, selectors: &CompiledSelectors) -> ArticleCard {
    let locality = card
        .select(&selectors.card_locality)
        .next()
        .map(|el| collapse_whitespace(&el.text().collect::<String>()))
        .filter(|s| !s.is_empty());

    // Schema.org markup may carry the country as `content` on a meta tag
    let country = card
        .select(&selectors.card_country)
        .next()
        .map(|el| match el.value().attr("content") {
            Some(content) => collapse_whitespace(content),
            None => collapse_whitespace(&el.text().collect::<String>()),
        })
        .filter(|s| !s.is_empty());

    let is_collective = card.select(&selectors.collective_marker).next().is_some();

    let primary_href = card
        .select(&selectors.card_link)
        .find_map(|el| el.value().attr("href"))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string);

    let landing_href = if is_collective {
        card.select(&selectors.collective_landing_link)
            .find_map(|el| el.value().attr("href"))
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .or_else(|| primary_href.clone())
    } else {
        None
    };

    ArticleCard {
        locality,
        country,
        is_collective,
        primary_href,
        landing_href,
    }
}

/// Upper-cased two-letter country qualifier at the end of a locality
///
/// ```
/// # use athome_scrape::page_extractor::country_qualifier;
/// assert_eq!(country_qualifier("Thionville (FR)"), Some("FR".to_string()));
/// assert_eq!(country_qualifier("Luxembourg-Belair"), None);
/// ```
#[must_use]
pub fn country_qualifier(locality: &str) -> Option<String> {
    COUNTRY_QUALIFIER
        .captures(locality)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_ascii_uppercase())
}

/// Whether a card advertises a property outside `target_country`
///
/// A dedicated two-letter country element decides when present. Otherwise
/// a trailing `(XX)` qualifier in the locality does. A card with neither is
/// in the target country.
#[must_use]
pub fn is_foreign(card: &ArticleCard, target_country: &str) -> bool {
    let element_code = card
        .country
        .as_deref()
        .map(str::trim)
        .filter(|c| c.len() == 2 && c.chars().all(|ch| ch.is_ascii_alphabetic()))
        .map(str::to_ascii_uppercase);

    let code = element_code.or_else(|| card.locality.as_deref().and_then(country_qualifier));

    match code {
        Some(code) => !code.eq_ignore_ascii_case(target_country),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteSelectors;

    fn card(locality: Option<&str>, country: Option<&str>) -> ArticleCard {
        ArticleCard {
            locality: locality.map(str::to_string),
            country: country.map(str::to_string),
            ..ArticleCard::default()
        }
    }

    #[test]
    fn qualifier_marks_foreign() {
        assert!(is_foreign(&card(Some("Thionville (FR)"), None), "LU"));
        assert!(is_foreign(&card(Some("Arlon ( be )"), None), "LU"));
        assert!(!is_foreign(&card(Some("Esch-sur-Alzette"), None), "LU"));
        assert!(!is_foreign(&card(None, None), "LU"));
    }

    #[test]
    fn target_qualifier_is_not_foreign() {
        assert!(!is_foreign(&card(Some("Mersch (LU)"), None), "LU"));
    }

    #[test]
    fn country_element_wins_over_locality_text() {
        assert!(is_foreign(&card(Some("Belair"), Some("DE")), "LU"));
        assert!(!is_foreign(&card(Some("Perl (DE)"), Some("lu")), "LU"));
    }

    #[test]
    fn unrecognised_country_element_falls_back_to_locality() {
        assert!(is_foreign(&card(Some("Metz (FR)"), Some("France")), "LU"));
    }

    #[test]
    fn parses_individual_and_collective_cards() {
        let html = Html::parse_document(
            r#"<html><body>
            <article>
              <span itemprop="addressLocality">  Belair </span>
              <link itemprop="url" href="/en/buy/apartment/belair/id-100.html">
            </article>
            <article>
              <span itemprop="addressLocality">Kirchberg</span>
              <link itemprop="url" href="/en/new-property/id-200.html">
              <p class="childrenInfos">4 units <a href="/en/new-property/residence/id-200.html">see</a></p>
            </article>
            </body></html>"#,
        );
        let selectors = SiteSelectors::default().compile().expect("compile");
        let page = parse_listing_page(&html, 3, &selectors).expect("cards present");

        assert_eq!(page.page_index, 3);
        assert_eq!(page.cards.len(), 2);
        assert_eq!(page.cards[0].locality.as_deref(), Some("Belair"));
        assert!(!page.cards[0].is_collective);
        assert_eq!(page.cards[0].landing(), None);
        assert!(page.cards[1].is_collective);
        assert_eq!(
            page.cards[1].primary_href.as_deref(),
            Some("/en/new-property/id-200.html")
        );
        assert_eq!(
            page.cards[1].landing(),
            Some("/en/new-property/residence/id-200.html")
        );
    }

    #[test]
    fn empty_results_page_is_drift() {
        let html = Html::parse_document("<html><body><div>No results</div></body></html>");
        let selectors = SiteSelectors::default().compile().expect("compile");
        assert!(matches!(
            parse_listing_page(&html, 1, &selectors),
            Err(ParseError::MissingElement {
                field: "article_card",
                ..
            })
        ));
    }
}
