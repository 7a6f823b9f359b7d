//! Collective landing pages

use scraper::Html;

use super::ParseError;
use crate::config::CompiledSelectors;

/// Hrefs of the properties bundled on a collective landing page
///
/// One href per member block: the first link inside it. Blocks without a
/// link are skipped. Hrefs are returned as found, in document order; the
/// caller resolves them against the site base.
///
/// # Errors
///
/// Fails when the page has no member block at all, which a landing page
/// always has.
pub fn parse_collective_members(
    document: &Html,
    selectors: &CompiledSelectors,
) -> Result<Vec<String>, ParseError> {
    let mut blocks = document.select(&selectors.collective_member_block).peekable();
    if blocks.peek().is_none() {
        return Err(ParseError::MissingElement {
            what: "collective member block",
            field: "collective_member_block",
        });
    }

    Ok(blocks
        .filter_map(|block| {
            block
                .select(&selectors.collective_member_link)
                .find_map(|a| a.value().attr("href"))
                .map(str::trim)
                .filter(|href| !href.is_empty())
                .map(str::to_string)
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteSelectors;

    #[test]
    fn one_href_per_block() {
        let html = Html::parse_document(
            r#"<div class="residence-informations-content"><a href="/en/buy/apartment/kirchberg/id-201.html">Lot 1</a><a href="/other">x</a></div>
               <div class="residence-informations-content"><span>sold</span></div>
               <div class="residence-informations-content"><a href="/en/buy/apartment/kirchberg/id-202.html">Lot 2</a></div>"#,
        );
        let selectors = SiteSelectors::default().compile().expect("compile");
        let members = parse_collective_members(&html, &selectors).expect("blocks present");
        assert_eq!(
            members,
            vec![
                "/en/buy/apartment/kirchberg/id-201.html".to_string(),
                "/en/buy/apartment/kirchberg/id-202.html".to_string(),
            ]
        );
    }

    #[test]
    fn page_without_blocks_fails() {
        let html = Html::parse_document("<p>Residence no longer available</p>");
        let selectors = SiteSelectors::default().compile().expect("compile");
        assert!(parse_collective_members(&html, &selectors).is_err());
    }
}
