//! CSS selectors describing the site's markup
//!
//! Every selector the parsers use against the site lives here. The defaults
//! match the site's current templates; when the site changes, an operator
//! can override any of them from a JSON file instead of rebuilding.

use anyhow::{Context, Result, anyhow};
use scraper::Selector;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Raw selector strings, serializable so they can be loaded from JSON.
///
/// Missing keys in a JSON override fall back to the defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteSelectors {
    /// Element whose text starts with the advertised total result count
    pub total_results: String,
    /// Pagination link whose text is the last page index
    pub last_page: String,
    /// One search-result card
    pub article_card: String,
    /// Locality annotation inside a card, e.g. `Thionville (FR)`
    pub card_locality: String,
    /// Dedicated country element inside a card, when the template has one
    pub card_country: String,
    /// Primary link inside a card; read from its `href`
    pub card_link: String,
    /// Marker present only on collective cards
    pub collective_marker: String,
    /// Optional explicit landing-page link of a collective card
    pub collective_landing_link: String,
    /// One bundled-property block on a collective landing page
    pub collective_member_block: String,
    /// Link inside a bundled-property block
    pub collective_member_link: String,
    /// Detail-page title, e.g. `Apartment for sale in Belair`
    pub detail_title: String,
    /// Characteristics container on a detail page
    pub characteristics_block: String,
    /// One label/value pair inside the characteristics container
    pub characteristic_pair: String,
    pub characteristic_label: String,
    pub characteristic_value: String,
}

impl Default for SiteSelectors {
    fn default() -> Self {
        Self {
            total_results: "header.block-alert h2".to_string(),
            last_page: "a.page.last".to_string(),
            article_card: "article".to_string(),
            card_locality: r#"span[itemprop="addressLocality"]"#.to_string(),
            card_country: r#"[itemprop="addressCountry"]"#.to_string(),
            card_link: r#"link[itemprop="url"]"#.to_string(),
            collective_marker: "p.childrenInfos".to_string(),
            collective_landing_link: "p.childrenInfos a[href]".to_string(),
            collective_member_block: "div.residence-informations-content".to_string(),
            collective_member_link: "a[href]".to_string(),
            detail_title: r#"h1[class*="PdpTitle"]"#.to_string(),
            characteristics_block: r#"section.feature[class*="KeyGeneral"]"#.to_string(),
            characteristic_pair: "li.feature-bloc-content-specification-content".to_string(),
            characteristic_label: ".feature-bloc-content-specification-content-name"
                .to_string(),
            characteristic_value: ".feature-bloc-content-specification-content-response"
                .to_string(),
        }
    }
}

impl SiteSelectors {
    /// Load selector overrides from a JSON file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid JSON.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read selectors file {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("Invalid selectors JSON in {}", path.display()))
    }

    /// Compile every selector
    ///
    /// # Errors
    ///
    /// Names the first field whose selector does not parse.
    pub fn compile(&self) -> Result<CompiledSelectors> {
        Ok(CompiledSelectors {
            total_results: compile("total_results", &self.total_results)?,
            last_page: compile("last_page", &self.last_page)?,
            article_card: compile("article_card", &self.article_card)?,
            card_locality: compile("card_locality", &self.card_locality)?,
            card_country: compile("card_country", &self.card_country)?,
            card_link: compile("card_link", &self.card_link)?,
            collective_marker: compile("collective_marker", &self.collective_marker)?,
            collective_landing_link: compile(
                "collective_landing_link",
                &self.collective_landing_link,
            )?,
            collective_member_block: compile(
                "collective_member_block",
                &self.collective_member_block,
            )?,
            collective_member_link: compile(
                "collective_member_link",
                &self.collective_member_link,
            )?,
            detail_title: compile("detail_title", &self.detail_title)?,
            characteristics_block: compile("characteristics_block", &self.characteristics_block)?,
            characteristic_pair: compile("characteristic_pair", &self.characteristic_pair)?,
            characteristic_label: compile("characteristic_label", &self.characteristic_label)?,
            characteristic_value: compile("characteristic_value", &self.characteristic_value)?,
        })
    }
}

fn compile(field: &str, selector: &str) -> Result<Selector> {
    Selector::parse(selector).map_err(|e| anyhow!("Invalid selector for {field} '{selector}': {e}"))
}

/// Compiled form of [`SiteSelectors`], handed to the parsers
#[derive(Debug, Clone)]
pub struct CompiledSelectors {
    pub total_results: Selector,
    pub last_page: Selector,
    pub article_card: Selector,
    pub card_locality: Selector,
    pub card_country: Selector,
    pub card_link: Selector,
    pub collective_marker: Selector,
    pub collective_landing_link: Selector,
    pub collective_member_block: Selector,
    pub collective_member_link: Selector,
    pub detail_title: Selector,
    pub characteristics_block: Selector,
    pub characteristic_pair: Selector,
    pub characteristic_label: Selector,
    pub characteristic_value: Selector,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_compile() {
        assert!(SiteSelectors::default().compile().is_ok());
    }

    #[test]
    fn invalid_selector_names_field() {
        let selectors = SiteSelectors {
            last_page: "a..page".to_string(),
            ..SiteSelectors::default()
        };
        let err = selectors.compile().expect_err("selector should be rejected");
        assert!(err.to_string().contains("last_page"));
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let parsed: SiteSelectors =
            serde_json::from_str(r#"{"article_card": "div.card"}"#).expect("valid JSON");
        assert_eq!(parsed.article_card, "div.card");
        assert_eq!(parsed.last_page, SiteSelectors::default().last_page);
    }
}
