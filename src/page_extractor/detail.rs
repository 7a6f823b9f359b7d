//! Property detail pages

use indexmap::IndexMap;
use scraper::{ElementRef, Html};

use super::ParseError;
use super::schema::CharacteristicRecord;
use super::title::{ParsedTitle, parse_title};
use crate::config::CompiledSelectors;

/// Parsed detail page, before it is accepted as a record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailPage {
    pub title: ParsedTitle,
    pub record: CharacteristicRecord,
}

/// Extract the title pair and the characteristics block of a detail page
///
/// Each label/value pair inside the characteristics container becomes one
/// entry, keyed by the label text. Label and value are trimmed but
/// otherwise kept as the page wrote them. Pairs missing either
/// half, or with an empty label, are ignored. A later duplicate label
/// overwrites the earlier value.
///
/// # Errors
///
/// Fails when the characteristics container is absent. Title fields alone
/// do not make a usable record.
pub fn parse_detail_page(
    document: &Html,
    selectors: &CompiledSelectors,
) -> Result<DetailPage, ParseError> {
    let block = document
        .select(&selectors.characteristics_block)
        .next()
        .ok_or(ParseError::MissingElement {
            what: "characteristics block",
            field: "characteristics_block",
        })?;

    let title = document
        .select(&selectors.detail_title)
        .next()
        .map(|h1| parse_title(&h1.text().collect::<String>()))
        .unwrap_or_default();

    let characteristics = scan_characteristics(block, selectors);

    Ok(DetailPage {
        record: CharacteristicRecord {
            characteristics,
            property_type: title.property_type.clone(),
            locality: title.locality.clone(),
        },
        title,
    })
}

fn scan_characteristics(
    block: ElementRef<'_>,
    selectors: &CompiledSelectors,
) -> IndexMap<String, String> {
    let mut pairs = IndexMap::new();
    for pair in block.select(&selectors.characteristic_pair) {
        let label = pair.select(&selectors.characteristic_label).next();
        let value = pair.select(&selectors.characteristic_value).next();
        let (Some(label), Some(value)) = (label, value) else {
            continue;
        };

        let label: String = label.text().collect();
        let label = label.trim();
        if label.is_empty() {
            continue;
        }
        let value: String = value.text().collect();
        pairs.insert(label.to_string(), value.trim().to_string());
    }
    pairs
}
