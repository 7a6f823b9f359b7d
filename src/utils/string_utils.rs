//! Text normalisation helpers for scraped markup
//!
//! Rendered HTML text carries indentation, line breaks and non-breaking
//! spaces from the template. These helpers turn it into the plain strings
//! stored in records and used by the numeric parsers.

/// Trim a text node and collapse every internal whitespace run to one space.
///
/// Non-breaking spaces count as whitespace.
///
/// # Examples
/// ```
/// # use athome_scrape::utils::collapse_whitespace;
/// assert_eq!(collapse_whitespace("\n   Living   area \u{a0}"), "Living area");
/// assert_eq!(collapse_whitespace("   "), "");
/// ```
#[must_use]
pub fn collapse_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for word in text.split_whitespace() {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(word);
    }
    out
}

/// Parse the integer at the start of `text`, ignoring digit-group separators.
///
/// Accepts `,` `.` `'` and the (narrow) no-break spaces as separators, so
/// `"12,345 results"` and `"12\u{202f}345"` both yield `12345`. Returns
/// `None` when the text does not start with a digit.
///
/// # Examples
/// ```
/// # use athome_scrape::utils::parse_grouped_integer;
/// assert_eq!(parse_grouped_integer("12,345 properties for sale"), Some(12345));
/// assert_eq!(parse_grouped_integer("  87 "), Some(87));
/// assert_eq!(parse_grouped_integer("Last"), None);
/// ```
#[must_use]
pub fn parse_grouped_integer(text: &str) -> Option<u64> {
    let mut digits = String::new();
    for c in text.trim_start().chars() {
        match c {
            '0'..='9' => digits.push(c),
            ',' | '.' | '\'' | '\u{a0}' | '\u{202f}' => {}
            _ => break,
        }
    }
    if digits.is_empty() {
        return None;
    }
    digits.parse().ok()
}
