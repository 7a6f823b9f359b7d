pub mod constants;
pub mod string_utils;
pub mod url_utils;

pub use constants::*;
pub use string_utils::{collapse_whitespace, parse_grouped_integer};
pub use url_utils::{PropertyId, listing_page_url, property_id, resolve_href};
