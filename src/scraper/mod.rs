//! Fetching and parsing of the test-centre directory: HTTP client, listing pages, detail pages.

mod client;
mod error;

pub mod detail;
pub mod listing;

pub use client::{HttpClient, HttpClientBuilder};
pub use error::ScraperError;

use scraper::{ElementRef, Selector};

/// Site root used to build listing URLs and absolutize detail links.
pub const DEFAULT_BASE_URL: &str = "https://ielts.org";

/// Source of page markup. Implemented by [HttpClient]; tests drive the session with in-memory pages.
///
/// `Err` means "no data available" for that URL. Callers decide whether that is fatal.
pub trait Fetch {
    fn fetch(&mut self, url: &str) -> Result<String, ScraperError>;
}

/// Listing page URL for one country code.
pub fn listing_url(base_url: &str, code: &str) -> String {
    format!("{}/test-centres?country={}", base_url.trim_end_matches('/'), code)
}

/// Parse a CSS selector or return a parse error (avoids panics from Selector::parse).
pub(crate) fn parse_selector(sel: &str) -> Result<Selector, ScraperError> {
    Selector::parse(sel).map_err(|e| ScraperError::Selector {
        selector: sel.to_string(),
        reason: e.to_string(),
    })
}

/// Text of an element with each text node trimmed, empty nodes dropped, and the rest joined.
pub(crate) fn stripped_text(el: ElementRef<'_>) -> String {
    el.text().map(str::trim).filter(|s| !s.is_empty()).collect()
}

/// Stripped text of the first descendant matching `sel`, if any.
pub(crate) fn select_text(el: ElementRef<'_>, sel: &Selector) -> Option<String> {
    el.select(sel).next().map(stripped_text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;

    #[test]
    fn listing_url_trims_trailing_slash() {
        assert_eq!(
            listing_url("https://ielts.org/", "alb"),
            "https://ielts.org/test-centres?country=alb"
        );
        assert_eq!(
            listing_url(DEFAULT_BASE_URL, "can"),
            "https://ielts.org/test-centres?country=can"
        );
    }

    #[test]
    fn stripped_text_joins_trimmed_nodes() -> Result<(), ScraperError> {
        let doc = Html::parse_fragment("<h3>  British <span> Council </span>\n Tirana </h3>");
        let sel = parse_selector("h3")?;
        let h3 = doc.select(&sel).next().expect("h3 present");
        assert_eq!(stripped_text(h3), "BritishCouncilTirana");
        Ok(())
    }

    #[test]
    fn invalid_selector_is_an_error() {
        assert!(matches!(
            parse_selector("div[["),
            Err(ScraperError::Selector { .. })
        ));
    }
}
