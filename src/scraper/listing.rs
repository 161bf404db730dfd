//! Listing page parser. One `.test-centre-card` per centre; the card itself is the link to its detail page.

use crate::model::CentreListing;
use crate::scraper::error::ScraperError;
use crate::scraper::{parse_selector, select_text};
use scraper::Html;

const CARD_SELECTOR: &str = ".test-centre-card";
const TITLE_SELECTOR: &str = ".test-centre-card__title";
const ADDRESS_SELECTOR: &str = ".test-centre-card__address";
const DETAIL_PATH_PREFIX: &str = "/test-centres";

const UKVI_MARKER: &str = "UKVI Approved";
const ONE_SKILL_RETAKE_MARKER: &str = "One Skill Retake";

/// Extract every centre card from a listing page. No cards yields an empty vector.
///
/// Missing title or address becomes `""`. Flags are case-sensitive substring tests on the card text.
pub fn parse_listing(html: &str, base_url: &str) -> Result<Vec<CentreListing>, ScraperError> {
    let doc = Html::parse_document(html);
    let card_sel = parse_selector(CARD_SELECTOR)?;
    let title_sel = parse_selector(TITLE_SELECTOR)?;
    let address_sel = parse_selector(ADDRESS_SELECTOR)?;

    let listings = doc
        .select(&card_sel)
        .map(|card| {
            let text: String = card.text().collect();
            CentreListing {
                name: select_text(card, &title_sel).unwrap_or_default(),
                address: select_text(card, &address_sel).unwrap_or_default(),
                detail_url: card
                    .value()
                    .attr("href")
                    .and_then(|href| absolutize_detail_url(href, base_url)),
                ukvi_approved: text.contains(UKVI_MARKER),
                one_skill_retake: text.contains(ONE_SKILL_RETAKE_MARKER),
            }
        })
        .collect();
    Ok(listings)
}

/// Resolve a card href: directory paths are prefixed with `base_url`, anything else passes through.
/// Empty hrefs have no detail page.
pub fn absolutize_detail_url(href: &str, base_url: &str) -> Option<String> {
    if href.is_empty() {
        return None;
    }
    if href.starts_with(DETAIL_PATH_PREFIX) {
        Some(format!("{}{}", base_url.trim_end_matches('/'), href))
    } else {
        Some(href.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scraper::DEFAULT_BASE_URL;

    const LISTING: &str = r#"<!DOCTYPE html><html><body>
<div class="results">
  <a class="test-centre-card" href="/test-centres/123">
    <h3 class="test-centre-card__title"> British Council Tirana </h3>
    <p class="test-centre-card__address">Rruga Ismail Qemali 27, Tirana</p>
    <ul><li>UKVI Approved</li><li>One Skill Retake</li></ul>
  </a>
  <a class="test-centre-card" href="https://partner.example/centre">
    <h3 class="test-centre-card__title">IDP Durres</h3>
    <p class="test-centre-card__address">Durres</p>
    <ul><li>ukvi approved</li></ul>
  </a>
  <div class="test-centre-card">
    <p>No title, no address, no link</p>
  </div>
</div>
</body></html>"#;

    #[test]
    fn parses_cards_in_document_order() -> Result<(), ScraperError> {
        let cards = parse_listing(LISTING, DEFAULT_BASE_URL)?;
        assert_eq!(cards.len(), 3);
        assert_eq!(cards[0].name, "British Council Tirana");
        assert_eq!(cards[0].address, "Rruga Ismail Qemali 27, Tirana");
        assert_eq!(
            cards[0].detail_url.as_deref(),
            Some("https://ielts.org/test-centres/123")
        );
        assert!(cards[0].ukvi_approved);
        assert!(cards[0].one_skill_retake);
        Ok(())
    }

    #[test]
    fn flags_are_case_sensitive() -> Result<(), ScraperError> {
        let cards = parse_listing(LISTING, DEFAULT_BASE_URL)?;
        assert!(!cards[1].ukvi_approved);
        assert!(!cards[1].one_skill_retake);
        Ok(())
    }

    #[test]
    fn external_href_passes_through() -> Result<(), ScraperError> {
        let cards = parse_listing(LISTING, DEFAULT_BASE_URL)?;
        assert_eq!(
            cards[1].detail_url.as_deref(),
            Some("https://partner.example/centre")
        );
        Ok(())
    }

    #[test]
    fn missing_sub_elements_default_to_empty() -> Result<(), ScraperError> {
        let cards = parse_listing(LISTING, DEFAULT_BASE_URL)?;
        assert_eq!(cards[2].name, "");
        assert_eq!(cards[2].address, "");
        assert!(cards[2].detail_url.is_none());
        Ok(())
    }

    #[test]
    fn page_without_cards_is_empty_not_error() -> Result<(), ScraperError> {
        let cards = parse_listing("<html><body><p>No results</p></body></html>", DEFAULT_BASE_URL)?;
        assert!(cards.is_empty());
        Ok(())
    }

    #[test]
    fn absolutize_rules() {
        assert_eq!(
            absolutize_detail_url("/test-centres/123", "https://ielts.org"),
            Some("https://ielts.org/test-centres/123".to_string())
        );
        assert_eq!(
            absolutize_detail_url("/test-centres/123", "http://127.0.0.1:8080/"),
            Some("http://127.0.0.1:8080/test-centres/123".to_string())
        );
        assert_eq!(
            absolutize_detail_url("https://external.example/x", "https://ielts.org"),
            Some("https://external.example/x".to_string())
        );
        assert_eq!(
            absolutize_detail_url("/about", "https://ielts.org"),
            Some("/about".to_string())
        );
        assert_eq!(absolutize_detail_url("", "https://ielts.org"), None);
    }
}
