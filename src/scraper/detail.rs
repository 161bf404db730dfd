//! Detail page parser: one `.product` block per test type with its fee.

use crate::model::FeeEntry;
use crate::scraper::error::ScraperError;
use crate::scraper::{parse_selector, select_text};
use scraper::Html;

const PRODUCT_SELECTOR: &str = ".product";
const PRODUCT_TITLE_SELECTOR: &str = ".product-title";
const PRODUCT_PRICE_SELECTOR: &str = ".product-price";

/// Placeholder for a missing test type or price.
pub const UNKNOWN: &str = "Unknown";

/// Extract fee entries in document order. A missing title or price becomes [UNKNOWN].
pub fn parse_detail(html: &str) -> Result<Vec<FeeEntry>, ScraperError> {
    let doc = Html::parse_document(html);
    let product_sel = parse_selector(PRODUCT_SELECTOR)?;
    let title_sel = parse_selector(PRODUCT_TITLE_SELECTOR)?;
    let price_sel = parse_selector(PRODUCT_PRICE_SELECTOR)?;

    let entries = doc
        .select(&product_sel)
        .map(|block| FeeEntry {
            test_type: select_text(block, &title_sel).unwrap_or_else(|| UNKNOWN.to_string()),
            price: select_text(block, &price_sel).unwrap_or_else(|| UNKNOWN.to_string()),
        })
        .collect();
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_products_in_order() -> Result<(), ScraperError> {
        let html = r#"<html><body>
<section class="fees">
  <div class="product"><h4 class="product-title">IELTS Academic</h4><span class="product-price">£190</span></div>
  <div class="product"><h4 class="product-title">IELTS General Training</h4><span class="product-price"> £185 </span></div>
</section></body></html>"#;
        let entries = parse_detail(html)?;
        assert_eq!(
            entries,
            vec![
                FeeEntry {
                    test_type: "IELTS Academic".to_string(),
                    price: "£190".to_string()
                },
                FeeEntry {
                    test_type: "IELTS General Training".to_string(),
                    price: "£185".to_string()
                },
            ]
        );
        Ok(())
    }

    #[test]
    fn missing_title_or_price_is_unknown() -> Result<(), ScraperError> {
        let html = r#"<div class="product"><span class="product-price">£150</span></div>
<div class="product"><h4 class="product-title">Life Skills</h4></div>
<div class="product"></div>"#;
        let entries = parse_detail(html)?;
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].test_type, "Unknown");
        assert_eq!(entries[0].price, "£150");
        assert_eq!(entries[1].test_type, "Life Skills");
        assert_eq!(entries[1].price, "Unknown");
        assert_eq!(entries[2].test_type, "Unknown");
        assert_eq!(entries[2].price, "Unknown");
        Ok(())
    }

    #[test]
    fn duplicate_labels_are_kept() -> Result<(), ScraperError> {
        let html = r#"<div class="product"><p class="product-title">Academic</p><p class="product-price">£180</p></div>
<div class="product"><p class="product-title">Academic</p><p class="product-price">£190</p></div>"#;
        let entries = parse_detail(html)?;
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].price, "£190");
        Ok(())
    }

    #[test]
    fn no_products_is_empty() -> Result<(), ScraperError> {
        assert!(parse_detail("<html><body>Page not found</body></html>")?.is_empty());
        Ok(())
    }
}
