//! Merges a listing card and its detail-page fees into one exported row.

use crate::model::{CentreListing, CentreRecord, Country, FeeEntry, Fees};

/// City is whatever follows the last comma of the address, trimmed. No comma, no city.
pub fn city_from_address(address: &str) -> String {
    match address.rsplit_once(',') {
        Some((_, city)) => city.trim().to_string(),
        None => String::new(),
    }
}

pub fn assemble(country: &Country, listing: CentreListing, fee_entries: &[FeeEntry]) -> CentreRecord {
    let mut fees = Fees::new();
    let mut test_types = Vec::with_capacity(fee_entries.len());
    for entry in fee_entries {
        fees.insert(entry.test_type.as_str(), entry.price.as_str());
        test_types.push(entry.test_type.clone());
    }
    CentreRecord {
        country: country.name.to_string(),
        city: city_from_address(&listing.address),
        centre_name: listing.name,
        address: listing.address,
        ukvi_approved: listing.ukvi_approved,
        one_skill_retake: listing.one_skill_retake,
        test_types,
        fees,
        detail_url: listing.detail_url,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing(address: &str) -> CentreListing {
        CentreListing {
            name: "Springfield Language School".to_string(),
            address: address.to_string(),
            detail_url: Some("https://ielts.org/test-centres/42".to_string()),
            ukvi_approved: true,
            one_skill_retake: false,
        }
    }

    fn fee(test_type: &str, price: &str) -> FeeEntry {
        FeeEntry {
            test_type: test_type.to_string(),
            price: price.to_string(),
        }
    }

    #[test]
    fn city_after_last_comma() {
        assert_eq!(city_from_address("12 Main St, Springfield"), "Springfield");
        assert_eq!(city_from_address("Unit 4, 12 Main St,  Shelbyville "), "Shelbyville");
        assert_eq!(city_from_address("12 Main St"), "");
        assert_eq!(city_from_address("12 Main St,"), "");
        assert_eq!(city_from_address(""), "");
    }

    #[test]
    fn fees_last_write_wins_test_types_keep_duplicates() {
        let country = Country::lookup("Albania").unwrap();
        let record = assemble(
            &country,
            listing("12 Main St, Springfield"),
            &[fee("Academic", "£180"), fee("Academic", "£190")],
        );
        assert_eq!(record.fees.get("Academic"), Some("£190"));
        assert_eq!(record.fees.len(), 1);
        assert_eq!(record.test_types_text(), "Academic, Academic");
    }

    #[test]
    fn listing_fields_carry_over() {
        let country = Country::lookup("can").unwrap();
        let record = assemble(&country, listing("12 Main St, Springfield"), &[]);
        assert_eq!(record.country, "Canada");
        assert_eq!(record.centre_name, "Springfield Language School");
        assert_eq!(record.city, "Springfield");
        assert_eq!(record.address, "12 Main St, Springfield");
        assert!(record.ukvi_approved);
        assert!(!record.one_skill_retake);
        assert!(record.test_types.is_empty());
        assert!(record.fees.is_empty());
        assert_eq!(
            record.detail_url.as_deref(),
            Some("https://ielts.org/test-centres/42")
        );
    }
}
