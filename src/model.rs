//! Data model for scraped test centres.
//!
//! Parsers produce [CentreListing] and [FeeEntry]; the record assembler merges them into
//! [CentreRecord], which is what the xlsx and JSON writers consume.

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

/// One selectable country: display name and the 3-letter code used in listing URLs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Country {
    pub name: &'static str,
    pub code: &'static str,
}

/// Countries the directory can be queried for, in display order.
pub const COUNTRIES: [Country; 22] = [
    Country { name: "Albania", code: "alb" },
    Country { name: "Algeria", code: "dza" },
    Country { name: "Argentina", code: "arg" },
    Country { name: "Australia", code: "aus" },
    Country { name: "Austria", code: "aut" },
    Country { name: "Bangladesh", code: "bgd" },
    Country { name: "Brazil", code: "bra" },
    Country { name: "Canada", code: "can" },
    Country { name: "China", code: "chn" },
    Country { name: "France", code: "fra" },
    Country { name: "Germany", code: "deu" },
    Country { name: "India", code: "ind" },
    Country { name: "Italy", code: "ita" },
    Country { name: "Japan", code: "jpn" },
    Country { name: "Malaysia", code: "mys" },
    Country { name: "Nigeria", code: "nga" },
    Country { name: "Pakistan", code: "pak" },
    Country { name: "Philippines", code: "phl" },
    Country { name: "Saudi Arabia", code: "sau" },
    Country { name: "South Africa", code: "zaf" },
    Country { name: "United Kingdom", code: "gbr" },
    Country { name: "United States", code: "usa" },
];

impl Country {
    /// Find a country by display name or 3-letter code, ignoring case and surrounding whitespace.
    pub fn lookup(input: &str) -> Option<Country> {
        let needle = input.trim();
        COUNTRIES
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(needle) || c.code.eq_ignore_ascii_case(needle))
            .copied()
    }
}

/// Summary card from a country's listing page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CentreListing {
    pub name: String,
    pub address: String,
    /// Absolute when the card linked into the directory; otherwise the raw href.
    pub detail_url: Option<String>,
    pub ukvi_approved: bool,
    pub one_skill_retake: bool,
}

/// One product block from a detail page. `price` is the display string as shown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeeEntry {
    pub test_type: String,
    pub price: String,
}

/// Test type to price, in first-insertion order. Re-inserting a key replaces its price.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fees {
    entries: Vec<(String, String)>,
}

impl Fees {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, test_type: impl Into<String>, price: impl Into<String>) {
        let test_type = test_type.into();
        let price = price.into();
        match self.entries.iter_mut().find(|(k, _)| *k == test_type) {
            Some(entry) => entry.1 = price,
            None => self.entries.push((test_type, price)),
        }
    }

    pub fn get(&self, test_type: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == test_type)
            .map(|(_, v)| v.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Single-cell text form: `Academic: £190; General Training: £180`.
    pub fn to_cell_text(&self) -> String {
        self.iter()
            .map(|(k, v)| format!("{}: {}", k, v))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

impl Serialize for Fees {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

/// One exported row. Built by [assemble](crate::record::assemble).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CentreRecord {
    pub country: String,
    pub centre_name: String,
    pub city: String,
    pub address: String,
    pub ukvi_approved: bool,
    pub one_skill_retake: bool,
    /// Detail-page order; duplicates kept.
    pub test_types: Vec<String>,
    pub fees: Fees,
    pub detail_url: Option<String>,
}

impl CentreRecord {
    /// Test types as shown in the spreadsheet: `Academic, General Training`.
    pub fn test_types_text(&self) -> String {
        self.test_types.join(", ")
    }
}
