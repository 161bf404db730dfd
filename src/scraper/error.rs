//! Shared error type for fetching, parsing, and running a scrape session.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScraperError {
    // HTTP and network
    #[error("Network error: could not reach {url}: {source}")]
    Network { url: String, source: reqwest::Error },

    #[error("Request timed out after {secs}s: {url}")]
    Timeout { url: String, secs: u64 },

    #[error("HTTP {status} when fetching: {url}")]
    HttpStatus { status: u16, url: String },

    #[error("Failed to read response body from {url}: {source}")]
    BodyRead { url: String, source: reqwest::Error },

    // Parsing
    #[error("Invalid selector {selector:?}: {reason}")]
    Selector { selector: String, reason: String },

    // Session
    #[error("No countries selected.")]
    NoCountriesSelected,

    #[error("Scrape session has already run; start a new session.")]
    AlreadyRun,

    #[error("Could not fetch the test-centre listing for {country}: {source}")]
    ListingFetch {
        country: String,
        #[source]
        source: Box<ScraperError>,
    },
}
