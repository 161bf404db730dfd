//! ieltscrape: CLI scraper for the IELTS test-centre directory, outputting an Excel workbook.

pub mod cli;
pub mod config;
pub mod formats;
pub mod model;
pub mod record;
pub mod scraper;
pub mod session;
pub mod xlsx;

// Re-exports for CLI and consumers.
pub use formats::{write_json, write_records, FormatError, OutputFormat};
pub use model::{CentreListing, CentreRecord, Country, FeeEntry, Fees, COUNTRIES};
pub use record::{assemble, city_from_address};
pub use scraper::{Fetch, HttpClient, HttpClientBuilder, ScraperError};
pub use session::{
    DetailOutcome, ListingFailureBehavior, ProgressEvent, ScrapeOptions, ScrapeSession,
    SessionState,
};
pub use xlsx::{write_xlsx, write_xlsx_file, XlsxError, XLSX_MIME_TYPE};
