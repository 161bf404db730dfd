//! Scrape session: walks the selected countries, fetches the listing page for each, then each centre's
//! detail page, and collects one [CentreRecord] per card.
//!
//! The session does no rendering. Progress is reported through [ScrapeOptions::progress]; the caller
//! decides what to show and what to do with the records once the session reaches a terminal state.

use crate::model::{CentreRecord, Country, FeeEntry};
use crate::record::assemble;
use crate::scraper::detail::parse_detail;
use crate::scraper::listing::parse_listing;
use crate::scraper::{listing_url, Fetch, ScraperError, DEFAULT_BASE_URL};
use std::time::Duration;

/// Default pause after each detail-page fetch.
pub const DEFAULT_DETAIL_DELAY: Duration = Duration::from_secs(1);

/// Lifecycle of a session. `Completed`, `Empty`, and `Aborted` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Running,
    /// Finished with at least one record.
    Completed,
    /// Finished with no records.
    Empty,
    /// Stopped by a listing failure under [ListingFailureBehavior::Abort].
    Aborted,
}

/// What to do when a country's listing page cannot be fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingFailureBehavior {
    /// Log, remember the failure, and continue with the next country (default).
    Skip,
    /// Stop the session and return the error.
    Abort,
}

/// Result of the detail step for one centre.
#[derive(Debug)]
pub enum DetailOutcome {
    /// The card had no link; nothing was fetched.
    NoLink,
    Fetched(Vec<FeeEntry>),
    /// Fetch failed. The record is still kept, with no test types or fees.
    Failed(ScraperError),
}

impl DetailOutcome {
    fn fee_entries(&self) -> &[FeeEntry] {
        match self {
            DetailOutcome::Fetched(entries) => entries.as_slice(),
            DetailOutcome::NoLink | DetailOutcome::Failed(_) => &[],
        }
    }
}

/// Events emitted while a session runs, in order.
#[derive(Debug)]
pub enum ProgressEvent<'a> {
    CountryStarted {
        country: &'a Country,
        /// Zero-based position in the selection.
        index: usize,
        total: usize,
    },
    ListingFailed {
        country: &'a Country,
        error: &'a ScraperError,
    },
    CentreScraped {
        country: &'a Country,
        record: &'a CentreRecord,
        detail: &'a DetailOutcome,
    },
    CountryFinished {
        country: &'a Country,
        centres: usize,
        completed: usize,
        total: usize,
    },
}

impl ProgressEvent<'_> {
    /// Human-readable status line for this event.
    pub fn status_text(&self) -> String {
        match self {
            ProgressEvent::CountryStarted { country, .. } => {
                format!("Scraping test centres for {}...", country.name)
            }
            ProgressEvent::ListingFailed { country, error } => {
                format!("Skipping {}: {}", country.name, error)
            }
            ProgressEvent::CentreScraped { record, .. } => {
                format!("Scraped {}", record.centre_name)
            }
            ProgressEvent::CountryFinished {
                country, centres, ..
            } => format!("{}: {} test centre(s)", country.name, centres),
        }
    }
}

/// Fraction of countries completed, 0.0 to 1.0.
pub fn progress_fraction(completed: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    completed as f64 / total as f64
}

/// Options for a session run: progress callback, site root, detail pause, listing-failure handling.
pub struct ScrapeOptions<'a> {
    pub progress: Option<&'a dyn Fn(&ProgressEvent<'_>)>,
    pub base_url: &'a str,
    pub detail_delay: Duration,
    pub listing_failure: ListingFailureBehavior,
}

impl Default for ScrapeOptions<'_> {
    fn default() -> Self {
        Self {
            progress: None,
            base_url: DEFAULT_BASE_URL,
            detail_delay: DEFAULT_DETAIL_DELAY,
            listing_failure: ListingFailureBehavior::Skip,
        }
    }
}

/// A listing page that could not be fetched under [ListingFailureBehavior::Skip].
#[derive(Debug)]
pub struct CountryFailure {
    pub country: Country,
    pub error: ScraperError,
}

/// One scrape run. Create, call [run](ScrapeSession::run) once, then read the records.
pub struct ScrapeSession<'a> {
    fetcher: &'a mut dyn Fetch,
    options: ScrapeOptions<'a>,
    state: SessionState,
    records: Vec<CentreRecord>,
    listing_failures: Vec<CountryFailure>,
    detail_failures: usize,
    completed: usize,
    total: usize,
}

impl<'a> ScrapeSession<'a> {
    pub fn new(fetcher: &'a mut dyn Fetch, options: ScrapeOptions<'a>) -> Self {
        Self {
            fetcher,
            options,
            state: SessionState::Idle,
            records: Vec::new(),
            listing_failures: Vec::new(),
            detail_failures: 0,
            completed: 0,
            total: 0,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Records collected so far, in scrape order.
    pub fn records(&self) -> &[CentreRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<CentreRecord> {
        self.records
    }

    pub fn listing_failures(&self) -> &[CountryFailure] {
        &self.listing_failures
    }

    /// Number of centres whose detail page could not be fetched.
    pub fn detail_failures(&self) -> usize {
        self.detail_failures
    }

    pub fn progress(&self) -> f64 {
        progress_fraction(self.completed, self.total)
    }

    /// Scrape every country in selection order and return the terminal state.
    ///
    /// Detail failures never stop the run. Listing failures follow [ScrapeOptions::listing_failure].
    pub fn run(&mut self, countries: &[Country]) -> Result<SessionState, ScraperError> {
        if self.state != SessionState::Idle {
            return Err(ScraperError::AlreadyRun);
        }
        if countries.is_empty() {
            return Err(ScraperError::NoCountriesSelected);
        }
        self.state = SessionState::Running;
        self.total = countries.len();

        for (index, country) in countries.iter().enumerate() {
            self.emit(&ProgressEvent::CountryStarted {
                country,
                index,
                total: self.total,
            });
            tracing::info!(country = country.name, "scraping test centres");

            let centres = match self.scrape_country(country) {
                Ok(n) => n,
                Err(error) => match self.options.listing_failure {
                    ListingFailureBehavior::Abort => {
                        self.state = SessionState::Aborted;
                        return Err(ScraperError::ListingFetch {
                            country: country.name.to_string(),
                            source: Box::new(error),
                        });
                    }
                    ListingFailureBehavior::Skip => {
                        tracing::warn!(country = country.name, error = %error, "listing fetch failed; skipping country");
                        self.emit(&ProgressEvent::ListingFailed {
                            country,
                            error: &error,
                        });
                        self.listing_failures.push(CountryFailure {
                            country: *country,
                            error,
                        });
                        0
                    }
                },
            };

            self.completed += 1;
            self.emit(&ProgressEvent::CountryFinished {
                country,
                centres,
                completed: self.completed,
                total: self.total,
            });
        }

        self.state = if self.records.is_empty() {
            SessionState::Empty
        } else {
            SessionState::Completed
        };
        tracing::info!(
            records = self.records.len(),
            countries = self.total,
            detail_failures = self.detail_failures,
            "scrape finished"
        );
        Ok(self.state)
    }

    /// Listing fetch plus one detail fetch per card. Only the listing fetch can fail.
    fn scrape_country(&mut self, country: &Country) -> Result<usize, ScraperError> {
        let url = listing_url(self.options.base_url, country.code);
        let html = self.fetcher.fetch(&url)?;
        let listings = parse_listing(&html, self.options.base_url)?;
        tracing::debug!(country = country.name, cards = listings.len(), "parsed listing");

        let count = listings.len();
        for listing in listings {
            let detail = match listing.detail_url.as_deref() {
                Some(detail_url) => self.scrape_detail(detail_url),
                None => DetailOutcome::NoLink,
            };
            if let DetailOutcome::Failed(e) = &detail {
                self.detail_failures += 1;
                tracing::warn!(centre = %listing.name, error = %e, "detail page unavailable; recording centre without fees");
            }
            let record = assemble(country, listing, detail.fee_entries());
            self.emit(&ProgressEvent::CentreScraped {
                country,
                record: &record,
                detail: &detail,
            });
            self.records.push(record);
        }
        Ok(count)
    }

    fn scrape_detail(&mut self, url: &str) -> DetailOutcome {
        let outcome = match self.fetcher.fetch(url).and_then(|html| parse_detail(&html)) {
            Ok(entries) => DetailOutcome::Fetched(entries),
            Err(e) => DetailOutcome::Failed(e),
        };
        if !self.options.detail_delay.is_zero() {
            std::thread::sleep(self.options.detail_delay);
        }
        outcome
    }

    fn emit(&self, event: &ProgressEvent<'_>) {
        if let Some(cb) = self.options.progress {
            cb(event);
        }
    }
}
