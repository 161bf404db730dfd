//! CLI parsing and orchestration. Parses args, resolves countries, runs the scrape session, and writes
//! the spreadsheet (or JSON). Maps errors to exit codes.

use crate::config::{self, Config};
use crate::formats::{write_records, FormatError, OutputFormat};
use crate::model::{Country, COUNTRIES};
use crate::scraper::{HttpClient, HttpClientBuilder, ScraperError, DEFAULT_BASE_URL};
use crate::session::{
    ListingFailureBehavior, ProgressEvent, ScrapeOptions, ScrapeSession, SessionState,
    DEFAULT_DETAIL_DELAY,
};
use crate::xlsx::DEFAULT_FILE_NAME;
use clap::Parser;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

/// CLI error carrying exit code and message.
#[derive(Debug, Error)]
pub enum CliRunError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("{0}")]
    Scraper(#[from] ScraperError),

    #[error("{0}")]
    Format(#[from] FormatError),
}

impl CliRunError {
    pub fn exit_code(&self) -> i32 {
        match self {
            CliRunError::InvalidInput(_) => 1,
            CliRunError::Scraper(_) => 2,
            CliRunError::Format(_) => 3,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "ieltscrape")]
#[command(about = "Scrape IELTS test centres per country and write an Excel workbook")]
#[command(
    after_help = "Config file keys (output_dir, user_agent, base_url, detail_delay_secs, timeout_secs, retry_count, retry_backoff_secs, listing_errors) are read from ./ieltscrape.toml or the user config dir. CLI flags override config."
)]
pub struct Args {
    /// Countries to scrape, by name or 3-letter code (e.g. Albania "South Africa" can).
    pub countries: Vec<String>,

    /// Scrape every known country.
    #[arg(long, conflicts_with = "countries")]
    pub all: bool,

    /// Print the known countries and their codes, then exit.
    #[arg(long)]
    pub list_countries: bool,

    /// Output path. Default: {output_dir}/IELTS_Global_Test_Centres.{ext}.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Output format: xlsx or json.
    #[arg(long, default_value = "xlsx", value_parser = parse_format)]
    pub format: OutputFormat,

    /// When a country's listing page cannot be fetched: skip (default) or abort.
    #[arg(long, value_parser = parse_listing_failure)]
    pub on_listing_error: Option<ListingFailureBehavior>,

    /// HTTP User-Agent (overrides config).
    #[arg(long)]
    pub user_agent: Option<String>,

    /// Pause in seconds after each detail-page fetch (overrides config; default 1).
    #[arg(long)]
    pub delay: Option<u64>,

    /// Request timeout in seconds (overrides config; default 30).
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Site root (overrides config; default https://ielts.org).
    #[arg(long)]
    pub base_url: Option<String>,

    /// Suppress progress output (errors only).
    #[arg(short, long)]
    pub quiet: bool,

    /// Debug logging and verbose error chain.
    #[arg(long)]
    pub verbose: bool,
}

fn parse_format(s: &str) -> Result<OutputFormat, String> {
    match s.to_lowercase().as_str() {
        "xlsx" | "excel" => Ok(OutputFormat::Xlsx),
        "json" => Ok(OutputFormat::Json),
        _ => Err(format!(
            "Invalid --format value: '{}'. Use xlsx or json.",
            s
        )),
    }
}

fn parse_listing_failure(s: &str) -> Result<ListingFailureBehavior, String> {
    match s.to_lowercase().as_str() {
        "skip" => Ok(ListingFailureBehavior::Skip),
        "abort" => Ok(ListingFailureBehavior::Abort),
        _ => Err(format!(
            "Invalid listing error behavior: '{}'. Use skip or abort.",
            s
        )),
    }
}

/// Install the stderr log subscriber. `RUST_LOG` wins over the flag-derived default.
pub fn init_logging(args: &Args) {
    let default = if args.verbose {
        "ieltscrape=debug"
    } else if args.quiet {
        "error"
    } else {
        "ieltscrape=warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}

/// Map the positional arguments (or --all) to countries, in the order given, without repeats.
fn resolve_countries(args: &Args) -> Result<Vec<Country>, CliRunError> {
    if args.all {
        return Ok(COUNTRIES.to_vec());
    }
    let mut selected: Vec<Country> = Vec::with_capacity(args.countries.len());
    for input in &args.countries {
        let country = Country::lookup(input).ok_or_else(|| {
            CliRunError::InvalidInput(format!(
                "Unknown country: '{}'. Known countries: {}.",
                input,
                COUNTRIES
                    .iter()
                    .map(|c| c.name)
                    .collect::<Vec<_>>()
                    .join(", ")
            ))
        })?;
        if !selected.contains(&country) {
            selected.push(country);
        }
    }
    if selected.is_empty() {
        return Err(CliRunError::InvalidInput(
            "No countries selected. Pass one or more country names or codes, or --all (see --list-countries)."
                .to_string(),
        ));
    }
    Ok(selected)
}

/// Default output: the standard workbook name in `output_dir`, extension per format.
fn default_output_path(output_dir: &Path, format: OutputFormat) -> PathBuf {
    output_dir.join(Path::new(DEFAULT_FILE_NAME).with_extension(format.extension()))
}

/// Ensure output path parent exists.
fn validate_output_path(path: &Path) -> Result<(), CliRunError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            return Err(CliRunError::InvalidInput(format!(
                "Cannot write output: {}: parent directory does not exist.",
                path.display()
            )));
        }
    }
    Ok(())
}

fn progress_bar(total: usize) -> indicatif::ProgressBar {
    let bar = indicatif::ProgressBar::new(total as u64);
    if let Ok(style) = indicatif::ProgressStyle::default_bar()
        .template("{spinner} {msg} [{bar:40}] {pos}/{len} countries ({elapsed})")
    {
        bar.set_style(
            style
                .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
                .progress_chars("█▉▊▋▌▍▎▏ "),
        );
    }
    bar.enable_steady_tick(Duration::from_millis(80));
    bar
}

/// HTTP client settings from flags, then config. Unset values keep the builder's defaults.
pub fn client_builder(args: &Args, config: Option<&Config>) -> HttpClientBuilder {
    let mut builder = HttpClient::builder();
    if let Some(secs) = args.timeout.or_else(|| config.and_then(|c| c.timeout_secs)) {
        builder = builder.timeout_secs(secs);
    }
    if let Some(n) = config.and_then(|c| c.retry_count) {
        builder = builder.retry_count(n);
    }
    if let Some(secs) = config.and_then(|c| c.retry_backoff_secs.clone()) {
        builder = builder.retry_backoff_secs(secs);
    }
    let user_agent = args
        .user_agent
        .clone()
        .or_else(|| config.and_then(|c| c.user_agent.clone()));
    if let Some(ua) = user_agent {
        builder = builder.user_agent(ua);
    }
    builder
}

/// Pause after each detail fetch: `--delay`, then `detail_delay_secs`, then [DEFAULT_DETAIL_DELAY].
pub fn detail_delay(args: &Args, config: Option<&Config>) -> Duration {
    args.delay
        .or_else(|| config.and_then(|c| c.detail_delay_secs))
        .map(Duration::from_secs)
        .unwrap_or(DEFAULT_DETAIL_DELAY)
}

/// Entry point for the CLI. Returns Ok(()) on success; Err with exit code and message on failure.
pub fn run(args: &Args) -> Result<(), CliRunError> {
    if args.list_countries {
        for c in COUNTRIES.iter() {
            println!("{}\t{}", c.code, c.name);
        }
        return Ok(());
    }

    let countries = resolve_countries(args)?;
    let config = config::load_config().map_err(CliRunError::InvalidInput)?;

    let effective_output_dir: PathBuf = config
        .as_ref()
        .and_then(|c| c.output_dir.clone())
        .unwrap_or_else(|| PathBuf::from("."));
    let output_path = args
        .output
        .clone()
        .unwrap_or_else(|| default_output_path(&effective_output_dir, args.format));
    validate_output_path(&output_path)?;

    let base_url = args
        .base_url
        .clone()
        .or_else(|| config.as_ref().and_then(|c| c.base_url.clone()))
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
    let listing_failure = match args.on_listing_error {
        Some(b) => b,
        None => match config.as_ref().and_then(|c| c.listing_errors.as_deref()) {
            Some(s) => parse_listing_failure(s).map_err(CliRunError::InvalidInput)?,
            None => ListingFailureBehavior::Skip,
        },
    };

    let mut client = client_builder(args, config.as_ref())
        .build()
        .map_err(|e| CliRunError::InvalidInput(format!("Failed to create HTTP client: {}", e)))?;

    let bar = (!args.quiet).then(|| progress_bar(countries.len()));
    let progress_cb = |event: &ProgressEvent<'_>| {
        let Some(pb) = bar.as_ref() else {
            return;
        };
        match event {
            ProgressEvent::CountryStarted { .. } => pb.set_message(event.status_text()),
            ProgressEvent::CountryFinished { completed, .. } => pb.set_position(*completed as u64),
            ProgressEvent::ListingFailed { .. } | ProgressEvent::CentreScraped { .. } => {}
        }
    };

    let options = ScrapeOptions {
        progress: Some(&progress_cb),
        base_url: &base_url,
        detail_delay: detail_delay(args, config.as_ref()),
        listing_failure,
    };
    let mut session = ScrapeSession::new(&mut client, options);
    let result = session.run(&countries);

    if let Some(pb) = bar.as_ref() {
        pb.disable_steady_tick();
        pb.finish_and_clear();
    }
    let state = result?;

    if !session.listing_failures().is_empty() && !args.quiet {
        let skipped: Vec<&str> = session
            .listing_failures()
            .iter()
            .map(|f| f.country.name)
            .collect();
        eprintln!("Skipped (listing unavailable): {}", skipped.join(", "));
    }

    if state == SessionState::Empty {
        eprintln!("No data found.");
        return Ok(());
    }

    let records = session.into_records();
    write_records(&records, args.format, &output_path)?;

    if !args.quiet {
        eprintln!(
            "Scraped {} test centres across {} countries.",
            records.len(),
            countries.len()
        );
        eprintln!("Wrote {}", output_path.display());
    }
    Ok(())
}
