//! Output format selection and the JSON writer. The spreadsheet writer lives in [crate::xlsx].

use crate::model::CentreRecord;
use crate::xlsx::{write_xlsx_file, XlsxError};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use thiserror::Error;

/// Output format selector for the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Xlsx,
    Json,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Xlsx => "xlsx",
            OutputFormat::Json => "json",
        }
    }
}

/// Errors from the output writers.
#[derive(Debug, Error)]
pub enum FormatError {
    #[error("Nothing to write: no test centres were collected.")]
    NoRecords,

    #[error("Failed to write output: {path}: {source}")]
    Io {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Xlsx(#[from] XlsxError),
}

/// Write records as a pretty-printed JSON array.
pub fn write_json(records: &[CentreRecord], path: &Path) -> Result<(), FormatError> {
    let io_err = |e: std::io::Error| FormatError::Io {
        path: path.to_path_buf(),
        source: e,
    };
    let file = File::create(path).map_err(io_err)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, records)?;
    writer.write_all(b"\n").map_err(io_err)?;
    writer.flush().map_err(io_err)?;
    Ok(())
}

/// Write records in `format`. An empty record set is refused; there is nothing to offer.
pub fn write_records(
    records: &[CentreRecord],
    format: OutputFormat,
    path: &Path,
) -> Result<(), FormatError> {
    if records.is_empty() {
        return Err(FormatError::NoRecords);
    }
    match format {
        OutputFormat::Xlsx => write_xlsx_file(records, path)?,
        OutputFormat::Json => write_json(records, path)?,
    }
    Ok(())
}
