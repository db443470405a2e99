//! Catalog source files: discovery and CSV row reading.
//!
//! One CSV per exchange (contract-master layout). Only the six identifying
//! columns are read; any other columns are ignored.

use chrono::NaiveDate;
use serde::Deserialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

use crate::domain::{InstrumentRecord, OptionType};

/// Column headers every catalog source must carry.
pub const REQUIRED_COLUMNS: [&str; 6] = [
    "Exch",
    "Symbol",
    "Option Type",
    "Strike Price",
    "Trading Symbol",
    "Expiry Date",
];

const EXPIRY_FORMATS: [&str; 2] = ["%Y-%m-%d", "%d-%m-%Y"];

/// Why a single source was skipped.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{} is missing required columns: {}", path.display(), missing.join(", "))]
    MissingColumns { path: PathBuf, missing: Vec<String> },

    #[error("parse {}: {source}", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

/// Rows read from one source plus the raw bytes they came from.
#[derive(Debug)]
pub struct SourceRows {
    pub path: PathBuf,
    pub records: Vec<InstrumentRecord>,
    pub skipped_rows: usize,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Deserialize)]
struct RawRow {
    #[serde(rename = "Exch")]
    exchange: String,
    #[serde(rename = "Symbol")]
    underlying: String,
    #[serde(rename = "Option Type", default)]
    option_type: String,
    #[serde(rename = "Strike Price", default)]
    strike_price: String,
    #[serde(rename = "Trading Symbol")]
    trading_symbol: String,
    #[serde(rename = "Expiry Date", default)]
    expiry_date: String,
}

/// List `*.csv` files in `dir`, sorted by name.
///
/// With a non-empty `exchanges` list, only files whose name contains one of
/// the exchange codes are returned (`NFO.csv`, `master_BFO.csv`, ...).
pub fn discover(dir: &Path, exchanges: &[String]) -> io::Result<Vec<PathBuf>> {
    let mut found = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_file() || path.extension().and_then(|e| e.to_str()) != Some("csv") {
            continue;
        }
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default();
        if exchanges.is_empty() || exchanges.iter().any(|ex| name.contains(ex.as_str())) {
            found.push(path);
        }
    }
    found.sort();
    Ok(found)
}

/// Read one catalog source. Rows that cannot form a record are counted and
/// skipped; a missing required column rejects the whole source.
pub fn read_source(path: &Path) -> Result<SourceRows, SourceError> {
    let bytes = fs::read(path).map_err(|source| SourceError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(bytes.as_slice());

    let headers = reader.headers().map_err(|source| SourceError::Csv {
        path: path.to_path_buf(),
        source,
    })?;
    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|col| !headers.iter().any(|h| h == **col))
        .map(|col| col.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(SourceError::MissingColumns {
            path: path.to_path_buf(),
            missing,
        });
    }

    let mut records = Vec::new();
    let mut skipped_rows = 0;
    for (line, row) in reader.deserialize::<RawRow>().enumerate() {
        let parsed = row
            .map_err(|e| e.to_string())
            .and_then(|raw| to_record(raw).map_err(|e| e.to_string()));
        match parsed {
            Ok(record) => records.push(record),
            Err(reason) => {
                debug!(path = %path.display(), row = line + 2, %reason, "skipping catalog row");
                skipped_rows += 1;
            }
        }
    }

    drop(reader);
    Ok(SourceRows {
        path: path.to_path_buf(),
        records,
        skipped_rows,
        bytes,
    })
}

fn to_record(raw: RawRow) -> Result<InstrumentRecord, crate::domain::InstrumentError> {
    InstrumentRecord::new(
        raw.exchange,
        raw.underlying,
        OptionType::from_catalog(&raw.option_type),
        parse_strike(&raw.strike_price),
        raw.trading_symbol,
        parse_expiry(&raw.expiry_date),
    )
}

fn parse_strike(cell: &str) -> Option<f64> {
    let cell = cell.trim();
    if cell.is_empty() {
        return None;
    }
    cell.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parse a catalog expiry cell (`2024-01-25` or `25-01-2024`).
pub fn parse_expiry(cell: &str) -> Option<NaiveDate> {
    let cell = cell.trim();
    // contract masters sometimes append a time component
    let date_part = cell.split_whitespace().next().unwrap_or("");
    EXPIRY_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(date_part, fmt).ok())
}
