//! Instrument catalog index.
//!
//! Built once from the exchange contract masters and read-only afterwards.
//! Parsers borrow it through `ParseContext`; a refresh goes through
//! `InstrumentCatalog::reload`, which swaps the whole row set at once.

pub mod source;

use chrono::NaiveDate;
use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

use crate::domain::{InstrumentRecord, OptionType};

pub use source::{discover, read_source, SourceError, REQUIRED_COLUMNS};

/// Fatal catalog errors. Without a catalog no instrument can be resolved.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("no valid catalog source among {attempted} candidate(s)")]
    NoValidSource { attempted: usize },

    #[error("list catalog directory {}: {source}", dir.display())]
    Discover {
        dir: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Optional constraints for `InstrumentCatalog::filter`. Unset fields match anything.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct InstrumentFilter<'a> {
    pub exchange: Option<&'a str>,
    pub underlying: Option<&'a str>,
    pub strike_price: Option<f64>,
    pub option_type: Option<OptionType>,
    pub expiry: Option<NaiveDate>,
}

impl<'a> InstrumentFilter<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn exchange(mut self, exchange: &'a str) -> Self {
        self.exchange = Some(exchange);
        self
    }

    pub fn underlying(mut self, underlying: &'a str) -> Self {
        self.underlying = Some(underlying);
        self
    }

    pub fn strike_price(mut self, strike: f64) -> Self {
        self.strike_price = Some(strike);
        self
    }

    pub fn option_type(mut self, option_type: OptionType) -> Self {
        self.option_type = Some(option_type);
        self
    }

    pub fn expiry(mut self, expiry: NaiveDate) -> Self {
        self.expiry = Some(expiry);
        self
    }

    pub fn matches(&self, rec: &InstrumentRecord) -> bool {
        self.exchange.map_or(true, |ex| rec.exchange() == ex)
            && self.underlying.map_or(true, |sym| rec.underlying() == sym)
            && self
                .strike_price
                .map_or(true, |strike| rec.strike_price() == Some(strike))
            && self.option_type.map_or(true, |ot| rec.option_type() == ot)
            && self.expiry.map_or(true, |exp| rec.expiry_date() == Some(exp))
    }
}

/// In-memory instrument table keyed by trading symbol.
#[derive(Debug, Clone)]
pub struct InstrumentCatalog {
    sources: Vec<PathBuf>,
    records: Vec<InstrumentRecord>,
    by_trading_symbol: HashMap<String, usize>,
    underlyings: BTreeSet<String>,
    fingerprint: String,
}

impl InstrumentCatalog {
    /// Load every source, skipping invalid ones with a warning.
    ///
    /// Fails only when no source could be read.
    pub fn load(sources: &[PathBuf]) -> Result<Self, CatalogError> {
        let mut accepted = Vec::new();
        for path in sources {
            match read_source(path) {
                Ok(rows) => {
                    if rows.skipped_rows > 0 {
                        warn!(
                            path = %path.display(),
                            skipped = rows.skipped_rows,
                            "catalog rows skipped"
                        );
                    }
                    accepted.push(rows);
                }
                Err(e) => warn!(error = %e, "skipping catalog source"),
            }
        }
        if accepted.is_empty() {
            return Err(CatalogError::NoValidSource {
                attempted: sources.len(),
            });
        }

        let mut hasher = blake3::Hasher::new();
        let mut records = Vec::new();
        for rows in accepted {
            hasher.update(&rows.bytes);
            records.extend(rows.records);
        }

        let mut catalog = Self::from_records(records);
        catalog.sources = sources.to_vec();
        catalog.fingerprint = hasher.finalize().to_hex().to_string();
        info!(
            sources = catalog.sources.len(),
            instruments = catalog.len(),
            underlyings = catalog.underlyings.len(),
            fingerprint = %catalog.fingerprint,
            "instrument catalog loaded"
        );
        Ok(catalog)
    }

    /// Discover `*.csv` sources in `dir` (optionally per exchange) and load them.
    pub fn load_dir(dir: &Path, exchanges: &[String]) -> Result<Self, CatalogError> {
        let sources = discover(dir, exchanges).map_err(|source| CatalogError::Discover {
            dir: dir.to_path_buf(),
            source,
        })?;
        Self::load(&sources)
    }

    /// Build a catalog from rows already in memory. Has no sources, so
    /// `reload` is a no-op.
    pub fn from_records(rows: Vec<InstrumentRecord>) -> Self {
        let mut records = Vec::with_capacity(rows.len());
        let mut by_trading_symbol = HashMap::with_capacity(rows.len());
        let mut underlyings = BTreeSet::new();
        let mut hasher = blake3::Hasher::new();

        for rec in rows {
            if by_trading_symbol.contains_key(rec.trading_symbol()) {
                warn!(
                    trading_symbol = rec.trading_symbol(),
                    "duplicate trading symbol in catalog; keeping first row"
                );
                continue;
            }
            hasher.update(rec.trading_symbol().as_bytes());
            hasher.update(b"\n");
            by_trading_symbol.insert(rec.trading_symbol().to_string(), records.len());
            underlyings.insert(rec.underlying().to_string());
            records.push(rec);
        }

        Self {
            sources: Vec::new(),
            records,
            by_trading_symbol,
            underlyings,
            fingerprint: hasher.finalize().to_hex().to_string(),
        }
    }

    /// Re-read the sources the catalog was loaded from and replace the rows.
    ///
    /// On error the current rows are kept. Returns whether the content
    /// fingerprint changed.
    pub fn reload(&mut self) -> Result<bool, CatalogError> {
        if self.sources.is_empty() {
            return Ok(false);
        }
        let fresh = Self::load(&self.sources)?;
        let changed = fresh.fingerprint != self.fingerprint;
        *self = fresh;
        info!(changed, "instrument catalog reloaded");
        Ok(changed)
    }

    /// Records matching `filter`, in source order.
    pub fn filter(&self, filter: &InstrumentFilter<'_>) -> Vec<&InstrumentRecord> {
        self.records.iter().filter(|r| filter.matches(r)).collect()
    }

    /// Nearest-dated record. Records without an expiry sort last; ties keep
    /// the earlier one.
    pub fn earliest_expiry<'r>(records: &[&'r InstrumentRecord]) -> Option<&'r InstrumentRecord> {
        records
            .iter()
            .copied()
            .min_by_key(|r| (r.expiry_date().is_none(), r.expiry_date()))
    }

    pub fn by_trading_symbol(&self, trading_symbol: &str) -> Option<&InstrumentRecord> {
        self.by_trading_symbol
            .get(trading_symbol)
            .map(|&i| &self.records[i])
    }

    /// All distinct underlying symbols.
    pub fn underlyings(&self) -> &BTreeSet<String> {
        &self.underlyings
    }

    pub fn records(&self) -> &[InstrumentRecord] {
        &self.records
    }

    pub fn sources(&self) -> &[PathBuf] {
        &self.sources
    }

    /// BLAKE3 hex digest of the loaded content.
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
