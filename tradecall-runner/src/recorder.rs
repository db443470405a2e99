//! Append-only signal and failure logs.
//!
//! Each log is a CSV file with a fixed column order. A record is serialized
//! completely in memory and handed to the file in one `write_all`, under a
//! per-log mutex, so two threads appending to the same log never interleave
//! partial rows. The header is written when the file is new or empty.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use thiserror::Error;

use tradecall_core::{FailureDiagnostic, Outcome, Signal};

pub const SIGNAL_HEADER: [&str; 8] = [
    "channel_name",
    "timestamp",
    "symbol",
    "ltp_range",
    "target_range",
    "sl",
    "product_type",
    "action",
];

pub const FAILURE_HEADER: [&str; 4] = ["channel_name", "timestamp", "message", "exception"];

/// Separator between values of a price range in one cell.
pub const RANGE_SEPARATOR: &str = " | ";

#[derive(Debug, Error)]
pub enum RecordError {
    #[error("append to {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("encode record for {}: {source}", path.display())]
    Encode {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

/// Destination for parse outcomes.
pub trait OutcomeSink: Send + Sync {
    fn record_signal(&self, signal: &Signal) -> Result<(), RecordError>;

    fn record_failure(&self, failure: &FailureDiagnostic) -> Result<(), RecordError>;

    fn record(&self, outcome: &Outcome) -> Result<(), RecordError> {
        match outcome {
            Outcome::Signal(s) => self.record_signal(s),
            Outcome::Failure(f) => self.record_failure(f),
        }
    }
}

impl<S: OutcomeSink + ?Sized> OutcomeSink for Arc<S> {
    fn record_signal(&self, signal: &Signal) -> Result<(), RecordError> {
        (**self).record_signal(signal)
    }

    fn record_failure(&self, failure: &FailureDiagnostic) -> Result<(), RecordError> {
        (**self).record_failure(failure)
    }
}

pub fn signal_row(signal: &Signal) -> [String; 8] {
    [
        signal.channel().to_string(),
        signal.timestamp().to_rfc3339(),
        signal.trading_symbol().to_string(),
        signal.entry_range().join(RANGE_SEPARATOR),
        signal.target_range().join(RANGE_SEPARATOR),
        signal.stop_loss().to_string(),
        signal
            .product()
            .map(|p| p.as_str().to_string())
            .unwrap_or_default(),
        signal.action().as_str().to_string(),
    ]
}

pub fn failure_row(failure: &FailureDiagnostic) -> [String; 4] {
    [
        failure.channel().to_string(),
        failure.timestamp().to_rfc3339(),
        failure.message().to_string(),
        failure.detail(),
    ]
}

/// One append-only CSV file.
#[derive(Debug)]
struct CsvLog {
    path: PathBuf,
    header: &'static [&'static str],
    lock: Mutex<()>,
}

impl CsvLog {
    fn new(path: PathBuf, header: &'static [&'static str]) -> Self {
        Self {
            path,
            header,
            lock: Mutex::new(()),
        }
    }

    fn io_err(&self, source: io::Error) -> RecordError {
        RecordError::Io {
            path: self.path.clone(),
            source,
        }
    }

    fn encode<I, T>(&self, buf: &mut Vec<u8>, row: I) -> Result<(), RecordError>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<[u8]>,
    {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(buf);
        writer
            .write_record(row)
            .and_then(|()| writer.flush().map_err(csv::Error::from))
            .map_err(|source| RecordError::Encode {
                path: self.path.clone(),
                source,
            })
    }

    fn append<I, T>(&self, row: I) -> Result<(), RecordError>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<[u8]>,
    {
        let mut record = Vec::new();
        self.encode(&mut record, row)?;

        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| self.io_err(e))?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| self.io_err(e))?;

        let is_empty = file.metadata().map_err(|e| self.io_err(e))?.len() == 0;
        let bytes = if is_empty {
            let mut with_header = Vec::new();
            self.encode(&mut with_header, self.header)?;
            with_header.extend_from_slice(&record);
            with_header
        } else {
            record
        };

        file.write_all(&bytes).map_err(|e| self.io_err(e))?;
        file.flush().map_err(|e| self.io_err(e))
    }
}

/// Signal and failure logs on disk.
#[derive(Debug)]
pub struct CsvRecorder {
    signals: CsvLog,
    failures: CsvLog,
}

impl CsvRecorder {
    pub fn new(signals: impl Into<PathBuf>, failures: impl Into<PathBuf>) -> Self {
        Self {
            signals: CsvLog::new(signals.into(), &SIGNAL_HEADER),
            failures: CsvLog::new(failures.into(), &FAILURE_HEADER),
        }
    }

    pub fn signals_path(&self) -> &Path {
        &self.signals.path
    }

    pub fn failures_path(&self) -> &Path {
        &self.failures.path
    }
}

impl OutcomeSink for CsvRecorder {
    fn record_signal(&self, signal: &Signal) -> Result<(), RecordError> {
        self.signals.append(signal_row(signal))
    }

    fn record_failure(&self, failure: &FailureDiagnostic) -> Result<(), RecordError> {
        self.failures.append(failure_row(failure))
    }
}

/// Keeps outcomes in memory. Used by `--dry-run` and tests.
#[derive(Debug, Default)]
pub struct MemoryRecorder {
    signals: Mutex<Vec<Signal>>,
    failures: Mutex<Vec<FailureDiagnostic>>,
}

impl MemoryRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn signals(&self) -> Vec<Signal> {
        self.signals
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn failures(&self) -> Vec<FailureDiagnostic> {
        self.failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl OutcomeSink for MemoryRecorder {
    fn record_signal(&self, signal: &Signal) -> Result<(), RecordError> {
        self.signals
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(signal.clone());
        Ok(())
    }

    fn record_failure(&self, failure: &FailureDiagnostic) -> Result<(), RecordError> {
        self.failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(failure.clone());
        Ok(())
    }
}
