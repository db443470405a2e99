//! Channel parsers: turn one channel's alert text into a signal.
//!
//! Every parser runs the same pipeline:
//! tokenize → extract fields → resolve instrument → classify action →
//! validate → emit. Each stage returns `Result<_, ParseError>`; the first
//! error stops the pipeline and `get_signal` turns it into a
//! `FailureDiagnostic`. Parsers hold no catalog state of their own: the
//! catalog and resolver arrive through `ParseContext`.

pub mod extract;
pub mod markers;
pub mod paid_call;
pub mod range_alert;
pub mod sms_style;

use tracing::debug;

use crate::catalog::InstrumentCatalog;
use crate::domain::{Action, FailureDiagnostic, Outcome, Signal, Timestamp};
use crate::error::ParseError;
use crate::resolver::SymbolResolver;

pub use markers::{MarkerTable, Segments, DELIMITER};
pub use paid_call::PaidCallParser;
pub use range_alert::RangeAlertParser;
pub use sms_style::SmsStyleParser;

/// Words that mark an alert as an exit or cancellation.
pub const CANCEL_KEYWORDS: [&str; 3] = ["CANCEL", "EXIT", "BOOK"];

/// Shared, read-only reference data for a parse.
#[derive(Debug, Clone, Copy)]
pub struct ParseContext<'a> {
    pub catalog: &'a InstrumentCatalog,
    pub resolver: &'a SymbolResolver,
}

impl<'a> ParseContext<'a> {
    pub fn new(catalog: &'a InstrumentCatalog, resolver: &'a SymbolResolver) -> Self {
        Self { catalog, resolver }
    }
}

/// How a channel's cancellation keywords map onto an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelPolarity {
    /// Keyword present → `Cancel`, absent → `Buy`.
    KeywordMeansCancel,
    /// Keyword present → `Buy`, absent → `Cancel`.
    KeywordMeansBuy,
}

impl CancelPolarity {
    pub fn classify(&self, text: &str) -> Action {
        let has_keyword = extract::contains_any(text, &CANCEL_KEYWORDS);
        match (self, has_keyword) {
            (Self::KeywordMeansCancel, true) | (Self::KeywordMeansBuy, false) => Action::Cancel,
            (Self::KeywordMeansCancel, false) | (Self::KeywordMeansBuy, true) => Action::Buy,
        }
    }
}

/// A per-channel parsing strategy.
pub trait ChannelParser: Send + Sync {
    /// Parser kind (e.g. `"range_alert"`), not the channel name.
    fn name(&self) -> &str;

    /// Run the pipeline. `channel` is the registered channel name copied
    /// into the result.
    fn parse(
        &self,
        ctx: &ParseContext<'_>,
        channel: &str,
        timestamp: Timestamp,
        text: &str,
    ) -> Result<Signal, ParseError>;

    /// Text stored with a failure. Defaults to the raw message.
    fn failure_text(&self, text: &str) -> String {
        text.to_string()
    }

    /// Parse and fold any error into a `FailureDiagnostic`. Never fails.
    fn get_signal(
        &self,
        ctx: &ParseContext<'_>,
        channel: &str,
        timestamp: Timestamp,
        text: &str,
    ) -> Outcome {
        match self.parse(ctx, channel, timestamp, text) {
            Ok(signal) => {
                debug!(
                    channel,
                    parser = self.name(),
                    symbol = signal.trading_symbol(),
                    action = %signal.action(),
                    "signal extracted"
                );
                Outcome::Signal(signal)
            }
            Err(error) => {
                debug!(
                    channel,
                    parser = self.name(),
                    stage = %error.stage(),
                    %error,
                    "parse failed"
                );
                Outcome::Failure(FailureDiagnostic::new(
                    channel,
                    timestamp,
                    self.failure_text(text),
                    error,
                ))
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use chrono::{DateTime, NaiveDate};

    use crate::catalog::InstrumentCatalog;
    use crate::domain::{InstrumentRecord, OptionType, Timestamp};

    pub fn ts() -> Timestamp {
        DateTime::parse_from_rfc3339("2024-01-18T09:20:00+05:30").unwrap()
    }

    fn row(ex: &str, sym: &str, ot: OptionType, strike: f64, ts: &str, exp: (i32, u32, u32)) -> InstrumentRecord {
        InstrumentRecord::new(ex, sym, ot, Some(strike), ts, NaiveDate::from_ymd_opt(exp.0, exp.1, exp.2))
            .unwrap()
    }

    pub fn catalog() -> InstrumentCatalog {
        use OptionType::{Call, Put};
        InstrumentCatalog::from_records(vec![
            row("NFO", "NIFTY", Call, 20000.0, "NIFTY24FEB20000CE", (2024, 2, 1)),
            row("NFO", "NIFTY", Call, 20000.0, "NIFTY24JAN20000CE", (2024, 1, 25)),
            row("NFO", "NIFTY", Put, 20000.0, "NIFTY24JAN20000PE", (2024, 1, 25)),
            row("NFO", "BANKNIFTY", Call, 45000.0, "BANKNIFTY24JAN45000CE", (2024, 1, 24)),
            row("NFO", "BANKNIFTY", Put, 46000.0, "BANKNIFTY24JAN46000PE", (2024, 1, 24)),
            row("NFO", "BANKNIFTY", Put, 46000.0, "BANKNIFTY24JAN3146000PE", (2024, 1, 31)),
            row("NFO", "RELIANCE", Call, 2600.0, "RELIANCE24JAN2600CE", (2024, 1, 25)),
            row("BFO", "SENSEX", Call, 72000.0, "SENSEX2412672000CE", (2024, 1, 26)),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn polarity_tables() {
        let cancel = CancelPolarity::KeywordMeansCancel;
        let buy = CancelPolarity::KeywordMeansBuy;
        assert_eq!(cancel.classify("EXIT NIFTY"), Action::Cancel);
        assert_eq!(cancel.classify("BUY NIFTY"), Action::Buy);
        assert_eq!(buy.classify("book profits"), Action::Buy);
        assert_eq!(buy.classify("BUY NIFTY"), Action::Cancel);
    }

    #[test]
    fn parsers_are_object_safe_and_thread_safe() {
        fn require<T: Send + Sync + ?Sized>() {}
        require::<dyn ChannelParser>();
        require::<RangeAlertParser>();
        require::<SmsStyleParser>();
        require::<PaidCallParser>();
    }
}
