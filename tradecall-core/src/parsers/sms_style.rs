//! SMS-style format ("SmsOptionsPremium").
//!
//! ```text
//! BUY NIFTY24JAN20000CE ONLY IN RANGE @ 120-130 TARGET 150 160 SL FOR TRADE @ 100
//! ```
//!
//! The trading symbol is taken literally, without catalog lookup. The
//! channel phrases its alerts so that a message *without* any cancellation
//! keyword is a cancel; that polarity is kept as the channel defines it.

use crate::domain::{Signal, SignalDraft, Timestamp};
use crate::error::ParseError;

use super::extract::{leading_digits, numbers, numeric_run};
use super::{CancelPolarity, ChannelParser, MarkerTable, ParseContext};

pub const MARKERS: MarkerTable = MarkerTable::new(
    "sms_style",
    &["BUY", "ONLY IN RANGE @", "TARGET", "SL FOR TRADE @ "],
);

pub const POLARITY: CancelPolarity = CancelPolarity::KeywordMeansBuy;

#[derive(Debug, Clone, Copy, Default)]
pub struct SmsStyleParser;

impl SmsStyleParser {
    pub fn new() -> Self {
        Self
    }

    fn normalize(text: &str) -> String {
        text.trim().to_uppercase()
    }
}

impl ChannelParser for SmsStyleParser {
    fn name(&self) -> &str {
        "sms_style"
    }

    fn parse(
        &self,
        _ctx: &ParseContext<'_>,
        channel: &str,
        timestamp: Timestamp,
        text: &str,
    ) -> Result<Signal, ParseError> {
        let statement = Self::normalize(text);
        let segments = MARKERS.segment(&statement);
        let symbol = segments.get(1, "symbol")?.trim();
        let entry_segment = segments.get(2, "entry range")?;
        let sl_segment = segments.get(4, "stop-loss")?;

        let entry_range = numbers(entry_segment);
        let target_range = numeric_run(&statement, "TARGET")?;
        let stop_loss = leading_digits(sl_segment);
        if stop_loss.is_empty() {
            return Err(ParseError::field(
                "sl",
                format!("no digits after stop-loss marker in '{}'", sl_segment.trim()),
            ));
        }

        let action = POLARITY.classify(text);

        SignalDraft {
            channel: channel.to_string(),
            timestamp,
            trading_symbol: symbol.to_string(),
            entry_range,
            target_range,
            stop_loss: stop_loss.to_string(),
            product: None,
            action,
        }
        .validate()
    }

    /// The upper-cased statement with markers replaced by the delimiter.
    fn failure_text(&self, text: &str) -> String {
        MARKERS.segment(&Self::normalize(text)).delimited().to_string()
    }
}
