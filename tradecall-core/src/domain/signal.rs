//! Parse outcomes: structured signals and failure diagnostics.
//!
//! Both are immutable once built. A parse attempt produces exactly one
//! `Outcome`, which is either a `Signal` or a `FailureDiagnostic`.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::Timestamp;
use crate::error::ParseError;

/// What the downstream execution layer should do with the signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    Buy,
    Cancel,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Buy => "Buy",
            Self::Cancel => "Cancel",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Product/margin category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProductType {
    /// Intraday margin.
    #[serde(rename = "MIS")]
    Mis,
    /// Carry-forward.
    #[serde(rename = "NRML")]
    Nrml,
}

impl ProductType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mis => "MIS",
            Self::Nrml => "NRML",
        }
    }
}

impl fmt::Display for ProductType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unvalidated signal fields as assembled by a parser.
///
/// `validate` is the only way to obtain a `Signal`.
#[derive(Debug, Clone)]
pub struct SignalDraft {
    pub channel: String,
    pub timestamp: Timestamp,
    pub trading_symbol: String,
    pub entry_range: Vec<String>,
    pub target_range: Vec<String>,
    pub stop_loss: String,
    pub product: Option<ProductType>,
    pub action: Action,
}

impl SignalDraft {
    /// Check required fields and freeze the draft into a `Signal`.
    pub fn validate(self) -> Result<Signal, ParseError> {
        let trading_symbol = self.trading_symbol.trim().to_string();
        if trading_symbol.is_empty() {
            return Err(ParseError::invalid("symbol", "trading symbol is empty"));
        }
        if self.stop_loss.is_empty() {
            return Err(ParseError::invalid("sl", "stop-loss is empty"));
        }
        if !is_numeric_token(&self.stop_loss) {
            return Err(ParseError::invalid(
                "sl",
                format!("stop-loss '{}' is not numeric", self.stop_loss),
            ));
        }
        if let Some(bad) = self
            .entry_range
            .iter()
            .chain(self.target_range.iter())
            .find(|v| !is_numeric_token(v))
        {
            return Err(ParseError::invalid(
                "range",
                format!("price '{bad}' is not numeric"),
            ));
        }
        Ok(Signal {
            channel: self.channel,
            timestamp: self.timestamp,
            trading_symbol,
            entry_range: self.entry_range,
            target_range: self.target_range,
            stop_loss: self.stop_loss,
            product: self.product,
            action: self.action,
        })
    }
}

/// ASCII digits with at most one decimal point anywhere (`150`, `160.5`,
/// `.5`, `160.`).
pub fn is_numeric_token(s: &str) -> bool {
    let digits = s.bytes().filter(u8::is_ascii_digit).count();
    let dots = s.bytes().filter(|&b| b == b'.').count();
    digits > 0 && dots <= 1 && digits + dots == s.len()
}

/// A structured, validated trading signal.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Signal {
    channel: String,
    timestamp: Timestamp,
    trading_symbol: String,
    entry_range: Vec<String>,
    target_range: Vec<String>,
    stop_loss: String,
    product: Option<ProductType>,
    action: Action,
}

impl Signal {
    pub fn channel(&self) -> &str {
        &self.channel
    }

    pub fn timestamp(&self) -> Timestamp {
        self.timestamp
    }

    pub fn trading_symbol(&self) -> &str {
        &self.trading_symbol
    }

    /// Entry prices in the order they appeared in the message.
    pub fn entry_range(&self) -> &[String] {
        &self.entry_range
    }

    /// Target prices in the order they appeared in the message.
    pub fn target_range(&self) -> &[String] {
        &self.target_range
    }

    pub fn stop_loss(&self) -> &str {
        &self.stop_loss
    }

    pub fn product(&self) -> Option<ProductType> {
        self.product
    }

    pub fn action(&self) -> Action {
        self.action
    }
}

/// Record of a message that could not be turned into a signal.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailureDiagnostic {
    channel: String,
    timestamp: Timestamp,
    message: String,
    error: ParseError,
}

impl FailureDiagnostic {
    pub fn new(
        channel: impl Into<String>,
        timestamp: Timestamp,
        message: impl Into<String>,
        error: ParseError,
    ) -> Self {
        Self {
            channel: channel.into(),
            timestamp,
            message: message.into(),
            error,
        }
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }

    pub fn timestamp(&self) -> Timestamp {
        self.timestamp
    }

    /// The raw or partially normalized message text.
    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn error(&self) -> &ParseError {
        &self.error
    }

    /// Stage plus cause, as written to the failure log.
    pub fn detail(&self) -> String {
        self.error.detail()
    }
}

/// The single durable result of one parse attempt.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    Signal(Signal),
    Failure(FailureDiagnostic),
}

impl Outcome {
    pub fn is_signal(&self) -> bool {
        matches!(self, Self::Signal(_))
    }

    pub fn signal(&self) -> Option<&Signal> {
        match self {
            Self::Signal(s) => Some(s),
            Self::Failure(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&FailureDiagnostic> {
        match self {
            Self::Signal(_) => None,
            Self::Failure(f) => Some(f),
        }
    }

    pub fn channel(&self) -> &str {
        match self {
            Self::Signal(s) => s.channel(),
            Self::Failure(f) => f.channel(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Stage;
    use chrono::DateTime;

    fn ts() -> Timestamp {
        DateTime::parse_from_rfc3339("2024-01-18T09:20:00+05:30").unwrap()
    }

    fn draft() -> SignalDraft {
        SignalDraft {
            channel: "Premium jackpot".into(),
            timestamp: ts(),
            trading_symbol: "NIFTY24JAN20000CE".into(),
            entry_range: vec!["120.5".into(), "130".into()],
            target_range: vec!["150".into()],
            stop_loss: "100".into(),
            product: Some(ProductType::Mis),
            action: Action::Buy,
        }
    }

    #[test]
    fn valid_draft_becomes_signal() {
        let signal = draft().validate().unwrap();
        assert_eq!(signal.trading_symbol(), "NIFTY24JAN20000CE");
        assert_eq!(signal.entry_range(), ["120.5", "130"]);
        assert_eq!(signal.product(), Some(ProductType::Mis));
    }

    #[test]
    fn empty_stop_loss_is_rejected_at_validate() {
        let mut d = draft();
        d.stop_loss.clear();
        let err = d.validate().unwrap_err();
        assert_eq!(err.stage(), Stage::Validate);
    }

    #[test]
    fn blank_symbol_is_rejected() {
        let mut d = draft();
        d.trading_symbol = "  ".into();
        assert!(d.validate().is_err());
    }

    #[test]
    fn numeric_token_rules() {
        assert!(is_numeric_token("120"));
        assert!(is_numeric_token("130.5"));
        assert!(!is_numeric_token("1.2.3"));
        assert!(is_numeric_token(".5"));
        assert!(is_numeric_token("5."));
        assert!(!is_numeric_token("."));
        assert!(!is_numeric_token("٣٠٠"));
        assert!(!is_numeric_token("SL"));
        assert!(!is_numeric_token(""));
    }

    #[test]
    fn outcome_serializes_with_tag() {
        let outcome = Outcome::Signal(draft().validate().unwrap());
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["outcome"], "signal");
        assert_eq!(json["action"], "Buy");
        assert_eq!(json["product"], "MIS");
    }
}
