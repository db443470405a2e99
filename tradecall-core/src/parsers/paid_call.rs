//! Paid-call format ("PaidCallPut").
//!
//! ```text
//! #BANKNIFTY 24TH JAN expiry BUY 46000 PE ABV 250-260 TARGET 300 350 SL-200
//! ```
//!
//! The contract is pinned down exactly: underlying, strike, option type and
//! the expiry date written in the message. There is no nearest-expiry
//! fallback. The channel only ever posts entries, so the action is `Buy`.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::catalog::InstrumentFilter;
use crate::domain::{Action, OptionType, Signal, SignalDraft, Timestamp};
use crate::error::ParseError;

use super::extract::{last_digit_run, leading_digits, month_from_abbrev, numeric_run};
use super::{ChannelParser, ParseContext};

pub const DEFAULT_FALLBACK_UNDERLYING: &str = "BANKNIFTY";
pub const DEFAULT_EXCHANGE: &str = "NFO";

const EXPIRY_MARKER: &str = "expiry";
const STOP_LOSS_MARKER: &str = "SL-";
const TARGET_KEYWORD: &str = "TARGET";
const ENTRY_KEYWORD: &str = "ABV";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaidCallParser {
    /// Year used to build the expiry date; messages carry only day and month.
    pub expiry_year: i32,
    /// Underlying used when no `#`-token resolves.
    pub fallback_underlying: String,
    pub exchange: String,
}

impl PaidCallParser {
    pub fn new(expiry_year: i32) -> Self {
        Self {
            expiry_year,
            fallback_underlying: DEFAULT_FALLBACK_UNDERLYING.to_string(),
            exchange: DEFAULT_EXCHANGE.to_string(),
        }
    }

    pub fn with_fallback(mut self, underlying: impl Into<String>) -> Self {
        self.fallback_underlying = underlying.into();
        self
    }

    /// First `#`-prefixed token that resolves, else the fallback underlying.
    pub fn underlying(&self, ctx: &ParseContext<'_>, text: &str) -> String {
        text.split_whitespace()
            .filter_map(|word| word.strip_prefix('#'))
            .find_map(|token| ctx.resolver.resolve(token, ctx.catalog.underlyings()))
            .map(|resolved| resolved.symbol)
            .unwrap_or_else(|| {
                debug!(
                    fallback = %self.fallback_underlying,
                    "no hash-tagged underlying resolved; using fallback"
                );
                self.fallback_underlying.clone()
            })
    }

    /// `... <day> <Mon> expiry ...` → date in `expiry_year`.
    pub fn expiry_date(&self, text: &str) -> Result<NaiveDate, ParseError> {
        let (before, _) = text.split_once(EXPIRY_MARKER).ok_or_else(|| {
            ParseError::tokenization(format!("no '{EXPIRY_MARKER}' marker"))
        })?;
        let tokens: Vec<&str> = before.split_whitespace().collect();
        let &[.., day_token, month_token] = tokens.as_slice() else {
            return Err(ParseError::field(
                "expiry",
                format!("expected '<day> <month>' before '{EXPIRY_MARKER}'"),
            ));
        };
        let day: u32 = last_digit_run(day_token)
            .and_then(|d| d.parse().ok())
            .ok_or_else(|| ParseError::field("expiry_day", format!("no digits in '{day_token}'")))?;
        let month = month_from_abbrev(month_token).ok_or_else(|| {
            ParseError::field(
                "expiry_month",
                format!("'{month_token}' is not a month abbreviation"),
            )
        })?;
        NaiveDate::from_ymd_opt(self.expiry_year, month, day).ok_or_else(|| {
            ParseError::field(
                "expiry",
                format!("{}-{month:02}-{day:02} is not a calendar date", self.expiry_year),
            )
        })
    }
}

/// Strike and option type: the two tokens after the first `BUY`.
fn strike_and_option(tokens: &[&str]) -> Result<(f64, OptionType), ParseError> {
    let at = tokens
        .iter()
        .position(|w| w.eq_ignore_ascii_case("BUY"))
        .ok_or_else(|| ParseError::field("strike", "no 'BUY' keyword"))?;
    let (Some(strike), Some(option)) = (tokens.get(at + 1), tokens.get(at + 2)) else {
        return Err(ParseError::field(
            "strike",
            "'BUY' is not followed by strike and option type",
        ));
    };
    let strike_price = strike
        .parse::<f64>()
        .ok()
        .filter(|s| s.is_finite())
        .ok_or_else(|| ParseError::field("strike", format!("'{strike}' is not a number")))?;
    let option_type = OptionType::from_code(option)
        .ok_or_else(|| ParseError::field("option_type", format!("'{option}' is not CE or PE")))?;
    Ok((strike_price, option_type))
}

fn stop_loss(tokens: &[&str]) -> Result<String, ParseError> {
    tokens
        .iter()
        .map(|w| w.to_uppercase())
        .filter_map(|w| {
            w.strip_prefix(STOP_LOSS_MARKER)
                .map(|rest| leading_digits(rest).to_string())
        })
        .last()
        .ok_or_else(|| {
            ParseError::field("sl", format!("no token starts with '{STOP_LOSS_MARKER}'"))
        })
}

impl ChannelParser for PaidCallParser {
    fn name(&self) -> &str {
        "paid_call"
    }

    fn parse(
        &self,
        ctx: &ParseContext<'_>,
        channel: &str,
        timestamp: Timestamp,
        text: &str,
    ) -> Result<Signal, ParseError> {
        let underlying = self.underlying(ctx, text);
        let expiry = self.expiry_date(text)?;

        let tokens: Vec<&str> = text.split_whitespace().collect();
        let (strike, option_type) = strike_and_option(&tokens)?;
        let stop_loss = stop_loss(&tokens)?;
        let target_range = numeric_run(text, TARGET_KEYWORD)?;
        let entry_range = numeric_run(&text.replace('-', " "), ENTRY_KEYWORD)?;
        if entry_range.is_empty() {
            return Err(ParseError::field(
                "ltp_range",
                format!("no prices after '{ENTRY_KEYWORD}'"),
            ));
        }

        let instrument = ctx
            .catalog
            .filter(
                &InstrumentFilter::new()
                    .exchange(&self.exchange)
                    .underlying(&underlying)
                    .strike_price(strike)
                    .option_type(option_type)
                    .expiry(expiry),
            )
            .into_iter()
            .next()
            .ok_or_else(|| {
                ParseError::resolution(format!(
                    "no {} contract for {underlying} {strike} {option_type} expiring {expiry}",
                    self.exchange
                ))
            })?;

        SignalDraft {
            channel: channel.to_string(),
            timestamp,
            trading_symbol: instrument.trading_symbol().to_string(),
            entry_range,
            target_range,
            stop_loss,
            product: None,
            action: Action::Buy,
        }
        .validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Stage;
    use crate::parsers::testing::{catalog, ts};
    use crate::resolver::SymbolResolver;

    fn run(text: &str) -> Result<Signal, ParseError> {
        let catalog = catalog();
        let resolver = SymbolResolver::default();
        let ctx = ParseContext::new(&catalog, &resolver);
        PaidCallParser::new(2024).parse(&ctx, "PaidCallPut", ts(), text)
    }

    #[test]
    fn exact_contract_with_hyphenated_entry() {
        let s = run("#BANKNIFTY 24TH JAN expiry BUY 46000 PE ABV 250-260 TARGET 300 350 SL-200").unwrap();
        assert_eq!(s.trading_symbol(), "BANKNIFTY24JAN46000PE");
        assert_eq!(s.entry_range(), ["250", "260"]);
        assert_eq!(s.target_range(), ["300", "350"]);
        assert_eq!(s.stop_loss(), "200");
        assert_eq!(s.action(), Action::Buy);
    }

    #[test]
    fn expiry_day_selects_between_weeklies() {
        let s = run("#BANKNIFTY 31ST JAN expiry BUY 46000 PE ABV 250 TARGET 300 SL-200").unwrap();
        assert_eq!(s.trading_symbol(), "BANKNIFTY24JAN3146000PE");
    }

    #[test]
    fn no_hash_token_falls_back_to_default_underlying() {
        let catalog = catalog();
        let resolver = SymbolResolver::default();
        let ctx = ParseContext::new(&catalog, &resolver);
        let parser = PaidCallParser::new(2024);
        assert_eq!(parser.underlying(&ctx, "24 JAN expiry BUY 46000 PE"), "BANKNIFTY");
        assert_eq!(parser.underlying(&ctx, "#ZZZZ #NIFTY 25 JAN expiry"), "NIFTY");

        let s = run("Jackpot 24 JAN expiry BUY 46000 PE ABV 250 TARGET 300 SL-200").unwrap();
        assert_eq!(s.trading_symbol(), "BANKNIFTY24JAN46000PE");
    }

    #[test]
    fn expiry_requires_marker_and_month() {
        let parser = PaidCallParser::new(2024);
        assert_eq!(
            parser.expiry_date("24 JAN BUY").unwrap_err().stage(),
            Stage::Tokenize
        );
        assert!(parser.expiry_date("24 JANUARY expiry").is_err());
        assert!(parser.expiry_date("JAN expiry").is_err());
        assert!(parser.expiry_date("31 FEB expiry").is_err());
        assert_eq!(
            parser.expiry_date("#NIFTY 1ST-25 Jan expiry").unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 25).unwrap()
        );
    }

    #[test]
    fn expiry_year_is_configurable() {
        let parser = PaidCallParser::new(2025);
        assert_eq!(
            parser.expiry_date("30 JAN expiry").unwrap(),
            NaiveDate::from_ymd_opt(2025, 1, 30).unwrap()
        );
        // the 2024 fixture has no 2025 contracts
        let catalog = catalog();
        let resolver = SymbolResolver::default();
        let ctx = ParseContext::new(&catalog, &resolver);
        let err = parser
            .parse(&ctx, "PaidCallPut", ts(), "#BANKNIFTY 24 JAN expiry BUY 46000 PE ABV 250 TARGET 300 SL-200")
            .unwrap_err();
        assert!(matches!(err, ParseError::Resolution { .. }));
    }

    #[test]
    fn only_first_buy_counts() {
        let (strike, ot) = strike_and_option(&["buy", "45000", "CE", "BUY", "46000", "PE"]).unwrap();
        assert_eq!(strike, 45000.0);
        assert_eq!(ot, OptionType::Call);
        assert!(strike_and_option(&["BUY", "45000"]).is_err());
    }

    #[test]
    fn missing_stop_loss_fails() {
        let err = run("#BANKNIFTY 24 JAN expiry BUY 46000 PE ABV 250 TARGET 300").unwrap_err();
        assert!(matches!(err, ParseError::FieldExtraction { ref field, .. } if field == "sl"));
    }

    #[test]
    fn empty_entry_range_fails() {
        let err = run("#BANKNIFTY 24 JAN expiry BUY 46000 PE ABV NOW TARGET 300 SL-200").unwrap_err();
        assert!(matches!(err, ParseError::FieldExtraction { ref field, .. } if field == "ltp_range"));
    }

    #[test]
    fn last_stop_loss_token_wins() {
        assert_eq!(stop_loss(&["SL-180", "trail", "sl-150"]).unwrap(), "150");
        assert!(stop_loss(&["TARGET", "300"]).is_err());
    }

    #[test]
    fn trailing_stop_loss_overrides_first() {
        let s = run("#BANKNIFTY 24TH JAN expiry BUY 46000 PE ABV 250 TARGET 300 SL-200 trail SL-230")
            .unwrap();
        assert_eq!(s.stop_loss(), "230");
        assert_eq!(s.target_range(), ["300"]);
    }
}
