//! Range-alert format ("Premium jackpot").
//!
//! ```text
//! BUY #NIFTY 20000 CE NEAR 120.5 130 TARGET 150 160 170 SL-100
//!     └ symbol segment ┘    └ entry ┘     └ targets + SL ┘
//! ```
//!
//! The underlying is fuzzy-resolved against the catalog (unresolved is
//! fatal) and the nearest-expiry contract for the strike/option is chosen.

use crate::catalog::{InstrumentCatalog, InstrumentFilter};
use crate::domain::{OptionType, ProductType, Signal, SignalDraft, Timestamp};
use crate::error::ParseError;

use super::extract::{digits_after, numbers};
use super::{CancelPolarity, ChannelParser, MarkerTable, ParseContext};

/// `EXIT` sits where `BUY` does in exit alerts, so it delimits the same segment.
pub const MARKERS: MarkerTable = MarkerTable::new(
    "range_alert",
    &["BUY", "EXIT", "ABOVE", "NEAR", "TARGET", "TARGE"],
);

/// Index underlyings traded intraday (`MIS`); everything else is `NRML`.
pub const INDEX_UNDERLYINGS: [&str; 6] = [
    "NIFTY",
    "BANKNIFTY",
    "MIDCPNIFTY",
    "FINNIFTY",
    "SENSEX",
    "BANKEX",
];

/// Underlyings listed on the BSE derivatives segment.
pub const BSE_UNDERLYINGS: [&str; 2] = ["SENSEX", "BANKEX"];

pub const BSE_EXCHANGE: &str = "BFO";
pub const NSE_EXCHANGE: &str = "NFO";

const STOP_LOSS_MARKER: &str = "SL-";

#[derive(Debug, Clone, Copy, Default)]
pub struct RangeAlertParser;

impl RangeAlertParser {
    pub fn new() -> Self {
        Self
    }

    pub fn exchange_for(underlying: &str) -> &'static str {
        if BSE_UNDERLYINGS.contains(&underlying) {
            BSE_EXCHANGE
        } else {
            NSE_EXCHANGE
        }
    }

    pub fn product_for(underlying: &str) -> ProductType {
        if INDEX_UNDERLYINGS.contains(&underlying.to_uppercase().as_str()) {
            ProductType::Mis
        } else {
            ProductType::Nrml
        }
    }
}

/// `SYMBOL STRIKE TYPE` from the first segment.
struct ContractSpec<'t> {
    symbol: &'t str,
    strike: f64,
    option_type: OptionType,
}

fn contract_spec(segment: &str) -> Result<ContractSpec<'_>, ParseError> {
    let head = segment.trim();
    let head = head.strip_prefix('#').unwrap_or(head);
    let tokens: Vec<&str> = head.split_whitespace().collect();
    let &[symbol, strike, option] = tokens.as_slice() else {
        return Err(ParseError::field(
            "symbol",
            format!("expected 'SYMBOL STRIKE TYPE', got '{head}'"),
        ));
    };
    let strike = strike
        .parse::<f64>()
        .ok()
        .filter(|s| s.is_finite())
        .ok_or_else(|| ParseError::field("strike", format!("'{strike}' is not a number")))?;
    let option_type = OptionType::from_code(option)
        .ok_or_else(|| ParseError::field("option_type", format!("'{option}' is not CE or PE")))?;
    Ok(ContractSpec {
        symbol,
        strike,
        option_type,
    })
}

impl ChannelParser for RangeAlertParser {
    fn name(&self) -> &str {
        "range_alert"
    }

    fn parse(
        &self,
        ctx: &ParseContext<'_>,
        channel: &str,
        timestamp: Timestamp,
        text: &str,
    ) -> Result<Signal, ParseError> {
        let segments = MARKERS.segment(text);
        let symbol_segment = segments.get(1, "symbol")?;
        let entry_segment = segments.get(2, "entry range")?;
        let target_segment = segments.get(3, "target")?;

        let contract = contract_spec(symbol_segment)?;
        let entry_range = numbers(entry_segment);
        let before_sl = target_segment.split("SL").next().unwrap_or_default();
        let target_range = numbers(before_sl);
        let stop_loss = digits_after(target_segment, STOP_LOSS_MARKER).ok_or_else(|| {
            ParseError::field("sl", format!("no '{STOP_LOSS_MARKER}' marker in target segment"))
        })?;

        let resolved = ctx
            .resolver
            .resolve(contract.symbol, ctx.catalog.underlyings())
            .ok_or_else(|| {
                ParseError::resolution(format!(
                    "underlying '{}' matches no catalog symbol",
                    contract.symbol
                ))
            })?;
        let exchange = Self::exchange_for(&resolved.symbol);
        let candidates = ctx.catalog.filter(
            &InstrumentFilter::new()
                .exchange(exchange)
                .underlying(&resolved.symbol)
                .strike_price(contract.strike)
                .option_type(contract.option_type),
        );
        let instrument = InstrumentCatalog::earliest_expiry(&candidates).ok_or_else(|| {
            ParseError::resolution(format!(
                "no {exchange} contract for {} {} {}",
                resolved.symbol, contract.strike, contract.option_type
            ))
        })?;

        let product = Self::product_for(contract.symbol);
        let action = CancelPolarity::KeywordMeansCancel.classify(text);

        SignalDraft {
            channel: channel.to_string(),
            timestamp,
            trading_symbol: instrument.trading_symbol().to_string(),
            entry_range,
            target_range,
            stop_loss: stop_loss.to_string(),
            product: Some(product),
            action,
        }
        .validate()
    }
}
