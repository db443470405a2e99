use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Call/put designation of a contract. Futures and cash rows carry `None`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum OptionType {
    Call,
    Put,
    None,
}

impl OptionType {
    /// Parse a catalog cell. Unknown codes (e.g. `XX`, blank) map to `None`.
    pub fn from_catalog(code: &str) -> Self {
        Self::from_code(code).unwrap_or(Self::None)
    }

    /// Parse an option-type letter pair as written in an alert (`CE`/`PE`).
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_ascii_uppercase().as_str() {
            "CE" => Some(Self::Call),
            "PE" => Some(Self::Put),
            _ => None,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::Call => "CE",
            Self::Put => "PE",
            Self::None => "",
        }
    }
}

impl fmt::Display for OptionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// One tradable contract from the instrument catalog.
///
/// Immutable once loaded. `trading_symbol` is unique within a catalog; the
/// other fields are not (the same strike exists for several expiries).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InstrumentRecord {
    exchange: String,
    underlying: String,
    option_type: OptionType,
    strike_price: Option<f64>,
    trading_symbol: String,
    expiry_date: Option<NaiveDate>,
}

#[derive(Debug, Error, PartialEq)]
pub enum InstrumentError {
    #[error("instrument row has an empty trading symbol")]
    MissingTradingSymbol,

    #[error("instrument {trading_symbol} has an empty exchange code")]
    MissingExchange { trading_symbol: String },

    #[error("instrument {trading_symbol} has an empty underlying symbol")]
    MissingUnderlying { trading_symbol: String },
}

impl InstrumentRecord {
    /// Build a record, rejecting rows without the identifying fields.
    pub fn new(
        exchange: impl Into<String>,
        underlying: impl Into<String>,
        option_type: OptionType,
        strike_price: Option<f64>,
        trading_symbol: impl Into<String>,
        expiry_date: Option<NaiveDate>,
    ) -> Result<Self, InstrumentError> {
        let trading_symbol = trading_symbol.into().trim().to_string();
        if trading_symbol.is_empty() {
            return Err(InstrumentError::MissingTradingSymbol);
        }
        let exchange = exchange.into().trim().to_string();
        if exchange.is_empty() {
            return Err(InstrumentError::MissingExchange { trading_symbol });
        }
        let underlying = underlying.into().trim().to_string();
        if underlying.is_empty() {
            return Err(InstrumentError::MissingUnderlying { trading_symbol });
        }
        Ok(Self {
            exchange,
            underlying,
            option_type,
            strike_price,
            trading_symbol,
            expiry_date,
        })
    }

    pub fn exchange(&self) -> &str {
        &self.exchange
    }

    pub fn underlying(&self) -> &str {
        &self.underlying
    }

    pub fn option_type(&self) -> OptionType {
        self.option_type
    }

    pub fn strike_price(&self) -> Option<f64> {
        self.strike_price
    }

    pub fn trading_symbol(&self) -> &str {
        &self.trading_symbol
    }

    pub fn expiry_date(&self) -> Option<NaiveDate> {
        self.expiry_date
    }
}
