//! Serializable application configuration.
//!
//! A `tradecall.toml` file names the catalog sources, the two log files, the
//! resolver cutoff and the channel → parser registrations:
//!
//! ```toml
//! [catalog]
//! dir = "masters"
//! exchanges = ["NFO", "BFO"]
//!
//! [logs]
//! signals = "logs/signals.csv"
//! failures = "logs/failures.csv"
//!
//! [resolver]
//! cutoff = 0.6
//!
//! [[channels]]
//! name = "PaidCallPut"
//! parser = "paid_call"
//! expiry_year = 2024
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;

use tradecall_core::parsers::paid_call::{DEFAULT_EXCHANGE, DEFAULT_FALLBACK_UNDERLYING};
use tradecall_core::resolver::DEFAULT_CUTOFF;
use tradecall_core::{ChannelParser, PaidCallParser, RangeAlertParser, SmsStyleParser, SymbolResolver};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("serialize config TOML: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("resolver cutoff {0} is outside (0, 1]")]
    InvalidCutoff(f64),

    #[error("channel '{0}' is registered more than once")]
    DuplicateChannel(String),

    #[error("no channels are registered")]
    NoChannels,
}

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    pub catalog: CatalogConfig,
    pub logs: LogConfig,
    #[serde(default)]
    pub resolver: ResolverConfig,
    pub channels: Vec<ChannelConfig>,
}

/// Where the exchange contract masters live.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CatalogConfig {
    pub dir: PathBuf,
    /// Exchange codes matched against source file names. Empty loads every CSV.
    #[serde(default)]
    pub exchanges: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LogConfig {
    pub signals: PathBuf,
    pub failures: PathBuf,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ResolverConfig {
    pub cutoff: f64,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            cutoff: DEFAULT_CUTOFF,
        }
    }
}

impl ResolverConfig {
    pub fn build(&self) -> SymbolResolver {
        SymbolResolver::new(self.cutoff)
    }
}

/// One registered channel and the parser that reads it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChannelConfig {
    pub name: String,
    #[serde(flatten)]
    pub parser: ParserConfig,
}

/// Parser selection (serializable enum).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "parser", rename_all = "snake_case")]
pub enum ParserConfig {
    /// `BUY #SYM STRIKE TYPE NEAR ... TARGET ... SL-n`
    RangeAlert,

    /// `BUY TRADINGSYMBOL ONLY IN RANGE @ ... SL FOR TRADE @ n`
    SmsStyle,

    /// `#SYM <day> <Mon> expiry BUY STRIKE TYPE ABV ... TARGET ... SL-n`
    PaidCall {
        expiry_year: i32,
        #[serde(default = "default_fallback_underlying")]
        fallback_underlying: String,
        #[serde(default = "default_paid_call_exchange")]
        exchange: String,
    },
}

fn default_fallback_underlying() -> String {
    DEFAULT_FALLBACK_UNDERLYING.to_string()
}

fn default_paid_call_exchange() -> String {
    DEFAULT_EXCHANGE.to_string()
}

impl ParserConfig {
    pub fn build(&self) -> Box<dyn ChannelParser> {
        match self {
            Self::RangeAlert => Box::new(RangeAlertParser),
            Self::SmsStyle => Box::new(SmsStyleParser),
            Self::PaidCall {
                expiry_year,
                fallback_underlying,
                exchange,
            } => Box::new(PaidCallParser {
                expiry_year: *expiry_year,
                fallback_underlying: fallback_underlying.clone(),
                exchange: exchange.clone(),
            }),
        }
    }
}

impl AppConfig {
    /// Load and validate a config file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate a config from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let cutoff = self.resolver.cutoff;
        if !(cutoff > 0.0 && cutoff <= 1.0) {
            return Err(ConfigError::InvalidCutoff(cutoff));
        }
        if self.channels.is_empty() {
            return Err(ConfigError::NoChannels);
        }
        let mut seen = HashSet::new();
        for channel in &self.channels {
            if !seen.insert(channel.name.as_str()) {
                return Err(ConfigError::DuplicateChannel(channel.name.clone()));
            }
        }
        Ok(())
    }

    /// The three production channels under their broadcast names.
    pub fn default_channels(expiry_year: i32) -> Self {
        Self {
            catalog: CatalogConfig {
                dir: PathBuf::from("masters"),
                exchanges: vec!["NFO".into(), "BFO".into()],
            },
            logs: LogConfig {
                signals: PathBuf::from("logs/signals.csv"),
                failures: PathBuf::from("logs/failures.csv"),
            },
            resolver: ResolverConfig::default(),
            channels: vec![
                ChannelConfig {
                    name: "Premium jackpot".into(),
                    parser: ParserConfig::RangeAlert,
                },
                ChannelConfig {
                    name: "SmsOptionsPremium".into(),
                    parser: ParserConfig::SmsStyle,
                },
                ChannelConfig {
                    name: "PaidCallPut".into(),
                    parser: ParserConfig::PaidCall {
                        expiry_year,
                        fallback_underlying: default_fallback_underlying(),
                        exchange: default_paid_call_exchange(),
                    },
                },
            ],
        }
    }
}
