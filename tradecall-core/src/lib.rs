//! tradecall core: instrument catalog, symbol resolver, channel parsers.
//!
//! This crate contains the message-to-signal extraction engine:
//! - Domain types (instrument records, signals, failure diagnostics)
//! - Instrument catalog index loaded from exchange contract masters
//! - Fuzzy symbol resolver over catalog underlyings
//! - Per-channel parsers sharing one tokenize → extract → resolve →
//!   classify → validate pipeline
//!
//! Recording outcomes and routing messages to parsers live in
//! `tradecall-runner`.

pub mod catalog;
pub mod domain;
pub mod error;
pub mod parsers;
pub mod resolver;

pub use catalog::{CatalogError, InstrumentCatalog, InstrumentFilter};
pub use domain::{
    Action, FailureDiagnostic, InstrumentRecord, OptionType, Outcome, ProductType, Signal,
    SignalDraft, Timestamp,
};
pub use error::{ParseError, Stage};
pub use parsers::{
    ChannelParser, PaidCallParser, ParseContext, RangeAlertParser, SmsStyleParser,
};
pub use resolver::{MatchKind, ResolvedSymbol, SymbolResolver};
