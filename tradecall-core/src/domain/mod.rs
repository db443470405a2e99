//! Domain types for tradecall

pub mod instrument;
pub mod signal;

pub use instrument::{InstrumentError, InstrumentRecord, OptionType};
pub use signal::{
    is_numeric_token, Action, FailureDiagnostic, Outcome, ProductType, Signal, SignalDraft,
};

/// Receipt time of a message, with the offset it arrived in.
pub type Timestamp = chrono::DateTime<chrono::FixedOffset>;
