//! tradecall runner: channel dispatch, outcome logs, configuration, replay.
//!
//! This crate builds on `tradecall-core` to provide:
//! - TOML configuration with channel → parser registrations
//! - Append-only CSV signal and failure logs
//! - The dispatch orchestrator that routes messages and records outcomes
//! - JSONL batch replay with per-channel parallelism

pub mod config;
pub mod dispatch;
pub mod recorder;
pub mod replay;

pub use config::{AppConfig, CatalogConfig, ChannelConfig, ConfigError, LogConfig, ParserConfig};
pub use dispatch::Dispatcher;
pub use recorder::{CsvRecorder, MemoryRecorder, OutcomeSink, RecordError};
pub use replay::{read_messages, replay, ChannelTally, InboundMessage, ReplayError, ReplaySummary};

#[cfg(test)]
mod send_sync_checks {
    use super::*;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn dispatcher_is_send_sync() {
        assert_send::<Dispatcher>();
        assert_sync::<Dispatcher>();
    }

    #[test]
    fn recorders_are_send_sync() {
        assert_send::<CsvRecorder>();
        assert_sync::<CsvRecorder>();
        assert_send::<MemoryRecorder>();
        assert_sync::<MemoryRecorder>();
    }
}
