//! Dispatch orchestrator: routes a message to its channel parser and
//! records the outcome.
//!
//! `handle()` is total: an unregistered channel becomes a failure with
//! `ParseError::UnroutedChannel`, and a recorder error is logged, never
//! returned. The outcome is handed back to the caller either way.

use std::collections::HashMap;
use std::fmt;
use tracing::{error, info, warn};

use tradecall_core::{
    CatalogError, ChannelParser, FailureDiagnostic, InstrumentCatalog, Outcome, ParseContext,
    ParseError, SymbolResolver, Timestamp,
};

use crate::config::AppConfig;
use crate::recorder::OutcomeSink;

pub struct Dispatcher {
    catalog: InstrumentCatalog,
    resolver: SymbolResolver,
    parsers: HashMap<String, Box<dyn ChannelParser>>,
    recorder: Box<dyn OutcomeSink>,
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut channels: Vec<_> = self.parsers.keys().collect();
        channels.sort();
        f.debug_struct("Dispatcher")
            .field("instruments", &self.catalog.len())
            .field("resolver", &self.resolver)
            .field("channels", &channels)
            .finish_non_exhaustive()
    }
}

impl Dispatcher {
    pub fn new(
        catalog: InstrumentCatalog,
        resolver: SymbolResolver,
        recorder: Box<dyn OutcomeSink>,
    ) -> Self {
        Self {
            catalog,
            resolver,
            parsers: HashMap::new(),
            recorder,
        }
    }

    /// Build from config: resolver cutoff plus one parser per channel.
    pub fn from_config(
        config: &AppConfig,
        catalog: InstrumentCatalog,
        recorder: Box<dyn OutcomeSink>,
    ) -> Self {
        let mut dispatcher = Self::new(catalog, config.resolver.build(), recorder);
        for channel in &config.channels {
            dispatcher.register(channel.name.clone(), channel.parser.build());
        }
        dispatcher
    }

    /// Register `parser` for `channel`, replacing any earlier registration.
    pub fn register(&mut self, channel: impl Into<String>, parser: Box<dyn ChannelParser>) {
        let channel = channel.into();
        if let Some(old) = self.parsers.insert(channel.clone(), parser) {
            warn!(%channel, replaced = old.name(), "channel parser replaced");
        }
    }

    pub fn channels(&self) -> impl Iterator<Item = &str> {
        self.parsers.keys().map(String::as_str)
    }

    pub fn catalog(&self) -> &InstrumentCatalog {
        &self.catalog
    }

    pub fn resolver(&self) -> &SymbolResolver {
        &self.resolver
    }

    /// Parse one message without recording it.
    pub fn evaluate(&self, channel: &str, timestamp: Timestamp, text: &str) -> Outcome {
        match self.parsers.get(channel) {
            Some(parser) => {
                let ctx = ParseContext::new(&self.catalog, &self.resolver);
                parser.get_signal(&ctx, channel, timestamp, text)
            }
            None => {
                warn!(channel, "message on unregistered channel");
                Outcome::Failure(FailureDiagnostic::new(
                    channel,
                    timestamp,
                    text,
                    ParseError::UnroutedChannel {
                        channel: channel.to_string(),
                    },
                ))
            }
        }
    }

    /// Parse one message and record the outcome.
    pub fn handle(&self, channel: &str, timestamp: Timestamp, text: &str) -> Outcome {
        let outcome = self.evaluate(channel, timestamp, text);
        if let Err(e) = self.recorder.record(&outcome) {
            error!(channel, error = %e, "failed to record outcome");
        }
        outcome
    }

    /// Re-read the catalog sources. On error the current catalog stays.
    pub fn reload_catalog(&mut self) -> Result<bool, CatalogError> {
        let changed = self.catalog.reload()?;
        info!(
            changed,
            instruments = self.catalog.len(),
            fingerprint = self.catalog.fingerprint(),
            "dispatcher catalog refreshed"
        );
        Ok(changed)
    }
}
