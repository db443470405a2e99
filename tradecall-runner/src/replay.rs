//! Batch replay of captured messages from a JSON Lines file.
//!
//! Each line is one inbound message:
//!
//! ```text
//! {"channel": "Premium jackpot", "timestamp": "2024-01-18T09:20:00+05:30", "text": "BUY #NIFTY ..."}
//! ```
//!
//! Replay can run channels in parallel; messages of one channel are always
//! handled in file order.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::{self, BufRead};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

use tradecall_core::{Outcome, Timestamp};

use crate::dispatch::Dispatcher;

#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("read replay input {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// One message as delivered by the ingestion transport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InboundMessage {
    pub channel: String,
    pub timestamp: Timestamp,
    pub text: String,
}

/// Messages read from a replay file, plus the lines that could not be read.
#[derive(Debug, Clone, Default)]
pub struct ReplayInput {
    pub messages: Vec<InboundMessage>,
    pub malformed_lines: Vec<usize>,
}

/// Read a JSONL file. Blank lines are ignored; malformed lines are logged and
/// reported by 1-based line number.
pub fn read_messages(path: &Path) -> Result<ReplayInput, ReplayError> {
    let io_err = |source: io::Error| ReplayError::Io {
        path: path.to_path_buf(),
        source,
    };
    let file = fs::File::open(path).map_err(io_err)?;
    let mut input = ReplayInput::default();

    for (idx, line) in io::BufReader::new(file).lines().enumerate() {
        let line = line.map_err(io_err)?;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<InboundMessage>(&line) {
            Ok(msg) => input.messages.push(msg),
            Err(e) => {
                warn!(line = idx + 1, error = %e, "skipping malformed replay line");
                input.malformed_lines.push(idx + 1);
            }
        }
    }
    Ok(input)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ChannelTally {
    pub signals: usize,
    pub failures: usize,
}

impl ChannelTally {
    fn add(&mut self, outcome: &Outcome) {
        if outcome.is_signal() {
            self.signals += 1;
        } else {
            self.failures += 1;
        }
    }

    fn merge(&mut self, other: ChannelTally) {
        self.signals += other.signals;
        self.failures += other.failures;
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReplaySummary {
    pub messages: usize,
    pub signals: usize,
    pub failures: usize,
    pub per_channel: BTreeMap<String, ChannelTally>,
}

impl ReplaySummary {
    fn add(&mut self, channel: &str, tally: ChannelTally) {
        self.messages += tally.signals + tally.failures;
        self.signals += tally.signals;
        self.failures += tally.failures;
        self.per_channel
            .entry(channel.to_string())
            .or_default()
            .merge(tally);
    }
}

/// Handle each message through `dispatcher`, returning the outcomes in
/// input order.
pub fn replay(
    dispatcher: &Dispatcher,
    messages: &[InboundMessage],
    parallel: bool,
) -> (Vec<Outcome>, ReplaySummary) {
    let outcomes: Vec<Outcome> = if parallel {
        // group by channel, keep per-channel order, then scatter back
        let mut groups: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
        for (i, msg) in messages.iter().enumerate() {
            groups.entry(msg.channel.as_str()).or_default().push(i);
        }
        let handled: Vec<Vec<(usize, Outcome)>> = groups
            .into_par_iter()
            .map(|(_, indices)| {
                indices
                    .into_iter()
                    .map(|i| {
                        let msg = &messages[i];
                        (i, dispatcher.handle(&msg.channel, msg.timestamp, &msg.text))
                    })
                    .collect()
            })
            .collect();

        let mut ordered: Vec<(usize, Outcome)> = handled.into_iter().flatten().collect();
        ordered.sort_by_key(|(i, _)| *i);
        ordered.into_iter().map(|(_, o)| o).collect()
    } else {
        messages
            .iter()
            .map(|msg| dispatcher.handle(&msg.channel, msg.timestamp, &msg.text))
            .collect()
    };

    let mut summary = ReplaySummary::default();
    for outcome in &outcomes {
        let mut tally = ChannelTally::default();
        tally.add(outcome);
        summary.add(outcome.channel(), tally);
    }
    info!(
        messages = summary.messages,
        signals = summary.signals,
        failures = summary.failures,
        parallel,
        "replay finished"
    );
    (outcomes, summary)
}
