//! Parse-pipeline error taxonomy.
//!
//! Every stage of a channel parser returns `Result<_, ParseError>`. The parser
//! boundary (`ChannelParser::get_signal`) turns any error into a
//! `FailureDiagnostic`, so none of these ever reach the orchestrator.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Pipeline stage in which a parse attempt stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Dispatch,
    Tokenize,
    Extract,
    Resolve,
    Classify,
    Validate,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dispatch => "dispatch",
            Self::Tokenize => "tokenize",
            Self::Extract => "extract",
            Self::Resolve => "resolve",
            Self::Classify => "classify",
            Self::Validate => "validate",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Error, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ParseError {
    /// An expected marker or positional segment is absent.
    #[error("tokenization error: {detail}")]
    Tokenization { detail: String },

    /// A required numeric or symbolic field is absent or malformed.
    #[error("field extraction error: {field}: {detail}")]
    FieldExtraction {
        stage: Stage,
        field: String,
        detail: String,
    },

    /// The resolver or the catalog produced no match where that is fatal.
    #[error("resolution error: {detail}")]
    Resolution { detail: String },

    /// No parser is registered for the channel.
    #[error("no parser registered for channel '{channel}'")]
    UnroutedChannel { channel: String },
}

impl ParseError {
    pub fn tokenization(detail: impl Into<String>) -> Self {
        Self::Tokenization { detail: detail.into() }
    }

    /// A field that could not be extracted from the text.
    pub fn field(field: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::FieldExtraction {
            stage: Stage::Extract,
            field: field.into(),
            detail: detail.into(),
        }
    }

    /// A field that was extracted but rejected when building the signal.
    pub fn invalid(field: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::FieldExtraction {
            stage: Stage::Validate,
            field: field.into(),
            detail: detail.into(),
        }
    }

    pub fn resolution(detail: impl Into<String>) -> Self {
        Self::Resolution { detail: detail.into() }
    }

    pub fn stage(&self) -> Stage {
        match self {
            Self::Tokenization { .. } => Stage::Tokenize,
            Self::FieldExtraction { stage, .. } => *stage,
            Self::Resolution { .. } => Stage::Resolve,
            Self::UnroutedChannel { .. } => Stage::Dispatch,
        }
    }

    /// `"<stage>: <cause>"`, the form stored in the failure log.
    pub fn detail(&self) -> String {
        format!("{}: {}", self.stage(), self)
    }
}
