//! Error taxonomy for the engine.
//!
//! Only structurally malformed input is fatal. Every data-quality or
//! statistical-power problem is carried as a [`Flag`] on the output instead.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Fatal errors that abort a run before any stage executes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// Structurally malformed input (bad confidence, unparseable timestamp, empty event set).
    #[error("INPUT_MALFORMED: {reason}")]
    InputMalformed { reason: String },

    /// A configuration that violates its own invariants.
    #[error("invalid configuration: {reason}")]
    InvalidConfig { reason: String },
}

impl EngineError {
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::InputMalformed {
            reason: reason.into(),
        }
    }

    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            reason: reason.into(),
        }
    }
}

/// Errors raised by a sentiment classification collaborator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SentimentError {
    #[error("CLASSIFICATION_UNAVAILABLE: {0}")]
    ClassificationUnavailable(String),
}

/// Errors raised by a market data collaborator.
#[derive(Error, Debug)]
pub enum MarketDataError {
    /// No data could be obtained for the symbol.
    #[error("market data unavailable for {symbol}: {reason}")]
    Unavailable { symbol: String, reason: String },

    /// Data was obtained but could not be parsed.
    #[error("failed to parse market data for {symbol}: {reason}")]
    Parse { symbol: String, reason: String },
}

/// Non-fatal degradation attached to a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Flag {
    /// A price point could not be resolved.
    DataUnavailable,
    /// Sample too small for the claim; numbers reported, claim not conclusive.
    InsufficientSample,
    /// A test assumption (e.g. normality) did not hold.
    StatisticalAssumptionViolated,
    /// A budgeted computation stopped early.
    TimeoutPartial,
}

impl Flag {
    /// Returns a human-readable description of the flag.
    #[must_use]
    pub const fn description(&self) -> &'static str {
        match self {
            Self::DataUnavailable => "Price data unavailable for this point",
            Self::InsufficientSample => "Flagged, not conclusive: sample below minimum",
            Self::StatisticalAssumptionViolated => "Test assumption violated; see warnings",
            Self::TimeoutPartial => "Computation truncated by its budget",
        }
    }
}
