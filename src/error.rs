//! Typed failures shared by every component of the crate.

use std::io;
use thiserror::Error;

/// Why a numerator list, threshold list or resume point was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RangeViolation {
    #[error("numerator {value} is below 1")]
    NumeratorTooSmall { value: u64 },
    #[error("threshold {value} is below 2")]
    ThresholdTooSmall { value: u64 },
    #[error("value {value} exceeds the largest supported input {max}")]
    ValueTooLarge { value: u64, max: u64 },
    #[error("thresholds must be strictly increasing, but {previous} is followed by {next}")]
    NotIncreasing { previous: u64, next: u64 },
    #[error("threshold sequence is empty")]
    EmptyThresholds,
    #[error("threshold schedule step must be positive")]
    ZeroStep,
    #[error("checkpoint ends at threshold {latest} but the extension starts at {first}")]
    ResumeMismatch { latest: u64, first: u64 },
    #[error("checkpoint was built with gcd filter {stored:?}, not {requested:?}")]
    FilterMismatch {
        stored: Vec<u64>,
        requested: Vec<u64>,
    },
}

/// Errors returned by the aggregators, the statistics and the cache helpers.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("cannot summarize an empty frequency map")]
    EmptyInput,
    #[error("invalid range: {0}")]
    InvalidRange(#[from] RangeViolation),
    #[error("i/o failure: {0}")]
    Io(#[from] io::Error),
    #[error("checkpoint encoding failed: {0}")]
    Encode(#[from] bincode::Error),
    #[error("json encoding failed: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, AnalysisError>;
