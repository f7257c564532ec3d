//! Exact running-time and gcd distributions of the Euclidean algorithm.
//!
//! * [`euclid`] runs the algorithm on one pair.
//! * [`one_dim`] tabulates step counts for fixed numerators over every
//!   denominator up to the numerator.
//! * [`two_dim`] tabulates gcd values and step counts over every pair below a
//!   growing threshold, resumably through a [`Checkpoint`].
//! * [`stats`] turns any resulting frequency map into a [`Summary`].

pub mod analysis;
pub mod config;
pub mod constants;
pub mod error;
pub mod euclid;
pub mod frequency;
pub mod one_dim;
pub mod stats;
pub mod two_dim;

pub use error::{AnalysisError, RangeViolation, Result};
pub use euclid::{evaluate, remainder_sequence, StepResult};
pub use frequency::{FrequencyMap, GcdFilter, ThresholdTable};
pub use one_dim::{aggregate_by_numerator, OneDimTables};
pub use stats::{summarize, Summary};
pub use two_dim::{extend, Checkpoint};

// ─── Tests ──────────────────────────────────────────────────────────────────
