//! Run configuration for the CLI: which gcd filter, which thresholds, which
//! numerators. Read from an optional JSON file; command-line values win.

use crate::error::{RangeViolation, Result};
use crate::frequency::GcdFilter;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// How the thresholds of a two-dimensional run are chosen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ThresholdSchedule {
    /// Exactly these thresholds.
    Explicit { thresholds: Vec<u64> },
    /// `start, start + step, ...` up to and including `stop` when it is hit.
    Linear { start: u64, stop: u64, step: u64 },
}

impl ThresholdSchedule {
    pub fn expand(&self) -> Result<Vec<u64>> {
        match self {
            ThresholdSchedule::Explicit { thresholds } => Ok(thresholds.clone()),
            ThresholdSchedule::Linear { start, stop, step } => {
                if *step == 0 {
                    return Err(RangeViolation::ZeroStep.into());
                }
                let mut out = Vec::new();
                let mut n = *start;
                while n <= *stop {
                    out.push(n);
                    match n.checked_add(*step) {
                        Some(next) => n = next,
                        None => break,
                    }
                }
                Ok(out)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// gcd values counted by the restricted tables; empty counts every pair.
    pub gcd_filter: Vec<u64>,
    pub schedule: Option<ThresholdSchedule>,
    pub numerators: Vec<u64>,
    pub cache: Option<PathBuf>,
}

impl Default for RunConfig {
    fn default() -> Self {
        RunConfig {
            gcd_filter: vec![1],
            schedule: None,
            numerators: Vec::new(),
            cache: None,
        }
    }
}

impl RunConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&data)?)
    }

    /// Load `path` if given, defaults otherwise.
    pub fn load_optional(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::load(p),
            None => Ok(Self::default()),
        }
    }

    pub fn filter(&self) -> GcdFilter {
        GcdFilter::from_values(self.gcd_filter.iter().copied())
    }

    /// Thresholds from the schedule, or empty when none is configured.
    pub fn thresholds(&self) -> Result<Vec<u64>> {
        match &self.schedule {
            Some(schedule) => schedule.expand(),
            None => Ok(Vec::new()),
        }
    }
}
