//! One-dimensional analysis: fixed numerator `a`, every denominator
//! `1 ≤ b ≤ a`.
//!
//! Recomputed from scratch on every call; there is nothing to resume.

use crate::error::{RangeViolation, Result};
use crate::euclid::{self, MAX_INPUT};
use crate::frequency::{self, FrequencyMap, GcdFilter, ThresholdTable};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::debug;

/// Step-count tables keyed by numerator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OneDimTables {
    /// Only denominators whose gcd with the numerator the filter admits.
    pub restricted: ThresholdTable,
    /// Every denominator in `1..=a`.
    pub all: ThresholdTable,
}

/// Build step-count frequency tables for every numerator.
///
/// Duplicate numerators collapse. For every `a`, `Σ_s all[a][s] = a`.
pub fn aggregate_by_numerator(filter: &GcdFilter, numerators: &[u64]) -> Result<OneDimTables> {
    let numerators: BTreeSet<u64> = numerators.iter().copied().collect();
    for &a in &numerators {
        if a < 1 {
            return Err(RangeViolation::NumeratorTooSmall { value: a }.into());
        }
        if a > MAX_INPUT {
            return Err(RangeViolation::ValueTooLarge {
                value: a,
                max: MAX_INPUT,
            }
            .into());
        }
    }

    let mut tables = OneDimTables::default();
    for a in numerators {
        let mut restricted = FrequencyMap::new();
        let mut all = FrequencyMap::new();
        for b in 1..=a {
            let r = euclid::evaluate(a as i64, b as i64);
            frequency::record(&mut all, r.steps);
            if filter.admits(r.gcd) {
                frequency::record(&mut restricted, r.steps);
            }
        }
        debug!(numerator = a, restricted = frequency::total(&restricted), "numerator tabulated");
        tables.restricted.insert(a, restricted);
        tables.all.insert(a, all);
    }
    Ok(tables)
}

// ─── Tests ──────────────────────────────────────────────────────────────────
