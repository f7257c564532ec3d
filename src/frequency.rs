//! Frequency maps, the threshold-keyed tables built from them, and the gcd
//! filter that decides which pairs land in a restricted table.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// key (gcd value or step count) → number of occurrences.
pub type FrequencyMap = BTreeMap<u64, u64>;

/// threshold (or numerator) → frequency map accumulated for it.
pub type ThresholdTable = BTreeMap<u64, FrequencyMap>;

/// Count one more occurrence of `key`.
pub fn record(map: &mut FrequencyMap, key: u64) {
    *map.entry(key).or_insert(0) += 1;
}

/// Add every count of `other` into `into`.
pub fn merge_counts(into: &mut FrequencyMap, other: &FrequencyMap) {
    for (&key, &count) in other {
        *into.entry(key).or_insert(0) += count;
    }
}

/// Total number of occurrences recorded in the map.
pub fn total(map: &FrequencyMap) -> u64 {
    map.values().sum()
}

// ─── Gcd filter ─────────────────────────────────────────────────────────────

/// The gcd values a restricted table counts.
///
/// An empty filter is the "unrestricted" sentinel: it admits every gcd, so
/// a restricted table built with it equals the all-pairs table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GcdFilter {
    values: BTreeSet<u64>,
}

impl GcdFilter {
    /// The filter that admits every pair.
    pub fn unrestricted() -> Self {
        GcdFilter::default()
    }

    /// Only coprime pairs.
    pub fn coprime() -> Self {
        GcdFilter::from_values([1])
    }

    pub fn from_values(values: impl IntoIterator<Item = u64>) -> Self {
        GcdFilter {
            values: values.into_iter().collect(),
        }
    }

    pub fn is_unrestricted(&self) -> bool {
        self.values.is_empty()
    }

    pub fn admits(&self, gcd: u64) -> bool {
        self.values.is_empty() || self.values.contains(&gcd)
    }

    /// The filter's gcd values in ascending order (empty when unrestricted).
    pub fn values(&self) -> Vec<u64> {
        self.values.iter().copied().collect()
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────
