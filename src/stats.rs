//! Descriptive statistics of an integer-keyed frequency map.

use crate::error::{AnalysisError, Result};
use crate::frequency::{FrequencyMap, ThresholdTable};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Distribution summary of one frequency map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    /// key → count / n
    pub relative_freq: BTreeMap<u64, f64>,
    /// n, the number of objects counted
    pub count: u64,
    pub mean: f64,
    pub second_moment: f64,
    /// Population variance, `second_moment - mean²`.
    pub variance: f64,
    pub standard_deviation: f64,
    pub median: f64,
    /// Every key attaining the maximum count.
    pub mode: BTreeSet<u64>,
}

/// Summarize a frequency map.
///
/// The median follows the sorted-multiset convention: for odd `n` it is the
/// smallest key whose cumulative count exceeds `n/2`; for even `n` it is the
/// mean of the keys at cumulative ranks `n/2` and `n/2 + 1`.
pub fn summarize(freq: &FrequencyMap) -> Result<Summary> {
    let n: u64 = freq.values().sum();
    if n == 0 {
        return Err(AnalysisError::EmptyInput);
    }
    let n_f = n as f64;

    let mut first_moment = 0.0;
    let mut second_moment = 0.0;
    for (&key, &count) in freq {
        let k = key as f64;
        first_moment += k * count as f64;
        second_moment += k * k * count as f64;
    }
    let mean = first_moment / n_f;
    let second_moment = second_moment / n_f;
    let variance = second_moment - mean * mean;
    // Rounding can push a zero variance slightly negative.
    let standard_deviation = variance.max(0.0).sqrt();

    let max_count = freq.values().copied().max().unwrap_or(0);
    let mode = freq
        .iter()
        .filter(|(_, &c)| c == max_count)
        .map(|(&k, _)| k)
        .collect();

    let relative_freq = freq
        .iter()
        .map(|(&k, &c)| (k, c as f64 / n_f))
        .collect();

    Ok(Summary {
        relative_freq,
        count: n,
        mean,
        second_moment,
        variance,
        standard_deviation,
        median: median(freq, n),
        mode,
    })
}

/// Smallest key whose cumulative count reaches `rank` (1-based).
fn key_at_rank(freq: &FrequencyMap, rank: u64) -> u64 {
    let mut cumulative = 0u64;
    for (&key, &count) in freq {
        cumulative += count;
        if cumulative >= rank {
            return key;
        }
    }
    // rank <= n, so the loop always returns
    freq.keys().next_back().copied().unwrap_or(0)
}

fn median(freq: &FrequencyMap, n: u64) -> f64 {
    if n % 2 == 1 {
        // cumulative > n/2 with n odd is cumulative >= (n + 1) / 2
        key_at_rank(freq, n / 2 + 1) as f64
    } else {
        let lower = key_at_rank(freq, n / 2) as f64;
        let upper = key_at_rank(freq, n / 2 + 1) as f64;
        (lower + upper) / 2.0
    }
}

/// Summaries of every inner map of a table, keyed like the table.
pub fn summarize_table(table: &ThresholdTable) -> Result<BTreeMap<u64, Summary>> {
    table
        .iter()
        .map(|(&key, freq)| Ok((key, summarize(freq)?)))
        .collect()
}

/// Relative frequencies of every inner map of a table.
pub fn distributions(table: &ThresholdTable) -> Result<BTreeMap<u64, BTreeMap<u64, f64>>> {
    table
        .iter()
        .map(|(&key, freq)| Ok((key, summarize(freq)?.relative_freq)))
        .collect()
}

// ─── Tests ──────────────────────────────────────────────────────────────────
