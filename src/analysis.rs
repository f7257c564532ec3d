//! Derived statistics over a whole checkpoint, cached as a JSON sidecar.
//!
//! Summaries are cheap next to the quadratic sweep that produced the
//! checkpoint, but the CLI reads them on every `summary` call, so they are
//! computed once per checkpoint state and written next to the cache.

use crate::error::Result;
use crate::stats::{self, Summary};
use crate::two_dim::Checkpoint;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

// ─── Precomputed summaries ──────────────────────────────────────────────────

/// Summaries of the three checkpoint tables at every threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdStats {
    /// Latest threshold of the checkpoint these were computed from
    pub latest_threshold: Option<u64>,
    /// Every snapshotted threshold, ascending
    pub thresholds: Vec<u64>,
    /// Where the checkpoint started counting
    pub origin: Option<u64>,
    /// Gcd filter values of the restricted table (empty = unrestricted)
    pub gcd_filter: Vec<u64>,

    pub gcd: BTreeMap<u64, Summary>,
    pub steps_restricted: BTreeMap<u64, Summary>,
    pub steps_all: BTreeMap<u64, Summary>,
}

impl ThresholdStats {
    /// Summarize every snapshot of the checkpoint.
    ///
    /// A restricted snapshot can legitimately be empty (say a filter of
    /// `{5}` below threshold 5); such thresholds are left out of
    /// `steps_restricted` rather than failing the whole computation.
    pub fn compute(checkpoint: &Checkpoint) -> Result<Self> {
        let steps_restricted: BTreeMap<u64, Summary> = checkpoint
            .restricted_table()
            .iter()
            .filter(|(_, freq)| !freq.is_empty())
            .map(|(&n, freq)| Ok((n, stats::summarize(freq)?)))
            .collect::<Result<_>>()?;

        Ok(ThresholdStats {
            latest_threshold: checkpoint.latest(),
            thresholds: checkpoint.thresholds(),
            origin: checkpoint.origin(),
            gcd_filter: checkpoint.filter().values(),
            gcd: stats::summarize_table(checkpoint.gcd_table())?,
            steps_restricted,
            steps_all: stats::summarize_table(checkpoint.all_table())?,
        })
    }

    /// Whether these summaries describe the current state of `checkpoint`.
    pub fn is_current_for(&self, checkpoint: &Checkpoint) -> bool {
        self.latest_threshold == checkpoint.latest()
            && self.origin == checkpoint.origin()
            && self.thresholds == checkpoint.thresholds()
            && self.gcd_filter == checkpoint.filter().values()
    }

    /// Load cached stats from a JSON sidecar file.
    pub fn load(path: &Path) -> Option<Self> {
        if !path.exists() {
            return None;
        }
        let data = std::fs::read_to_string(path).ok()?;
        match serde_json::from_str(&data) {
            Ok(stats) => Some(stats),
            Err(err) => {
                warn!(path = %path.display(), %err, "ignoring unreadable stats sidecar");
                None
            }
        }
    }

    /// Save stats to a JSON sidecar file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let data = serde_json::to_string_pretty(self)?;
        std::fs::write(path, data)?;
        Ok(())
    }

    /// Load from the sidecar if it matches the checkpoint, otherwise
    /// recompute and rewrite it.
    pub fn load_or_compute(stats_path: &Path, checkpoint: &Checkpoint) -> Result<Self> {
        if let Some(cached) = Self::load(stats_path) {
            if cached.is_current_for(checkpoint) {
                debug!(path = %stats_path.display(), "stats sidecar is current");
                return Ok(cached);
            }
            warn!(path = %stats_path.display(), "stats sidecar is stale, recomputing");
        }
        let stats = Self::compute(checkpoint)?;
        stats.save(stats_path)?;
        Ok(stats)
    }
}

// ─── Sidecar path helper ────────────────────────────────────────────────────

/// Given a cache path like "euclid_checkpoint.bin", return
/// "euclid_checkpoint.stats.json".
pub fn stats_path_for(cache_path: &Path) -> PathBuf {
    let stem = cache_path
        .file_stem()
        .unwrap_or_default()
        .to_string_lossy();
    cache_path.with_file_name(format!("{}.stats.json", stem))
}

// ─── Tests ──────────────────────────────────────────────────────────────────
