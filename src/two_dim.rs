//! Two-dimensional analysis: every pair `0 < b < a < N`, accumulated
//! incrementally over a growing sequence of thresholds `N`.
//!
//! A [`Checkpoint`] holds one snapshot per threshold of three frequency
//! tables (gcd values, restricted step counts, all step counts). Extending it
//! to larger thresholds only visits the pairs it has not counted yet, and
//! always returns a new checkpoint; the caller's copy is never touched.

use crate::error::{RangeViolation, Result};
use crate::euclid::{self, MAX_INPUT};
use crate::frequency::{self, FrequencyMap, GcdFilter, ThresholdTable};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// Number of pairs `0 < b < a < n`.
///
/// Widened to `u128`: the count overflows `u64` long before `n` leaves the
/// oracle's `i64` range.
pub fn triangle_pairs(n: u64) -> u128 {
    if n < 2 {
        return 0;
    }
    let n = u128::from(n);
    (n - 1) * (n - 2) / 2
}

// ─── Checkpoint ─────────────────────────────────────────────────────────────

/// Cumulative frequency snapshots keyed by threshold.
///
/// For every key `N`, the three snapshots count each pair of
/// `{0<b<a<N} \ {0<b<a<origin}` exactly once. With origin 2 that is the
/// whole triangle below `N`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    origin: Option<u64>,
    filter: GcdFilter,
    gcd: ThresholdTable,
    steps_restricted: ThresholdTable,
    steps_all: ThresholdTable,
}

impl Checkpoint {
    /// An empty checkpoint; the first extension decides its origin and filter.
    pub fn new() -> Self {
        Checkpoint::default()
    }

    pub fn is_empty(&self) -> bool {
        self.gcd.is_empty()
    }

    /// The largest threshold snapshotted so far.
    pub fn latest(&self) -> Option<u64> {
        self.gcd.keys().next_back().copied()
    }

    /// The threshold the very first extension started from.
    pub fn origin(&self) -> Option<u64> {
        self.origin
    }

    /// The filter the restricted table was built with.
    pub fn filter(&self) -> &GcdFilter {
        &self.filter
    }

    /// Snapshotted thresholds, ascending.
    pub fn thresholds(&self) -> Vec<u64> {
        self.gcd.keys().copied().collect()
    }

    /// gcd value → number of pairs below `threshold` with that gcd.
    pub fn gcd_counts(&self, threshold: u64) -> Option<&FrequencyMap> {
        self.gcd.get(&threshold)
    }

    /// step count → number of pairs below `threshold` admitted by the filter.
    pub fn restricted_step_counts(&self, threshold: u64) -> Option<&FrequencyMap> {
        self.steps_restricted.get(&threshold)
    }

    /// step count → number of pairs below `threshold`.
    pub fn all_step_counts(&self, threshold: u64) -> Option<&FrequencyMap> {
        self.steps_all.get(&threshold)
    }

    pub fn gcd_table(&self) -> &ThresholdTable {
        &self.gcd
    }

    pub fn restricted_table(&self) -> &ThresholdTable {
        &self.steps_restricted
    }

    pub fn all_table(&self) -> &ThresholdTable {
        &self.steps_all
    }

    /// Number of pairs the snapshot at `threshold` should have counted.
    /// Zero at or below the origin.
    pub fn expected_pairs(&self, threshold: u64) -> u128 {
        match self.origin {
            Some(origin) => triangle_pairs(threshold).saturating_sub(triangle_pairs(origin)),
            None => 0,
        }
    }

    /// Extend this checkpoint; see [`extend`].
    pub fn extend(&self, filter: &GcdFilter, thresholds: &[u64]) -> Result<Checkpoint> {
        extend(filter, thresholds, self)
    }

    /// Append a checkpoint built independently over a later threshold range.
    ///
    /// `later` must have been started (from empty) at this checkpoint's
    /// latest threshold with the same filter. Its snapshots only count the
    /// pairs of its own range, so each one is summed with this checkpoint's
    /// latest snapshot.
    pub fn chain(&self, later: &Checkpoint) -> Result<Checkpoint> {
        let Some(latest) = self.latest() else {
            return Ok(later.clone());
        };
        let Some(later_origin) = later.origin else {
            return Ok(self.clone());
        };
        if later_origin != latest {
            return Err(RangeViolation::ResumeMismatch {
                latest,
                first: later_origin,
            }
            .into());
        }
        if later.filter != self.filter {
            return Err(RangeViolation::FilterMismatch {
                stored: self.filter.values(),
                requested: later.filter.values(),
            }
            .into());
        }

        let mut chained = self.clone();
        for (table, own, theirs) in [
            (&mut chained.gcd, &self.gcd, &later.gcd),
            (&mut chained.steps_restricted, &self.steps_restricted, &later.steps_restricted),
            (&mut chained.steps_all, &self.steps_all, &later.steps_all),
        ] {
            let base = own.get(&latest).cloned().unwrap_or_default();
            for (&threshold, counts) in theirs {
                let mut merged = base.clone();
                frequency::merge_counts(&mut merged, counts);
                table.insert(threshold, merged);
            }
        }
        Ok(chained)
    }

    /// Load from a bincode file.
    pub fn load(path: &Path) -> Result<Self> {
        let data = fs::read(path)?;
        Ok(bincode::deserialize(&data)?)
    }

    /// Load from a bincode file, or start empty if the file doesn't exist.
    pub fn load_or_new(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::new())
        }
    }

    /// Save to a bincode file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let data = bincode::serialize(self)?;
        fs::write(path, data)?;
        Ok(())
    }
}

// ─── Running totals ─────────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct RunningTotals {
    gcd: FrequencyMap,
    steps_restricted: FrequencyMap,
    steps_all: FrequencyMap,
}

impl RunningTotals {
    fn resume_from(checkpoint: &Checkpoint, threshold: u64) -> Self {
        RunningTotals {
            gcd: checkpoint.gcd.get(&threshold).cloned().unwrap_or_default(),
            steps_restricted: checkpoint
                .steps_restricted
                .get(&threshold)
                .cloned()
                .unwrap_or_default(),
            steps_all: checkpoint.steps_all.get(&threshold).cloned().unwrap_or_default(),
        }
    }

    fn tally(&mut self, filter: &GcdFilter, a: u64, b: u64) {
        let r = euclid::evaluate(a as i64, b as i64);
        frequency::record(&mut self.gcd, r.gcd);
        frequency::record(&mut self.steps_all, r.steps);
        if filter.admits(r.gcd) {
            frequency::record(&mut self.steps_restricted, r.steps);
        }
    }

    /// Count every pair of `{0<b<a<hi} \ {0<b<a<lo}`.
    ///
    /// The band splits into two disjoint sweeps: pairs whose `b` is itself
    /// new (`lo ≤ b < a < hi`), and pairs with an old `b` but a new `a`
    /// (`b < lo ≤ a < hi`).
    fn sweep_band(&mut self, filter: &GcdFilter, lo: u64, hi: u64) {
        for b in lo..hi {
            for a in (b + 1)..hi {
                self.tally(filter, a, b);
            }
        }
        for b in 1..lo {
            for a in lo..hi {
                self.tally(filter, a, b);
            }
        }
    }

    fn snapshot_into(&self, checkpoint: &mut Checkpoint, threshold: u64) {
        checkpoint.gcd.insert(threshold, self.gcd.clone());
        checkpoint
            .steps_restricted
            .insert(threshold, self.steps_restricted.clone());
        checkpoint.steps_all.insert(threshold, self.steps_all.clone());
    }
}

// ─── Extension ──────────────────────────────────────────────────────────────

fn validate_thresholds(thresholds: &[u64]) -> Result<()> {
    if thresholds.is_empty() {
        return Err(RangeViolation::EmptyThresholds.into());
    }
    for &n in thresholds {
        if n < 2 {
            return Err(RangeViolation::ThresholdTooSmall { value: n }.into());
        }
        if n > MAX_INPUT {
            return Err(RangeViolation::ValueTooLarge {
                value: n,
                max: MAX_INPUT,
            }
            .into());
        }
    }
    for pair in thresholds.windows(2) {
        if pair[1] <= pair[0] {
            return Err(RangeViolation::NotIncreasing {
                previous: pair[0],
                next: pair[1],
            }
            .into());
        }
    }
    Ok(())
}

/// Extend `checkpoint` to every threshold in `thresholds`.
///
/// A non-empty checkpoint must end exactly at `thresholds[0]` and must have
/// been built with the same `filter`; its snapshot there seeds the running
/// totals, and nothing below it is rescanned. An empty checkpoint starts
/// from zero counts at `thresholds[0]`, which becomes its origin; pass 2 as
/// the first threshold to cover the whole triangle.
///
/// Each later threshold receives a snapshot of the running totals. All
/// validation happens before any counting.
pub fn extend(filter: &GcdFilter, thresholds: &[u64], checkpoint: &Checkpoint) -> Result<Checkpoint> {
    validate_thresholds(thresholds)?;
    let first = thresholds[0];

    let mut totals = match checkpoint.latest() {
        Some(latest) => {
            if latest != first {
                return Err(RangeViolation::ResumeMismatch { latest, first }.into());
            }
            if checkpoint.filter != *filter {
                return Err(RangeViolation::FilterMismatch {
                    stored: checkpoint.filter.values(),
                    requested: filter.values(),
                }
                .into());
            }
            RunningTotals::resume_from(checkpoint, latest)
        }
        None => RunningTotals::default(),
    };

    let mut next = checkpoint.clone();
    if thresholds.len() < 2 {
        return Ok(next);
    }
    if next.origin.is_none() {
        next.origin = Some(first);
        next.filter = filter.clone();
    }

    for band in thresholds.windows(2) {
        let (lo, hi) = (band[0], band[1]);
        totals.sweep_band(filter, lo, hi);
        totals.snapshot_into(&mut next, hi);
        debug!(
            from = lo,
            to = hi,
            pairs = frequency::total(&totals.steps_all),
            "band swept"
        );
    }

    info!(
        from = first,
        to = thresholds[thresholds.len() - 1],
        bands = thresholds.len() - 1,
        "checkpoint extended"
    );
    Ok(next)
}

// ─── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AnalysisError;
    use proptest::prelude::*;

    /// Direct enumeration of the triangle below `n`.
    fn brute_force(filter: &GcdFilter, n: u64) -> (FrequencyMap, FrequencyMap, FrequencyMap) {
        let (mut gcd, mut restricted, mut all) =
            (FrequencyMap::new(), FrequencyMap::new(), FrequencyMap::new());
        for a in 1..n {
            for b in 1..a {
                let r = euclid::evaluate(a as i64, b as i64);
                frequency::record(&mut gcd, r.gcd);
                frequency::record(&mut all, r.steps);
                if filter.admits(r.gcd) {
                    frequency::record(&mut restricted, r.steps);
                }
            }
        }
        (gcd, restricted, all)
    }

    fn snapshot(cp: &Checkpoint, n: u64) -> (FrequencyMap, FrequencyMap, FrequencyMap) {
        (
            cp.gcd_counts(n).unwrap().clone(),
            cp.restricted_step_counts(n).unwrap().clone(),
            cp.all_step_counts(n).unwrap().clone(),
        )
    }

    #[test]
    fn test_first_band() {
        let cp = extend(&GcdFilter::unrestricted(), &[2, 3], &Checkpoint::new()).unwrap();
        let expected: FrequencyMap = [(1, 1)].into_iter().collect();
        assert_eq!(cp.gcd_counts(3), Some(&expected));
        assert_eq!(cp.all_step_counts(3), Some(&expected));
        assert_eq!(cp.restricted_step_counts(3), Some(&expected));
        assert_eq!(cp.thresholds(), vec![3]);
        assert_eq!(cp.origin(), Some(2));
    }

    #[test]
    fn test_small_threshold_by_hand() {
        // below 5: (2,1) (3,1) (3,2) (4,1) (4,2) (4,3)
        let cp = extend(&GcdFilter::coprime(), &[2, 5], &Checkpoint::new()).unwrap();
        let gcd: FrequencyMap = [(1, 5), (2, 1)].into_iter().collect();
        let all: FrequencyMap = [(1, 4), (2, 2)].into_iter().collect();
        let restricted: FrequencyMap = [(1, 3), (2, 2)].into_iter().collect();
        assert_eq!(cp.gcd_counts(5), Some(&gcd));
        assert_eq!(cp.all_step_counts(5), Some(&all));
        assert_eq!(cp.restricted_step_counts(5), Some(&restricted));
    }

    #[test]
    fn test_matches_brute_force() {
        let filter = GcdFilter::coprime();
        let cp = extend(&filter, &[2, 7, 13, 31, 50], &Checkpoint::new()).unwrap();
        for n in [7, 13, 31, 50] {
            assert_eq!(snapshot(&cp, n), brute_force(&filter, n), "threshold {}", n);
        }
    }

    #[test]
    fn test_triangle_identity() {
        let cp = extend(&GcdFilter::coprime(), &[2, 3, 4, 10, 25, 60], &Checkpoint::new()).unwrap();
        for n in cp.thresholds() {
            let counted = frequency::total(cp.gcd_counts(n).unwrap());
            assert_eq!(counted, (n - 1) * (n - 2) / 2);
            assert_eq!(u128::from(counted), cp.expected_pairs(n));
            assert_eq!(frequency::total(cp.all_step_counts(n).unwrap()), counted);
        }
    }

    #[test]
    fn test_unrestricted_filter_matches_all() {
        let cp = extend(&GcdFilter::unrestricted(), &[2, 20, 40], &Checkpoint::new()).unwrap();
        assert_eq!(cp.restricted_table(), cp.all_table());
    }

    #[test]
    fn test_one_shot_equals_fine_steps() {
        let filter = GcdFilter::from_values([1, 2]);
        let coarse = extend(&filter, &[2, 45], &Checkpoint::new()).unwrap();
        let fine = extend(&filter, &[2, 3, 9, 10, 11, 30, 45], &Checkpoint::new()).unwrap();
        assert_eq!(snapshot(&coarse, 45), snapshot(&fine, 45));
        assert_eq!(coarse.thresholds(), vec![45]);
    }

    #[test]
    fn test_resume_equals_single_call() {
        let filter = GcdFilter::coprime();
        let direct = extend(&filter, &[2, 10, 20, 30], &Checkpoint::new()).unwrap();
        let first = extend(&filter, &[2, 10, 20], &Checkpoint::new()).unwrap();
        let resumed = first.extend(&filter, &[20, 30]).unwrap();
        assert_eq!(resumed, direct);
        // the input checkpoint is left as it was
        assert_eq!(first.latest(), Some(20));
    }

    #[test]
    fn test_resume_mismatch_rejected() {
        let filter = GcdFilter::coprime();
        let cp = extend(&filter, &[2, 10], &Checkpoint::new()).unwrap();
        let before = cp.clone();
        let err = extend(&filter, &[12, 20], &cp).unwrap_err();
        assert!(matches!(
            err,
            AnalysisError::InvalidRange(RangeViolation::ResumeMismatch { latest: 10, first: 12 })
        ));
        assert_eq!(cp, before);
    }

    #[test]
    fn test_filter_mismatch_rejected() {
        let cp = extend(&GcdFilter::coprime(), &[2, 10], &Checkpoint::new()).unwrap();
        let err = extend(&GcdFilter::unrestricted(), &[10, 20], &cp).unwrap_err();
        assert!(matches!(
            err,
            AnalysisError::InvalidRange(RangeViolation::FilterMismatch { .. })
        ));
    }

    #[test]
    fn test_invalid_thresholds_rejected() {
        let f = GcdFilter::coprime();
        let empty = Checkpoint::new();
        assert!(matches!(
            extend(&f, &[], &empty),
            Err(AnalysisError::InvalidRange(RangeViolation::EmptyThresholds))
        ));
        assert!(matches!(
            extend(&f, &[1, 5], &empty),
            Err(AnalysisError::InvalidRange(RangeViolation::ThresholdTooSmall { value: 1 }))
        ));
        assert!(matches!(
            extend(&f, &[2, 8, 8], &empty),
            Err(AnalysisError::InvalidRange(RangeViolation::NotIncreasing { previous: 8, next: 8 }))
        ));
        assert!(matches!(
            extend(&f, &[2, 9, 4], &empty),
            Err(AnalysisError::InvalidRange(RangeViolation::NotIncreasing { .. }))
        ));
        assert!(matches!(
            extend(&f, &[2, u64::MAX], &empty),
            Err(AnalysisError::InvalidRange(RangeViolation::ValueTooLarge { .. }))
        ));
    }

    #[test]
    fn test_single_threshold_is_noop() {
        let f = GcdFilter::coprime();
        let cp = extend(&f, &[2], &Checkpoint::new()).unwrap();
        assert!(cp.is_empty());
        assert_eq!(cp.origin(), None);

        let cp = extend(&f, &[2, 6], &Checkpoint::new()).unwrap();
        assert_eq!(extend(&f, &[6], &cp).unwrap(), cp);
    }

    #[test]
    fn test_origin_above_two() {
        let filter = GcdFilter::coprime();
        let cp = extend(&filter, &[5, 9, 14], &Checkpoint::new()).unwrap();
        assert_eq!(cp.origin(), Some(5));
        for n in [9, 14] {
            let counted = frequency::total(cp.gcd_counts(n).unwrap());
            assert_eq!(u128::from(counted), triangle_pairs(n) - triangle_pairs(5));
            assert_eq!(u128::from(counted), cp.expected_pairs(n));
        }
    }

    #[test]
    fn test_expected_pairs_below_origin() {
        let cp = extend(&GcdFilter::coprime(), &[5, 9], &Checkpoint::new()).unwrap();
        assert_eq!(cp.expected_pairs(3), 0);
        assert_eq!(cp.expected_pairs(5), 0);
        assert_eq!(cp.expected_pairs(6), 4);
        assert_eq!(Checkpoint::new().expected_pairs(100), 0);
    }

    #[test]
    fn test_chain_equals_direct() {
        let filter = GcdFilter::coprime();
        let direct = extend(&filter, &[2, 10, 20, 35, 50], &Checkpoint::new()).unwrap();
        let low = extend(&filter, &[2, 10, 20], &Checkpoint::new()).unwrap();
        let high = extend(&filter, &[20, 35, 50], &Checkpoint::new()).unwrap();
        let chained = low.chain(&high).unwrap();
        assert_eq!(chained, direct);
    }

    #[test]
    fn test_chain_with_empty_sides() {
        let filter = GcdFilter::coprime();
        let cp = extend(&filter, &[2, 10], &Checkpoint::new()).unwrap();
        assert_eq!(Checkpoint::new().chain(&cp).unwrap(), cp);
        assert_eq!(cp.chain(&Checkpoint::new()).unwrap(), cp);
    }

    #[test]
    fn test_chain_mismatch_rejected() {
        let filter = GcdFilter::coprime();
        let low = extend(&filter, &[2, 10], &Checkpoint::new()).unwrap();
        let gap = extend(&filter, &[11, 20], &Checkpoint::new()).unwrap();
        assert!(matches!(
            low.chain(&gap),
            Err(AnalysisError::InvalidRange(RangeViolation::ResumeMismatch { latest: 10, first: 11 }))
        ));
        let other = extend(&GcdFilter::unrestricted(), &[10, 20], &Checkpoint::new()).unwrap();
        assert!(matches!(
            low.chain(&other),
            Err(AnalysisError::InvalidRange(RangeViolation::FilterMismatch { .. }))
        ));
    }

    #[test]
    fn test_save_load_roundtrip() {
        let cp = extend(&GcdFilter::coprime(), &[2, 8, 16], &Checkpoint::new()).unwrap();
        let tmp = std::env::temp_dir().join("test_euclid_checkpoint.bin");
        cp.save(&tmp).unwrap();
        let loaded = Checkpoint::load(&tmp).unwrap();
        assert_eq!(loaded, cp);
        let _ = std::fs::remove_file(&tmp);
    }

    #[test]
    fn test_load_or_new_missing_file() {
        let tmp = std::env::temp_dir().join("test_euclid_checkpoint_missing.bin");
        let _ = std::fs::remove_file(&tmp);
        let cp = Checkpoint::load_or_new(&tmp).unwrap();
        assert!(cp.is_empty());
    }

    #[test]
    fn test_triangle_pairs() {
        assert_eq!(triangle_pairs(0), 0);
        assert_eq!(triangle_pairs(2), 0);
        assert_eq!(triangle_pairs(3), 1);
        assert_eq!(triangle_pairs(10), 36);
    }

    #[test]
    fn test_triangle_pairs_large_thresholds() {
        let n = 1u64 << 33;
        assert_eq!(triangle_pairs(n), (1u128 << 65) - 3 * (1u128 << 32) + 1);
        let max = MAX_INPUT;
        let expected = (u128::from(max) - 1) * (u128::from(max) - 2) / 2;
        assert_eq!(triangle_pairs(max), expected);
        assert!(triangle_pairs(max) > u128::from(u64::MAX));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(40))]

        // Any refinement of [2, N] yields the same final snapshot, and every
        // intermediate snapshot holds exactly the triangle below it
        #[test]
        fn prop_refinement_is_invisible(
            cuts in proptest::collection::btree_set(3u64..60, 0..8),
            last in 60u64..70
        ) {
            let filter = GcdFilter::coprime();
            let mut fine = vec![2];
            fine.extend(cuts.iter().copied());
            fine.push(last);

            let coarse = extend(&filter, &[2, last], &Checkpoint::new()).unwrap();
            let refined = extend(&filter, &fine, &Checkpoint::new()).unwrap();
            prop_assert_eq!(snapshot(&coarse, last), snapshot(&refined, last));

            for n in refined.thresholds() {
                prop_assert_eq!(
                    frequency::total(refined.gcd_counts(n).unwrap()),
                    (n - 1) * (n - 2) / 2
                );
            }
        }

        // Splitting a threshold list at any point and resuming gives the
        // same checkpoint as one call
        #[test]
        fn prop_split_resume_matches(
            cuts in proptest::collection::btree_set(3u64..40, 2..6),
            split_at in 0usize..10
        ) {
            let filter = GcdFilter::from_values([1, 3]);
            let mut thresholds = vec![2];
            thresholds.extend(cuts.iter().copied());
            let split = 1 + split_at % (thresholds.len() - 1);

            let direct = extend(&filter, &thresholds, &Checkpoint::new()).unwrap();
            let head = extend(&filter, &thresholds[..=split], &Checkpoint::new()).unwrap();
            let resumed = extend(&filter, &thresholds[split..], &head).unwrap();
            prop_assert_eq!(resumed, direct);
        }
    }
}
