//! The Euclidean algorithm itself: gcd, step count and the division trace.
//!
//! Everything here is a fold over [`Divisions`], so the step count, the gcd
//! and the remainder sequence can never disagree with each other.

use serde::{Deserialize, Serialize};

/// Largest unsigned value the aggregators will hand to [`evaluate`].
pub const MAX_INPUT: u64 = i64::MAX as u64;

// ─── Single division step ───────────────────────────────────────────────────

/// One line of the algorithm: `dividend = quotient * divisor + remainder`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Division {
    pub dividend: i64,
    pub divisor: i64,
    /// Widened because `i64::MIN / -1` does not fit in an `i64`.
    pub quotient: i128,
    /// Floored remainder: zero or carrying the sign of the divisor.
    pub remainder: i64,
}

/// Iterator over the divisions performed on `(a, b)`, ending when the
/// divisor reaches zero.
#[derive(Debug, Clone)]
pub struct Divisions {
    a: i64,
    b: i64,
}

impl Divisions {
    pub fn new(a: i64, b: i64) -> Self {
        Divisions { a, b }
    }

    /// The current value of `a`. Once the iterator is exhausted this is the
    /// last nonzero remainder, whose absolute value is the gcd.
    pub fn current(&self) -> i64 {
        self.a
    }
}

impl Iterator for Divisions {
    type Item = Division;

    fn next(&mut self) -> Option<Division> {
        if self.b == 0 {
            return None;
        }
        let (dividend, divisor) = (self.a, self.b);
        let remainder = floor_rem(dividend, divisor);
        // Exact: dividend - remainder is a multiple of divisor.
        let quotient = (dividend as i128 - remainder as i128) / divisor as i128;
        self.a = divisor;
        self.b = remainder;
        Some(Division {
            dividend,
            divisor,
            quotient,
            remainder,
        })
    }
}

/// Remainder with the sign of the divisor. `wrapping_rem` only differs from
/// `%` for `i64::MIN % -1`, where the true remainder is 0.
fn floor_rem(a: i64, b: i64) -> i64 {
    let r = a.wrapping_rem(b);
    if r != 0 && ((r < 0) != (b < 0)) {
        r + b
    } else {
        r
    }
}

// ─── Step oracle ────────────────────────────────────────────────────────────

/// gcd and division count of one run of the algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StepResult {
    pub gcd: u64,
    pub steps: u64,
}

/// Run the Euclidean algorithm on `(a, b)`.
///
/// `evaluate(a, 0)` is `{gcd: |a|, steps: 0}`, and `evaluate(0, 0)` is
/// `{gcd: 0, steps: 0}`.
pub fn evaluate(a: i64, b: i64) -> StepResult {
    let mut divisions = Divisions::new(a, b);
    let steps = divisions.by_ref().count() as u64;
    StepResult {
        gcd: divisions.current().unsigned_abs(),
        steps,
    }
}

/// The remainder sequence `[r0 = a, r1 = b, r2, ..., rn]` where `rn` is the
/// last nonzero term (or `a` alone when `b = 0`).
///
/// `len() - 1` is the step count and `|rn|` the gcd.
pub fn remainder_sequence(a: i64, b: i64) -> Vec<i64> {
    std::iter::once(a)
        .chain(Divisions::new(a, b).map(|d| d.divisor))
        .collect()
}

/// Quotients `[q1, ..., qn]` together with the remainder sequence.
pub fn quotient_remainder_sequence(a: i64, b: i64) -> (Vec<i128>, Vec<i64>) {
    let mut quotients = Vec::new();
    let mut remainders = vec![a];
    for d in Divisions::new(a, b) {
        quotients.push(d.quotient);
        remainders.push(d.divisor);
    }
    (quotients, remainders)
}

/// gcd of any number of integers, `gcd(a1, gcd(a2, ...))`. Empty input is 0.
pub fn gcd_n(values: &[i64]) -> u64 {
    values.iter().rev().fold(0u64, |acc, &v| {
        // acc = 2^63 only after a lone i64::MIN
        match i64::try_from(acc) {
            Ok(acc) => evaluate(v, acc).gcd,
            Err(_) => evaluate(v, i64::MIN).gcd,
        }
    })
}

/// The `n`th Fibonacci number, or `None` once it no longer fits in a `u64`.
pub fn fibonacci(n: u32) -> Option<u64> {
    let (mut prev, mut cur) = (0u64, 1u64);
    if n == 0 {
        return Some(0);
    }
    for _ in 1..n {
        let next = prev.checked_add(cur)?;
        prev = cur;
        cur = next;
    }
    Some(cur)
}

// ─── Tests ──────────────────────────────────────────────────────────────────
