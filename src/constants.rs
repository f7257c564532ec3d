//! Constants from the asymptotic theory of the Euclidean algorithm.
//!
//! For `a` large, the mean step count over `b ≤ a` coprime to `a` grows like
//! `λ ln a + (Porter's constant) - 1`, and over all pairs `b < a < N` like
//! `λ ln N` plus Norton's correction. The variance in the two-dimensional
//! case grows like `η ln N` (Hensley). These are exposed so empirical
//! summaries can be compared against theory.

use std::f64::consts::{LN_2, PI};

pub const EULER_MASCHERONI: f64 = 0.577_215_664_901_532_9;

/// ζ(2) = π²/6
pub const ZETA_2: f64 = PI * PI / 6.0;

/// ζ'(2)
pub const ZETA_PRIME_2: f64 = -0.937_548_254_315_843_8;

/// ζ''(2), to the precision it is usually quoted.
pub const ZETA_DOUBLE_PRIME_2: f64 = 1.989_28;

/// Hensley's variance constant as given by Lhote.
pub const HENSLEY_ETA: f64 = 0.516_052_4;

/// Offset of the two-dimensional all-pairs variance, `η ln N + κ`.
pub const KAPPA_VAR: f64 = -0.1;

/// `2 ln 2 / ζ(2) = 12 ln 2 / π²`, the reciprocal of Lévy's constant.
pub fn dixon_lambda() -> f64 {
    2.0 * LN_2 / ZETA_2
}

/// Porter's constant, the second-order term of the one-dimensional mean.
pub fn porter_constant() -> f64 {
    (LN_2 / ZETA_2) * (3.0 * LN_2 + 4.0 * EULER_MASCHERONI - 4.0 * ZETA_PRIME_2 / ZETA_2 - 2.0)
        - 0.5
}

/// Norton's second-order term of the two-dimensional mean over all pairs.
pub fn norton_nu() -> f64 {
    -1.0 + dixon_lambda()
        * (2.0 * EULER_MASCHERONI + 1.5 * LN_2 - 1.5 - ZETA_PRIME_2 / ZETA_2)
}

/// Norton's second-order term restricted to coprime pairs.
pub fn norton_nu_coprime() -> f64 {
    norton_nu() - dixon_lambda() * ZETA_PRIME_2 / ZETA_2
}

/// Shift between the variance offsets of the all-pairs and coprime-pairs
/// two-dimensional step distributions.
pub fn coprime_variance_shift() -> f64 {
    let log_derivative = ZETA_PRIME_2 / ZETA_2;
    let lambda = dixon_lambda();
    HENSLEY_ETA * log_derivative
        + lambda * lambda * (ZETA_DOUBLE_PRIME_2 / ZETA_2 - log_derivative * log_derivative)
}

/// [`coprime_variance_shift`] to three places, the precision ζ''(2) supports.
pub fn delta_kappa() -> f64 {
    round_to_thousandths(coprime_variance_shift())
}

/// Variance offset of the two-dimensional coprime-pairs distribution.
pub fn kappa_var_coprime() -> f64 {
    round_to_thousandths(KAPPA_VAR - delta_kappa())
}

fn round_to_thousandths(x: f64) -> f64 {
    (x * 1000.0).round() / 1000.0
}
