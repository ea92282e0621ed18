//! Level conversions and numerically guarded helpers.
//!
//! Every ratio in the engine goes through [`safe_ratio`] so that silent or
//! constant input yields `0.0` instead of `NaN`/`inf`, and every level in dB
//! is clamped at [`DB_FLOOR`].

use libm::{expf, log10f, logf};

/// Lowest level reported for any dB quantity. Silence maps here, never to `-inf`.
pub const DB_FLOOR: f32 = -120.0;

/// Linear amplitude corresponding to [`DB_FLOOR`].
pub const AMPLITUDE_FLOOR: f32 = 1e-6;

/// Denominators at or below this magnitude are treated as zero.
pub const EPSILON: f32 = 1e-12;

/// Convert decibels to linear gain.
///
/// ```rust
/// use timbre_core::db_to_linear;
///
/// assert!((db_to_linear(0.0) - 1.0).abs() < 1e-6);
/// assert!((db_to_linear(-6.02) - 0.5).abs() < 0.01);
/// ```
#[inline]
pub fn db_to_linear(db: f32) -> f32 {
    const FACTOR: f32 = core::f32::consts::LN_10 / 20.0;
    expf(db * FACTOR)
}

/// Convert a linear amplitude to decibels, floored at [`DB_FLOOR`].
///
/// ```rust
/// use timbre_core::{linear_to_db, DB_FLOOR};
///
/// assert!(linear_to_db(1.0).abs() < 1e-6);
/// assert_eq!(linear_to_db(0.0), DB_FLOOR);
/// ```
#[inline]
pub fn linear_to_db(linear: f32) -> f32 {
    const FACTOR: f32 = 20.0 / core::f32::consts::LN_10;
    let abs = linear.abs();
    if abs <= AMPLITUDE_FLOOR || !abs.is_finite() {
        return if abs.is_infinite() { f32::MAX } else { DB_FLOOR };
    }
    (logf(abs) * FACTOR).max(DB_FLOOR)
}

/// Convert a power (squared amplitude) to decibels, floored at [`DB_FLOOR`].
#[inline]
pub fn power_to_db(power: f32) -> f32 {
    if power <= AMPLITUDE_FLOOR * AMPLITUDE_FLOOR {
        return DB_FLOOR;
    }
    (10.0 * log10f(power)).max(DB_FLOOR)
}

/// `numerator / denominator`, or `0.0` when the denominator is (near) zero.
#[inline]
pub fn safe_ratio(numerator: f32, denominator: f32) -> f32 {
    if denominator.abs() <= EPSILON || !denominator.is_finite() {
        0.0
    } else {
        let r = numerator / denominator;
        if r.is_finite() { r } else { 0.0 }
    }
}

/// Milliseconds to a (fractional) sample count.
#[inline]
pub fn ms_to_samples(ms: f32, sample_rate: f32) -> f32 {
    ms * sample_rate / 1000.0
}

/// Root mean square of a slice. `0.0` for an empty slice.
pub fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_sq: f64 = samples.iter().map(|&x| f64::from(x) * f64::from(x)).sum();
    (sum_sq / samples.len() as f64).sqrt() as f32
}

/// Mean of squared samples. `0.0` for an empty slice.
pub fn mean_square(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_sq: f64 = samples.iter().map(|&x| f64::from(x) * f64::from(x)).sum();
    (sum_sq / samples.len() as f64) as f32
}

/// Percentile of already-sorted data with linear interpolation between ranks.
///
/// `p` is in `[0, 1]`. Returns `0.0` for empty input.
pub fn percentile_sorted(sorted: &[f32], p: f32) -> f32 {
    match sorted.len() {
        0 => 0.0,
        1 => sorted[0],
        n => {
            let rank = p.clamp(0.0, 1.0) * (n - 1) as f32;
            let lo = rank.floor() as usize;
            let hi = (lo + 1).min(n - 1);
            let frac = rank - lo as f32;
            sorted[lo] + (sorted[hi] - sorted[lo]) * frac
        }
    }
}

/// Sort a copy of `values` (NaN-free) and take the `p` percentile.
pub fn percentile(values: &[f32], p: f32) -> f32 {
    let mut sorted: Vec<f32> = values.iter().copied().filter(|v| v.is_finite()).collect();
    sorted.sort_by(f32::total_cmp);
    percentile_sorted(&sorted, p)
}
