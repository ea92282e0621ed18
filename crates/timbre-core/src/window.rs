//! Window functions for frame-based spectral analysis.

use core::f32::consts::PI;

use libm::cosf;
use serde::{Deserialize, Serialize};

/// Window function kinds.
///
/// The cosine windows are periodic (denominator `N`, not `N - 1`), which is
/// what overlap-add needs for constant overlap.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WindowKind {
    /// No windowing.
    Rectangular,
    /// Hann (raised cosine).
    #[default]
    Hann,
    /// Hamming.
    Hamming,
    /// Blackman.
    Blackman,
    /// Kaiser with shape parameter `beta`.
    Kaiser {
        /// Shape parameter. 0 is rectangular; larger values trade main-lobe width
        /// for lower sidelobes.
        beta: f32,
    },
}

impl WindowKind {
    /// Window coefficient `i` of an `n`-point window.
    fn coefficient(self, i: usize, n: usize) -> f32 {
        let x = 2.0 * PI * i as f32 / n as f32;
        match self {
            WindowKind::Rectangular => 1.0,
            WindowKind::Hann => 0.5 * (1.0 - cosf(x)),
            WindowKind::Hamming => 0.54 - 0.46 * cosf(x),
            WindowKind::Blackman => 0.42 - 0.5 * cosf(x) + 0.08 * cosf(2.0 * x),
            WindowKind::Kaiser { beta } => {
                if n == 1 {
                    return 1.0;
                }
                let half = (n - 1) as f64 / 2.0;
                let r = (i as f64 - half) / half;
                let arg = f64::from(beta) * (1.0 - r * r).max(0.0).sqrt();
                (bessel_i0(arg) / bessel_i0(f64::from(beta))) as f32
            }
        }
    }
}

/// Generate `size` coefficients of the given window.
pub fn generate_window(kind: WindowKind, size: usize) -> Vec<f32> {
    (0..size).map(|i| kind.coefficient(i, size)).collect()
}

/// Element-wise product of `samples` and `window`, truncated to the shorter length.
pub fn apply_window(samples: &[f32], window: &[f32]) -> Vec<f32> {
    samples
        .iter()
        .zip(window.iter())
        .map(|(s, w)| s * w)
        .collect()
}

/// Zeroth-order modified Bessel function of the first kind.
///
/// Power series, stopped after 50 terms or once a term drops below `1e-10`.
pub fn bessel_i0(x: f64) -> f64 {
    let half_x = x / 2.0;
    let mut sum = 1.0;
    let mut term = 1.0;
    for k in 1..50 {
        let f = half_x / k as f64;
        term *= f * f;
        sum += term;
        if term < 1e-10 {
            break;
        }
    }
    sum
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hann_is_periodic() {
        let w = generate_window(WindowKind::Hann, 8);
        assert!(w[0].abs() < 1e-7);
        assert!((w[4] - 1.0).abs() < 1e-6);
        // periodic: w[1] == w[7]
        assert!((w[1] - w[7]).abs() < 1e-6);
    }

    #[test]
    fn hann_overlap_at_quarter_hop_is_constant() {
        let n = 64;
        let hop = n / 4;
        let w = generate_window(WindowKind::Hann, n);
        let sums: Vec<f32> = (0..hop)
            .map(|i| (0..4).map(|k| w[i + k * hop] * w[i + k * hop]).sum())
            .collect();
        for s in &sums {
            assert!((s - sums[0]).abs() < 1e-4);
        }
    }

    #[test]
    fn kaiser_zero_beta_is_rectangular() {
        let w = generate_window(WindowKind::Kaiser { beta: 0.0 }, 16);
        for c in w {
            assert!((c - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn kaiser_peaks_in_center() {
        let w = generate_window(WindowKind::Kaiser { beta: 8.6 }, 33);
        assert!((w[16] - 1.0).abs() < 1e-6);
        assert!(w[0] < 0.01);
        assert!((w[0] - w[32]).abs() < 1e-6);
    }

    #[test]
    fn bessel_known_values() {
        assert!((bessel_i0(0.0) - 1.0).abs() < 1e-12);
        assert!((bessel_i0(1.0) - 1.266_065_877_752_008).abs() < 1e-9);
    }

    #[test]
    fn apply_truncates_to_shorter() {
        let out = apply_window(&[1.0, 2.0, 3.0], &[0.5, 0.5]);
        assert_eq!(out, vec![0.5, 1.0]);
    }
}
