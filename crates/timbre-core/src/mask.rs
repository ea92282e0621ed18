//! Per-bin spectral gain masks.

use serde::{Deserialize, Serialize};

/// Per-bin gains, each in `[0, 1]`.
///
/// Every constructor clamps, and non-finite gains become `0`, so no mask can
/// hold an out-of-range value. Masks are owned by one stem and never shared.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mask {
    gains: Vec<f32>,
}

#[inline]
fn clamp_gain(g: f32) -> f32 {
    if g.is_finite() { g.clamp(0.0, 1.0) } else { 0.0 }
}

impl Mask {
    /// Build from raw gains, clamping into `[0, 1]`.
    pub fn new(gains: Vec<f32>) -> Self {
        let mut gains = gains;
        for g in &mut gains {
            *g = clamp_gain(*g);
        }
        Self { gains }
    }

    /// Build by evaluating `f` for each bin index.
    pub fn from_fn(len: usize, f: impl FnMut(usize) -> f32) -> Self {
        Self::new((0..len).map(f).collect())
    }

    /// Same gain in every bin.
    pub fn uniform(len: usize, gain: f32) -> Self {
        Self {
            gains: vec![clamp_gain(gain); len],
        }
    }

    /// Number of bins.
    pub fn len(&self) -> usize {
        self.gains.len()
    }

    /// True for a zero-bin mask.
    pub fn is_empty(&self) -> bool {
        self.gains.is_empty()
    }

    /// Gain for `bin`, or `0` out of range.
    pub fn gain(&self, bin: usize) -> f32 {
        self.gains.get(bin).copied().unwrap_or(0.0)
    }

    /// The gains.
    pub fn as_slice(&self) -> &[f32] {
        &self.gains
    }

    /// `1 - g` for every bin.
    pub fn complement(&self) -> Self {
        Self::new(self.gains.iter().map(|g| 1.0 - g).collect())
    }

    /// Per-bin product with another mask (shorter length wins).
    pub fn multiply(&self, other: &Mask) -> Self {
        Self::new(
            self.gains
                .iter()
                .zip(&other.gains)
                .map(|(a, b)| a * b)
                .collect(),
        )
    }

    /// Scale every gain by `factor`, clamping the result.
    pub fn scaled(&self, factor: f32) -> Self {
        Self::new(self.gains.iter().map(|g| g * factor).collect())
    }

    /// Mean gain.
    pub fn mean(&self) -> f32 {
        if self.gains.is_empty() {
            0.0
        } else {
            self.gains.iter().sum::<f32>() / self.gains.len() as f32
        }
    }

    /// Take ownership of the gains.
    pub fn into_vec(self) -> Vec<f32> {
        self.gains
    }
}
