//! Magnitude/phase spectra of one analysis frame.

use num_complex::Complex32;

use crate::mask::Mask;
use crate::{DspError, Result};

/// The positive-frequency half of an `fft_size`-point transform.
///
/// `magnitude` and `phase` hold bins `0..fft_size / 2`. The Nyquist bin is
/// real-valued for real input and is kept apart in [`nyquist`](Self::nyquist).
/// That leaves the two arrays exactly half the transform size while still
/// allowing exact resynthesis.
///
/// Magnitudes are never negative.
#[derive(Debug, Clone, PartialEq)]
pub struct Spectrum {
    magnitude: Vec<f32>,
    phase: Vec<f32>,
    nyquist: f32,
    sample_rate: f32,
    fft_size: usize,
}

impl Spectrum {
    /// Assemble a spectrum from its parts.
    ///
    /// Both arrays must hold `fft_size / 2` entries. Negative or non-finite
    /// magnitudes are rejected.
    pub fn from_parts(
        magnitude: Vec<f32>,
        phase: Vec<f32>,
        nyquist: f32,
        sample_rate: f32,
        fft_size: usize,
    ) -> Result<Self> {
        if fft_size < 2 || !fft_size.is_power_of_two() {
            return Err(DspError::NonPowerOfTwo(fft_size));
        }
        let bins = fft_size / 2;
        if magnitude.len() != bins || phase.len() != bins {
            return Err(DspError::InvalidParameter {
                name: "spectrum length",
                value: magnitude.len().max(phase.len()) as f32,
                reason: "magnitude and phase must hold fft_size / 2 bins",
            });
        }
        if let Some(&bad) = magnitude.iter().find(|m| !(m.is_finite() && **m >= 0.0)) {
            return Err(DspError::InvalidParameter {
                name: "magnitude",
                value: bad,
                reason: "must be finite and non-negative",
            });
        }
        Ok(Self {
            magnitude,
            phase,
            nyquist,
            sample_rate,
            fft_size,
        })
    }

    /// Build from the `fft_size / 2 + 1` complex bins DC..=Nyquist.
    pub(crate) fn from_half_complex(bins: &[Complex32], sample_rate: f32, fft_size: usize) -> Self {
        let half = fft_size / 2;
        let magnitude = bins[..half].iter().map(|c| c.norm()).collect();
        let phase = bins[..half].iter().map(|c| c.arg()).collect();
        Self {
            magnitude,
            phase,
            nyquist: bins[half].re,
            sample_rate,
            fft_size,
        }
    }

    /// Per-bin magnitudes.
    pub fn magnitude(&self) -> &[f32] {
        &self.magnitude
    }

    /// Per-bin phases in radians, `(-π, π]`.
    pub fn phase(&self) -> &[f32] {
        &self.phase
    }

    /// Real value of the Nyquist bin.
    pub fn nyquist(&self) -> f32 {
        self.nyquist
    }

    /// Rate of the signal the spectrum was taken from.
    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Transform size that produced the spectrum.
    pub fn fft_size(&self) -> usize {
        self.fft_size
    }

    /// Bin count, always `fft_size / 2`.
    pub fn len(&self) -> usize {
        self.magnitude.len()
    }

    /// True only for a degenerate zero-bin spectrum.
    pub fn is_empty(&self) -> bool {
        self.magnitude.is_empty()
    }

    /// Width of one bin in Hz.
    pub fn bin_width(&self) -> f32 {
        self.sample_rate / self.fft_size as f32
    }

    /// Center frequency of `bin` in Hz.
    pub fn bin_to_freq(&self, bin: usize) -> f32 {
        bin as f32 * self.bin_width()
    }

    /// Nearest bin to `freq`, clamped to the valid range.
    pub fn freq_to_bin(&self, freq: f32) -> usize {
        let bin = (freq.max(0.0) / self.bin_width()).round() as usize;
        bin.min(self.len().saturating_sub(1))
    }

    /// Half the sample rate.
    pub fn nyquist_frequency(&self) -> f32 {
        self.sample_rate / 2.0
    }

    /// `(frequency, magnitude)` for every bin.
    pub fn bins(&self) -> impl Iterator<Item = (f32, f32)> + '_ {
        let width = self.bin_width();
        self.magnitude
            .iter()
            .enumerate()
            .map(move |(k, &m)| (k as f32 * width, m))
    }

    /// Sum of squared magnitudes.
    pub fn energy(&self) -> f32 {
        self.magnitude.iter().map(|m| m * m).sum()
    }

    /// Bin `k` as a complex value (`k == len()` yields the Nyquist bin).
    pub fn complex_bin(&self, k: usize) -> Complex32 {
        if k == self.len() {
            Complex32::new(self.nyquist, 0.0)
        } else {
            Complex32::from_polar(self.magnitude[k], self.phase[k])
        }
    }

    /// Multiply each bin's magnitude by the mask gain, keeping phases.
    ///
    /// The Nyquist bin takes the last bin's gain.
    pub fn apply_mask(mut self, mask: &Mask) -> Result<Self> {
        if mask.len() != self.len() {
            return Err(DspError::InvalidParameter {
                name: "mask length",
                value: mask.len() as f32,
                reason: "must match the spectrum bin count",
            });
        }
        for (m, g) in self.magnitude.iter_mut().zip(mask.as_slice()) {
            *m *= g;
        }
        self.nyquist *= mask.gain(mask.len().saturating_sub(1));
        Ok(self)
    }

    /// Rewrite magnitudes through `f(bin, magnitude)`, keeping phases.
    ///
    /// Results are clamped at zero; non-finite results become zero.
    pub fn map_magnitudes(mut self, mut f: impl FnMut(usize, f32) -> f32) -> Self {
        for (k, m) in self.magnitude.iter_mut().enumerate() {
            let v = f(k, *m);
            *m = if v.is_finite() { v.max(0.0) } else { 0.0 };
        }
        let last = self.len().saturating_sub(1);
        let scaled = f(last, self.nyquist.abs());
        self.nyquist = if scaled.is_finite() {
            scaled.max(0.0).copysign(self.nyquist)
        } else {
            0.0
        };
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat(fft_size: usize, value: f32) -> Spectrum {
        Spectrum::from_parts(
            vec![value; fft_size / 2],
            vec![0.0; fft_size / 2],
            value,
            48000.0,
            fft_size,
        )
        .unwrap()
    }

    #[test]
    fn bin_frequency_mapping() {
        let s = flat(1024, 1.0);
        assert_eq!(s.len(), 512);
        assert!((s.bin_width() - 46.875).abs() < 1e-4);
        assert_eq!(s.freq_to_bin(1000.0), 21);
        assert_eq!(s.freq_to_bin(1e9), 511);
        assert_eq!(s.nyquist_frequency(), 24000.0);
    }

    #[test]
    fn rejects_bad_parts() {
        assert!(Spectrum::from_parts(vec![1.0; 3], vec![0.0; 3], 0.0, 48000.0, 6).is_err());
        assert!(Spectrum::from_parts(vec![-1.0; 4], vec![0.0; 4], 0.0, 48000.0, 8).is_err());
        assert!(Spectrum::from_parts(vec![1.0; 3], vec![0.0; 4], 0.0, 48000.0, 8).is_err());
    }

    #[test]
    fn mask_scales_magnitudes() {
        let s = flat(8, 2.0);
        let masked = s.apply_mask(&Mask::uniform(4, 0.25)).unwrap();
        assert_eq!(masked.magnitude(), &[0.5; 4]);
        assert_eq!(masked.nyquist(), 0.5);
        assert!(flat(8, 1.0).apply_mask(&Mask::uniform(3, 1.0)).is_err());
    }

    #[test]
    fn map_magnitudes_never_goes_negative() {
        let s = flat(8, 1.0).map_magnitudes(|_, m| m - 5.0);
        assert!(s.magnitude().iter().all(|&m| m == 0.0));
    }
}
