//! Perceptual filter banks over FFT bins.
//!
//! Bark and Mel banks are triangular in their own scale: filter centers are
//! equally spaced between the scale values of 0 Hz and Nyquist, and each
//! bin's weight falls linearly to zero one center-spacing away. Weights are
//! computed once per `(sample_rate, fft_size)` and stored sparsely.
//!
//! Critical bands are the fixed 24 Zwicker bands, summed as root energy.

use libm::{atanf, log10f, powf};
use timbre_core::FrequencyBand;

/// Bark bands in the standard bank.
pub const BARK_BANDS: usize = 24;
/// Mel bands in the standard bank.
pub const MEL_BANDS: usize = 26;

/// Edges of the 24 critical bands, Hz.
pub const CRITICAL_BAND_EDGES: [f32; 25] = [
    0.0, 100.0, 200.0, 300.0, 400.0, 510.0, 630.0, 770.0, 920.0, 1080.0, 1270.0, 1480.0, 1720.0,
    2000.0, 2320.0, 2700.0, 3150.0, 3700.0, 4400.0, 5300.0, 6400.0, 7700.0, 9500.0, 12000.0,
    15500.0,
];

/// Zwicker–Terhardt Bark mapping: `13·atan(0.00076 f) + 3.5·atan((f / 7500)²)`.
pub fn hz_to_bark(hz: f32) -> f32 {
    let r = hz / 7500.0;
    13.0 * atanf(0.00076 * hz) + 3.5 * atanf(r * r)
}

/// O'Shaughnessy Mel mapping: `2595·log10(1 + f / 700)`.
pub fn hz_to_mel(hz: f32) -> f32 {
    2595.0 * log10f(1.0 + hz / 700.0)
}

/// Inverse of [`hz_to_mel`].
pub fn mel_to_hz(mel: f32) -> f32 {
    700.0 * (powf(10.0, mel / 2595.0) - 1.0)
}

/// Which perceptual scale a bank is built on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scale {
    /// Bark (critical-band rate).
    Bark,
    /// Mel.
    Mel,
}

impl Scale {
    fn map(self, hz: f32) -> f32 {
        match self {
            Scale::Bark => hz_to_bark(hz),
            Scale::Mel => hz_to_mel(hz),
        }
    }
}

/// A precomputed bank of triangular filters over FFT bins.
#[derive(Debug, Clone)]
pub struct FilterBank {
    scale: Scale,
    /// Per filter: `(bin, weight)` pairs with non-zero weight.
    filters: Vec<Vec<(usize, f32)>>,
    /// Filter centers in scale units.
    centers: Vec<f32>,
    sample_rate: f32,
    fft_size: usize,
}

impl FilterBank {
    /// `bands` triangular filters on `scale` for an `fft_size`-point spectrum.
    pub fn new(scale: Scale, bands: usize, sample_rate: f32, fft_size: usize) -> Self {
        let bins = fft_size / 2;
        let bin_width = sample_rate / fft_size as f32;
        let lo = scale.map(0.0);
        let hi = scale.map(sample_rate / 2.0);
        let spacing = (hi - lo) / (bands + 1) as f32;
        let centers: Vec<f32> = (1..=bands).map(|i| lo + spacing * i as f32).collect();
        let bin_scale: Vec<f32> = (0..bins).map(|k| scale.map(k as f32 * bin_width)).collect();

        let filters = centers
            .iter()
            .map(|&center| {
                bin_scale
                    .iter()
                    .enumerate()
                    .filter_map(|(k, &z)| {
                        let w = 1.0 - (z - center).abs() / spacing;
                        (w > 0.0).then_some((k, w))
                    })
                    .collect()
            })
            .collect();

        Self {
            scale,
            filters,
            centers,
            sample_rate,
            fft_size,
        }
    }

    /// The 24-band Bark bank.
    pub fn bark(sample_rate: f32, fft_size: usize) -> Self {
        Self::new(Scale::Bark, BARK_BANDS, sample_rate, fft_size)
    }

    /// The 26-band Mel bank.
    pub fn mel(sample_rate: f32, fft_size: usize) -> Self {
        Self::new(Scale::Mel, MEL_BANDS, sample_rate, fft_size)
    }

    /// Scale the bank was built on.
    pub fn scale(&self) -> Scale {
        self.scale
    }

    /// Number of filters.
    pub fn len(&self) -> usize {
        self.filters.len()
    }

    /// True for a bank with no filters.
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Filter centers in scale units.
    pub fn centers(&self) -> &[f32] {
        &self.centers
    }

    /// Whether the bank was built for this configuration.
    pub fn matches(&self, sample_rate: f32, fft_size: usize) -> bool {
        self.sample_rate == sample_rate && self.fft_size == fft_size
    }

    /// Weighted sum of `magnitudes` under each filter.
    pub fn apply(&self, magnitudes: &[f32]) -> Vec<f32> {
        self.filters
            .iter()
            .map(|filter| {
                filter
                    .iter()
                    .filter_map(|&(k, w)| magnitudes.get(k).map(|m| m * w))
                    .sum()
            })
            .collect()
    }
}

/// Root energy `sqrt(Σ m²)` in each critical band.
pub fn critical_band_energies(magnitudes: &[f32], bin_width: f32) -> Vec<FrequencyBand> {
    CRITICAL_BAND_EDGES
        .windows(2)
        .map(|edge| {
            let band = FrequencyBand::new(edge[0], edge[1]);
            let energy: f32 = magnitudes
                .iter()
                .enumerate()
                .filter(|&(k, _)| band.contains(k as f32 * bin_width))
                .map(|(_, m)| m * m)
                .sum();
            band.with_energy(energy.sqrt())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scale_mappings() {
        assert!((hz_to_mel(1000.0) - 1000.0).abs() < 1.0);
        assert!((mel_to_hz(hz_to_mel(4321.0)) - 4321.0).abs() < 0.5);
        assert!((hz_to_bark(1000.0) - 8.5).abs() < 0.1);
        assert_eq!(hz_to_bark(0.0), 0.0);
    }

    #[test]
    fn banks_have_standard_sizes() {
        let bark = FilterBank::bark(44100.0, 2048);
        let mel = FilterBank::mel(44100.0, 2048);
        assert_eq!(bark.len(), 24);
        assert_eq!(mel.len(), 26);
        assert!(bark.matches(44100.0, 2048));
        assert!(!bark.matches(48000.0, 2048));
    }

    #[test]
    fn each_filter_peaks_near_one() {
        let mel = FilterBank::mel(44100.0, 8192);
        for filter in &mel.filters {
            let max = filter.iter().map(|&(_, w)| w).fold(0.0f32, f32::max);
            assert!(max > 0.8 && max <= 1.0, "{max}");
        }
    }

    #[test]
    fn flat_spectrum_fills_every_critical_band() {
        let bands = critical_band_energies(&[1.0; 1024], 22050.0 / 1024.0);
        assert_eq!(bands.len(), 24);
        assert!(bands.iter().all(|b| b.energy > 0.0));
        assert_eq!(bands[0].low_hz, 0.0);
        assert_eq!(bands[23].high_hz, 15500.0);
    }
}
