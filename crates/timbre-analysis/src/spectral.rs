//! Spectral descriptors: centroid, bandwidth, rolloff, flux, peaks, harmonicity.
//!
//! The free functions are stateless over one [`Spectrum`]. [`SpectralAnalyzer`]
//! bundles them and owns the previous magnitude spectrum needed for flux,
//! so each stream gets its own analyzer.

use serde::{Deserialize, Serialize};
use timbre_core::{Spectrum, safe_ratio};

/// Default rolloff fraction.
pub const DEFAULT_ROLLOFF: f32 = 0.85;
/// Default peak threshold, relative to the global maximum.
pub const DEFAULT_PEAK_THRESHOLD: f32 = 0.1;
/// Peaks kept by [`find_peaks`].
pub const MAX_PEAKS: usize = 20;
/// Relative tolerance for two peaks to count as an integer ratio.
pub const HARMONIC_RATIO_TOLERANCE: f32 = 0.05;

/// A local maximum of the magnitude spectrum.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpectralPeak {
    /// Bin index.
    pub bin: usize,
    /// Bin center in Hz.
    pub frequency: f32,
    /// Magnitude at the bin.
    pub magnitude: f32,
}

/// Descriptors of one spectrum.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpectralAnalysisResult {
    /// Magnitude-weighted mean frequency, Hz.
    pub centroid: f32,
    /// Magnitude-weighted spread around the centroid, Hz.
    pub bandwidth: f32,
    /// Frequency holding 85% of the energy below it, Hz.
    pub rolloff: f32,
    /// RMS change from the previous spectrum on this analyzer (0 on first call).
    pub flux: f32,
    /// Geometric over arithmetic mean of magnitudes, `[0, 1]`.
    pub flatness: f32,
    /// Strongest local maxima, descending by magnitude.
    pub peaks: Vec<SpectralPeak>,
    /// Share of peak pairs near an integer frequency ratio, `[0, 1]`.
    pub harmonicity: f32,
}

/// `Σ(f·m) / Σm`, or 0 for an all-zero spectrum.
pub fn spectral_centroid(spectrum: &Spectrum) -> f32 {
    let (weighted, total) = spectrum
        .bins()
        .fold((0.0f64, 0.0f64), |(w, t), (f, m)| {
            (w + f64::from(f) * f64::from(m), t + f64::from(m))
        });
    if total <= 0.0 {
        0.0
    } else {
        (weighted / total) as f32
    }
}

/// `sqrt(Σ((f - centroid)²·m) / Σm)`.
pub fn spectral_bandwidth(spectrum: &Spectrum, centroid: f32) -> f32 {
    let (weighted, total) = spectrum.bins().fold((0.0f64, 0.0f64), |(w, t), (f, m)| {
        let d = f64::from(f - centroid);
        (w + d * d * f64::from(m), t + f64::from(m))
    });
    if total <= 0.0 {
        0.0
    } else {
        (weighted / total).sqrt() as f32
    }
}

/// Lowest frequency below which `fraction` of the squared-magnitude energy lies.
///
/// Returns the Nyquist frequency when the threshold is never reached, which
/// includes an all-zero spectrum.
pub fn spectral_rolloff(spectrum: &Spectrum, fraction: f32) -> f32 {
    let total = spectrum.energy();
    if total <= 0.0 {
        return spectrum.nyquist_frequency();
    }
    let threshold = total * fraction.clamp(0.0, 1.0);
    let mut cumulative = 0.0;
    for (k, &m) in spectrum.magnitude().iter().enumerate() {
        cumulative += m * m;
        if cumulative >= threshold {
            return spectrum.bin_to_freq(k);
        }
    }
    spectrum.nyquist_frequency()
}

/// `sqrt(mean((current - previous)²))` over the common bins.
pub fn spectral_flux(previous: &[f32], current: &[f32]) -> f32 {
    let n = previous.len().min(current.len());
    if n == 0 {
        return 0.0;
    }
    let sum: f32 = previous
        .iter()
        .zip(current)
        .map(|(p, c)| (c - p) * (c - p))
        .sum();
    (sum / n as f32).sqrt()
}

/// Geometric mean over arithmetic mean of `magnitudes`.
///
/// 0 for silence, close to 1 for white noise, close to 0 for a pure tone.
pub fn spectral_flatness(magnitudes: &[f32]) -> f32 {
    if magnitudes.is_empty() {
        return 0.0;
    }
    let n = magnitudes.len() as f64;
    let arithmetic = magnitudes.iter().map(|&m| f64::from(m)).sum::<f64>() / n;
    if arithmetic <= 1e-10 {
        return 0.0;
    }
    let log_mean = magnitudes
        .iter()
        .map(|&m| f64::from(m).max(1e-10).ln())
        .sum::<f64>()
        / n;
    (log_mean.exp() / arithmetic).clamp(0.0, 1.0) as f32
}

/// Local maxima above `threshold × global max`, strongest first, at most `max_peaks`.
pub fn find_peaks(spectrum: &Spectrum, threshold: f32, max_peaks: usize) -> Vec<SpectralPeak> {
    let mags = spectrum.magnitude();
    let global_max = mags.iter().copied().fold(0.0f32, f32::max);
    if global_max <= 0.0 || mags.len() < 3 {
        return Vec::new();
    }
    let floor = threshold * global_max;
    let mut peaks: Vec<SpectralPeak> = (1..mags.len() - 1)
        .filter(|&k| mags[k] > floor && mags[k] > mags[k - 1] && mags[k] >= mags[k + 1])
        .map(|k| SpectralPeak {
            bin: k,
            frequency: spectrum.bin_to_freq(k),
            magnitude: mags[k],
        })
        .collect();
    peaks.sort_by(|a, b| b.magnitude.total_cmp(&a.magnitude));
    peaks.truncate(max_peaks);
    peaks
}

/// Fraction of peak pairs whose frequency ratio sits within 5% of an integer ≥ 2.
///
/// 0 when fewer than two peaks are given.
pub fn harmonicity(peaks: &[SpectralPeak]) -> f32 {
    let mut pairs = 0usize;
    let mut harmonic = 0usize;
    for (i, a) in peaks.iter().enumerate() {
        for b in &peaks[i + 1..] {
            pairs += 1;
            let (lo, hi) = if a.frequency <= b.frequency {
                (a.frequency, b.frequency)
            } else {
                (b.frequency, a.frequency)
            };
            if lo <= 0.0 {
                continue;
            }
            let ratio = hi / lo;
            let nearest = ratio.round();
            if nearest >= 2.0 && (ratio - nearest).abs() / nearest <= HARMONIC_RATIO_TOLERANCE {
                harmonic += 1;
            }
        }
    }
    safe_ratio(harmonic as f32, pairs as f32)
}

/// Spectral analyzer for one stream.
///
/// Holds the previous magnitude spectrum so consecutive calls report flux.
/// Not meant to be shared between streams: give each stream its own.
#[derive(Debug, Clone)]
pub struct SpectralAnalyzer {
    rolloff_fraction: f32,
    peak_threshold: f32,
    max_peaks: usize,
    previous: Option<Vec<f32>>,
}

impl Default for SpectralAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl SpectralAnalyzer {
    /// Analyzer with the default rolloff (0.85), peak threshold (0.1) and 20 peaks.
    pub fn new() -> Self {
        Self {
            rolloff_fraction: DEFAULT_ROLLOFF,
            peak_threshold: DEFAULT_PEAK_THRESHOLD,
            max_peaks: MAX_PEAKS,
            previous: None,
        }
    }

    /// Override the rolloff fraction.
    pub fn with_rolloff(mut self, fraction: f32) -> Self {
        self.rolloff_fraction = fraction.clamp(0.0, 1.0);
        self
    }

    /// Override the relative peak threshold.
    pub fn with_peak_threshold(mut self, threshold: f32) -> Self {
        self.peak_threshold = threshold.max(0.0);
        self
    }

    /// Compute every descriptor and remember this spectrum for the next flux.
    pub fn analyze(&mut self, spectrum: &Spectrum) -> SpectralAnalysisResult {
        let centroid = spectral_centroid(spectrum);
        let peaks = find_peaks(spectrum, self.peak_threshold, self.max_peaks);
        let flux = self
            .previous
            .as_deref()
            .map_or(0.0, |prev| spectral_flux(prev, spectrum.magnitude()));
        self.previous = Some(spectrum.magnitude().to_vec());

        SpectralAnalysisResult {
            centroid,
            bandwidth: spectral_bandwidth(spectrum, centroid),
            rolloff: spectral_rolloff(spectrum, self.rolloff_fraction),
            flux,
            flatness: spectral_flatness(spectrum.magnitude()),
            harmonicity: harmonicity(&peaks),
            peaks,
        }
    }

    /// Forget the previous spectrum; the next call reports zero flux.
    pub fn reset(&mut self) {
        self.previous = None;
    }
}
