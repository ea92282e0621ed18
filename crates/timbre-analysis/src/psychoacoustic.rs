//! Psychoacoustic descriptors: perceptual bands, masking, tonality,
//! roughness, sharpness and loudness.
//!
//! Magnitudes are read as amplitudes referenced to 94 dB SPL at 1.0, the
//! usual calibration for uncalibrated digital input. The loudness figures
//! derived from that are estimates, not measured phons.

use libm::{expf, log10f, powf};
use serde::{Deserialize, Serialize};
use timbre_core::{DspError, FrequencyBand, Result, Spectrum, safe_ratio};

use crate::filterbank::{FilterBank, critical_band_energies};
use crate::spectral::spectral_flatness;

/// SPL assigned to a full-scale magnitude of 1.0.
pub const REFERENCE_SPL_DB: f32 = 94.0;

/// Share of a bin's own magnitude that it masks.
const SELF_MASKING: f32 = 0.01;

/// Terhardt's absolute threshold of hearing in dB SPL.
///
/// Frequencies below 20 Hz are evaluated at 20 Hz.
pub fn absolute_threshold_db(hz: f32) -> f32 {
    let khz = hz.max(20.0) / 1000.0;
    3.64 * powf(khz, -0.8) - 6.5 * expf(-0.6 * (khz - 3.3) * (khz - 3.3)) + 1e-3 * powf(khz, 4.0)
}

/// [`absolute_threshold_db`] converted to a linear magnitude on the 94 dB reference.
pub fn absolute_threshold_linear(hz: f32) -> f32 {
    powf(10.0, (absolute_threshold_db(hz) - REFERENCE_SPL_DB) / 20.0)
}

/// Stevens' power law, branching at 40 phons.
pub fn phons_to_sones(phons: f32) -> f32 {
    if phons >= 40.0 {
        powf(2.0, (phons - 40.0) / 10.0)
    } else if phons <= 0.0 {
        0.0
    } else {
        0.25 * powf(phons / 40.0, 2.5)
    }
}

/// Psychoacoustic descriptors for one spectrum.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PsychoacousticAnalysis {
    /// Output of the 24-band Bark bank.
    pub bark_bands: Vec<f32>,
    /// Output of the 26-band Mel bank.
    pub mel_bands: Vec<f32>,
    /// Root energy of each of the 24 critical bands.
    pub critical_bands: Vec<FrequencyBand>,
    /// Per-bin masking threshold (linear magnitude).
    pub masking_threshold: Vec<f32>,
    /// `1 - flatness`; 0 for silence.
    pub tonality: f32,
    /// Frequency-decayed adjacent Bark-band differences over total Bark energy.
    pub roughness: f32,
    /// Energy-weighted mean of the 4th power of the Bark band index.
    pub sharpness: f32,
    /// Estimated loudness level, phons (≥ 0).
    pub loudness_phons: f32,
    /// Estimated loudness, sones.
    pub loudness_sones: f32,
}

/// Psychoacoustic analyzer for a fixed `(sample_rate, fft_size)`.
///
/// Filter banks and the per-bin hearing threshold are computed once at
/// construction and reused for every spectrum of that configuration.
#[derive(Debug, Clone)]
pub struct PsychoacousticAnalyzer {
    bark: FilterBank,
    mel: FilterBank,
    /// Absolute threshold per bin, linear.
    ath: Vec<f32>,
    sample_rate: f32,
    fft_size: usize,
}

impl PsychoacousticAnalyzer {
    /// Precompute banks and thresholds.
    pub fn new(sample_rate: f32, fft_size: usize) -> Result<Self> {
        if fft_size < 2 || !fft_size.is_power_of_two() {
            return Err(DspError::NonPowerOfTwo(fft_size));
        }
        let bin_width = sample_rate / fft_size as f32;
        Ok(Self {
            bark: FilterBank::bark(sample_rate, fft_size),
            mel: FilterBank::mel(sample_rate, fft_size),
            ath: (0..fft_size / 2)
                .map(|k| absolute_threshold_linear(k as f32 * bin_width))
                .collect(),
            sample_rate,
            fft_size,
        })
    }

    /// The Bark bank in use.
    pub fn bark_bank(&self) -> &FilterBank {
        &self.bark
    }

    /// The Mel bank in use.
    pub fn mel_bank(&self) -> &FilterBank {
        &self.mel
    }

    /// Analyze a spectrum of this analyzer's configuration.
    pub fn analyze(&self, spectrum: &Spectrum) -> Result<PsychoacousticAnalysis> {
        if spectrum.sample_rate() != self.sample_rate {
            return Err(DspError::SampleRateMismatch {
                expected: self.sample_rate,
                found: spectrum.sample_rate(),
            });
        }
        if spectrum.fft_size() != self.fft_size {
            return Err(DspError::InvalidParameter {
                name: "fft_size",
                value: spectrum.fft_size() as f32,
                reason: "does not match the analyzer's filter banks",
            });
        }

        let mags = spectrum.magnitude();
        let bark_bands = self.bark.apply(mags);
        let mel_bands = self.mel.apply(mags);
        let critical_bands = critical_band_energies(mags, spectrum.bin_width());
        let masking_threshold = mags
            .iter()
            .zip(&self.ath)
            .map(|(&m, &ath)| ath.max(SELF_MASKING * m))
            .collect();

        let flatness = spectral_flatness(mags);
        let silent = mags.iter().all(|&m| m <= 0.0);
        let tonality = if silent { 0.0 } else { 1.0 - flatness };

        let loudness_phons = loudness_phons(&critical_bands);

        Ok(PsychoacousticAnalysis {
            roughness: roughness(&bark_bands),
            sharpness: sharpness(&bark_bands),
            loudness_sones: phons_to_sones(loudness_phons),
            loudness_phons,
            bark_bands,
            mel_bands,
            critical_bands,
            masking_threshold,
            tonality,
        })
    }
}

/// `Σ |b_i - b_{i-1}|·exp(-i/8) / Σ b`, 0 with no Bark energy.
pub fn roughness(bark_bands: &[f32]) -> f32 {
    let total: f32 = bark_bands.iter().sum();
    let weighted: f32 = bark_bands
        .windows(2)
        .enumerate()
        .map(|(i, w)| (w[1] - w[0]).abs() * expf(-((i + 1) as f32) / 8.0))
        .sum();
    safe_ratio(weighted, total)
}

/// `Σ(E_z · z⁴) / Σ E_z` with `z` the 1-based Bark band index.
pub fn sharpness(bark_bands: &[f32]) -> f32 {
    let total: f32 = bark_bands.iter().sum();
    let weighted: f32 = bark_bands
        .iter()
        .enumerate()
        .map(|(i, &e)| e * powf((i + 1) as f32, 4.0))
        .sum();
    safe_ratio(weighted, total)
}

/// Mean equal-loudness-corrected level over critical bands with energy.
///
/// Each band's SPL (`20·log10(E) + 94`) is shifted by the hearing threshold
/// difference between the band center and 1 kHz. Clamped at 0.
pub fn loudness_phons(critical_bands: &[FrequencyBand]) -> f32 {
    let reference = absolute_threshold_db(1000.0);
    let levels: Vec<f32> = critical_bands
        .iter()
        .filter(|b| b.energy > 0.0)
        .map(|b| {
            let spl = 20.0 * log10f(b.energy) + REFERENCE_SPL_DB;
            spl - absolute_threshold_db(b.center_hz()) + reference
        })
        .collect();
    if levels.is_empty() {
        return 0.0;
    }
    (levels.iter().sum::<f32>() / levels.len() as f32).max(0.0)
}
