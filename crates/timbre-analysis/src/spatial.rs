//! Stereo image analysis.
//!
//! Every metric is bounded and degenerate input (silence, one channel
//! empty, identical channels) produces 0 rather than NaN.

use core::f32::consts::PI;

use serde::{Deserialize, Serialize};
use timbre_core::{DspError, PcmBuffer, Result, rms, safe_ratio};

use crate::framing::Framer;

/// Bins quieter than this fraction of the frame's loudest bin are ignored
/// by phase coherence.
const COHERENCE_FLOOR: f32 = 1e-4;

/// Samples considered when searching for inter-channel delay.
const DELAY_SEARCH_WINDOW: usize = 1 << 16;

/// Default maximum lag searched for inter-channel delay, ms.
pub const DEFAULT_MAX_DELAY_MS: f32 = 5.0;

/// Position of the stereo image.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImageCenter {
    /// Left (-1) to right (+1).
    pub x: f32,
    /// Elevation. Never known from two channels.
    pub y: Option<f32>,
}

/// Stereo metrics of a left/right pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpatialAudioMetrics {
    /// Pearson correlation, `[-1, 1]`.
    pub correlation: f32,
    /// Mean per-bin phase agreement, `[0, 1]`.
    pub phase_coherence: f32,
    /// `RMS(side) / RMS(mid)`.
    pub stereo_width: f32,
    /// `side energy / (mid energy + side energy)`, `[0, 1]`.
    pub lateral_energy_fraction: f32,
    /// Balance point of the image.
    pub image_center: ImageCenter,
    /// `max(0, 1 - |correlation|)`.
    pub surround_energy: f32,
    /// `0.4·width + 0.3·(1 - coherence) + 0.3·surround`.
    pub immersiveness: f32,
    /// Lag of right relative to left at the cross-correlation peak, samples.
    /// Positive when the right channel lags.
    pub delay_samples: i32,
    /// `delay_samples` in milliseconds.
    pub delay_ms: f32,
}

/// Pearson correlation of two equal-length signals, clamped to `[-1, 1]`.
///
/// 0 when either signal has zero variance.
pub fn cross_correlation(left: &[f32], right: &[f32]) -> Result<f32> {
    if left.len() != right.len() {
        return Err(DspError::ChannelMismatch {
            left: left.len(),
            right: right.len(),
        });
    }
    if left.is_empty() {
        return Ok(0.0);
    }
    let n = left.len() as f64;
    let mean_l = left.iter().map(|&x| f64::from(x)).sum::<f64>() / n;
    let mean_r = right.iter().map(|&x| f64::from(x)).sum::<f64>() / n;
    let (mut cov, mut var_l, mut var_r) = (0.0f64, 0.0f64, 0.0f64);
    for (&l, &r) in left.iter().zip(right) {
        let dl = f64::from(l) - mean_l;
        let dr = f64::from(r) - mean_r;
        cov += dl * dr;
        var_l += dl * dl;
        var_r += dr * dr;
    }
    let denom = (var_l * var_r).sqrt();
    if denom <= 1e-20 || !denom.is_finite() {
        return Ok(0.0);
    }
    Ok((cov / denom).clamp(-1.0, 1.0) as f32)
}

/// Agreement of a phase difference: 1 for in phase, 0 for opposite phase.
fn phase_agreement(a: f32, b: f32) -> f32 {
    let two_pi = 2.0 * PI;
    let mut diff = (a - b).abs() % two_pi;
    if diff > PI {
        diff = two_pi - diff;
    }
    1.0 - diff / PI
}

/// Lag in `-max_lag..=max_lag` maximizing `Σ left[i]·right[i + lag]`.
///
/// Only the first 65536 samples are searched. Returns 0 for silence.
pub fn estimate_delay(left: &[f32], right: &[f32], max_lag: usize) -> i32 {
    let n = left.len().min(right.len()).min(DELAY_SEARCH_WINDOW);
    let (left, right) = (&left[..n], &right[..n]);
    let max_lag = max_lag.min(n.saturating_sub(1)) as isize;
    let mut best_lag = 0isize;
    let mut best = 0.0f64;
    for lag in -max_lag..=max_lag {
        let sum: f64 = if lag >= 0 {
            let lag = lag as usize;
            left[..n - lag]
                .iter()
                .zip(&right[lag..])
                .map(|(&l, &r)| f64::from(l) * f64::from(r))
                .sum()
        } else {
            let lag = (-lag) as usize;
            left[lag..]
                .iter()
                .zip(&right[..n - lag])
                .map(|(&l, &r)| f64::from(l) * f64::from(r))
                .sum()
        };
        if sum > best {
            best = sum;
            best_lag = lag;
        }
    }
    best_lag as i32
}

/// Stereo analyzer with a fixed phase-coherence frame size.
#[derive(Debug, Clone)]
pub struct SpatialAnalyzer {
    framer: Framer,
    max_delay_ms: f32,
}

impl SpatialAnalyzer {
    /// Analyzer computing phase coherence over `fft_size` frames.
    pub fn new(fft_size: usize) -> Result<Self> {
        Ok(Self {
            framer: Framer::new(fft_size)?,
            max_delay_ms: DEFAULT_MAX_DELAY_MS,
        })
    }

    /// Override the maximum lag searched for inter-channel delay.
    pub fn with_max_delay_ms(mut self, ms: f32) -> Self {
        self.max_delay_ms = ms.max(0.0);
        self
    }

    /// Mean phase agreement over every frame and every non-negligible bin.
    pub fn phase_coherence(&self, left: &[f32], right: &[f32], sample_rate: f32) -> Result<f32> {
        let l = self.framer.spectra(left, sample_rate)?;
        let r = self.framer.spectra(right, sample_rate)?;
        let mut total = 0.0f64;
        let mut count = 0usize;
        for (sl, sr) in l.iter().zip(&r) {
            let peak = sl
                .magnitude()
                .iter()
                .chain(sr.magnitude())
                .copied()
                .fold(0.0f32, f32::max);
            let floor = peak * COHERENCE_FLOOR;
            if peak <= 0.0 {
                continue;
            }
            for k in 0..sl.len() {
                if sl.magnitude()[k] > floor && sr.magnitude()[k] > floor {
                    total += f64::from(phase_agreement(sl.phase()[k], sr.phase()[k]));
                    count += 1;
                }
            }
        }
        Ok(if count == 0 {
            0.0
        } else {
            (total / count as f64) as f32
        })
    }

    /// Analyze an equal-length left/right pair.
    pub fn analyze(
        &self,
        left: &[f32],
        right: &[f32],
        sample_rate: f32,
    ) -> Result<SpatialAudioMetrics> {
        let correlation = cross_correlation(left, right)?;
        let phase_coherence = self.phase_coherence(left, right, sample_rate)?;

        let mid: Vec<f32> = left.iter().zip(right).map(|(l, r)| (l + r) * 0.5).collect();
        let side: Vec<f32> = left.iter().zip(right).map(|(l, r)| (l - r) * 0.5).collect();
        let (rms_mid, rms_side) = (rms(&mid), rms(&side));
        let stereo_width = safe_ratio(rms_side, rms_mid);
        let (mid_energy, side_energy) = (rms_mid * rms_mid, rms_side * rms_side);
        let lateral_energy_fraction = safe_ratio(side_energy, mid_energy + side_energy);

        let (rms_l, rms_r) = (rms(left), rms(right));
        let x = safe_ratio(rms_r - rms_l, rms_r + rms_l).clamp(-1.0, 1.0);

        let surround_energy = (1.0 - correlation.abs()).max(0.0);
        let immersiveness =
            0.4 * stereo_width + 0.3 * (1.0 - phase_coherence) + 0.3 * surround_energy;

        let max_lag = (self.max_delay_ms * sample_rate / 1000.0) as usize;
        let delay_samples = estimate_delay(left, right, max_lag);

        Ok(SpatialAudioMetrics {
            correlation,
            phase_coherence,
            stereo_width,
            lateral_energy_fraction,
            image_center: ImageCenter { x, y: None },
            surround_energy,
            immersiveness,
            delay_samples,
            delay_ms: delay_samples as f32 * 1000.0 / sample_rate,
        })
    }

    /// Analyze a two-channel buffer.
    pub fn analyze_buffer(&self, buffer: &PcmBuffer) -> Result<SpatialAudioMetrics> {
        let (left, right) = buffer.stereo_pair()?;
        self.analyze(left, right, buffer.sample_rate())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(freq: f32, sr: f32, len: usize, phase: f32) -> Vec<f32> {
        (0..len)
            .map(|i| (2.0 * PI * freq * i as f32 / sr + phase).sin())
            .collect()
    }

    #[test]
    fn correlation_of_identical_and_inverted() {
        let x = sine(440.0, 48000.0, 4800, 0.0);
        let inv: Vec<f32> = x.iter().map(|v| -v).collect();
        assert!((cross_correlation(&x, &x).unwrap() - 1.0).abs() < 1e-6);
        assert!((cross_correlation(&x, &inv).unwrap() + 1.0).abs() < 1e-6);
    }

    #[test]
    fn correlation_of_silence_is_zero() {
        assert_eq!(cross_correlation(&[0.0; 64], &[0.0; 64]).unwrap(), 0.0);
        assert_eq!(cross_correlation(&[1.0; 64], &[0.5; 64]).unwrap(), 0.0);
    }

    #[test]
    fn correlation_rejects_length_mismatch() {
        assert_eq!(
            cross_correlation(&[0.0; 3], &[0.0; 4]).unwrap_err(),
            DspError::ChannelMismatch { left: 3, right: 4 }
        );
    }

    #[test]
    fn phase_agreement_folds() {
        assert!((phase_agreement(0.1, 0.1) - 1.0).abs() < 1e-6);
        assert!(phase_agreement(PI, 0.0).abs() < 1e-6);
        assert!((phase_agreement(-3.0, 3.0) - phase_agreement(0.0, 2.0 * PI - 6.0)).abs() < 1e-5);
    }

    #[test]
    fn mono_signal_is_narrow_and_coherent() {
        let a = SpatialAnalyzer::new(1024).unwrap();
        let x = sine(1000.0, 48000.0, 8192, 0.0);
        let m = a.analyze(&x, &x, 48000.0).unwrap();
        assert!((m.correlation - 1.0).abs() < 1e-5);
        assert!(m.phase_coherence > 0.999);
        assert_eq!(m.stereo_width, 0.0);
        assert_eq!(m.lateral_energy_fraction, 0.0);
        assert!(m.image_center.x.abs() < 1e-6);
        assert!(m.image_center.y.is_none());
        assert!(m.surround_energy < 1e-5);
        assert_eq!(m.delay_samples, 0);
    }

    #[test]
    fn hard_right_pans_center() {
        let a = SpatialAnalyzer::new(512).unwrap();
        let x = sine(500.0, 48000.0, 4096, 0.0);
        let m = a.analyze(&[0.0; 4096], &x, 48000.0).unwrap();
        assert!((m.image_center.x - 1.0).abs() < 1e-6);
        assert_eq!(m.correlation, 0.0);
        assert!((m.lateral_energy_fraction - 0.5).abs() < 1e-5);
    }

    #[test]
    fn delay_is_found() {
        let x: Vec<f32> = (0..4000).map(|i| ((i * 7919) % 97) as f32 / 97.0 - 0.5).collect();
        let mut delayed = vec![0.0; 12];
        delayed.extend_from_slice(&x[..x.len() - 12]);
        assert_eq!(estimate_delay(&x, &delayed, 40), 12);
        assert_eq!(estimate_delay(&delayed, &x, 40), -12);
    }

    #[test]
    fn silence_gives_zero_metrics() {
        let a = SpatialAnalyzer::new(256).unwrap();
        let m = a.analyze(&[0.0; 1024], &[0.0; 1024], 8000.0).unwrap();
        assert_eq!(m.correlation, 0.0);
        assert_eq!(m.phase_coherence, 0.0);
        assert_eq!(m.stereo_width, 0.0);
        assert_eq!(m.image_center.x, 0.0);
        assert!(m.immersiveness.is_finite());
    }
}
