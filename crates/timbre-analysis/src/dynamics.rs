//! Level and loudness analysis
//!
//! Levels in dB are floored at [`DB_FLOOR`] (-120 dB), never `-inf`.
//! Loudness follows the BS.1770 shape without K-weighting or gating of the
//! integrated value: `-0.691 + 10·log10(Σ_channels mean square)`. That is an
//! approximation of LUFS, not a certified meter.

use serde::{Deserialize, Serialize};
use timbre_core::{DB_FLOOR, DspError, PcmBuffer, Result, linear_to_db, mean_square, percentile};

/// Momentary loudness window, seconds.
pub const MOMENTARY_WINDOW_SECS: f32 = 0.4;
/// Short-term loudness window, seconds.
pub const SHORT_TERM_WINDOW_SECS: f32 = 3.0;
/// Loudness-range block length, seconds.
pub const LRA_BLOCK_SECS: f32 = 3.0;
/// Loudness-range block hop, seconds.
pub const LRA_HOP_SECS: f32 = 1.0;
/// Blocks at or below this loudness are gated out of the loudness range.
pub const LRA_GATE_LUFS: f32 = -70.0;
/// True-peak oversampling factor.
pub const TRUE_PEAK_OVERSAMPLING: usize = 4;
/// Levels at or below this are treated as silence in dynamic-range ratios.
const LEVEL_FLOOR: f32 = 1e-6;

/// Level and loudness figures of a buffer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DynamicsAnalysis {
    /// Sample peak across channels, dBFS.
    pub peak_db: f32,
    /// RMS over all channels, dBFS.
    pub rms_db: f32,
    /// `peak_db - rms_db`.
    pub crest_factor_db: f32,
    /// Peak of the 4× interpolated signal, dBFS.
    pub true_peak_db: f32,
    /// Loudness of the trailing 400 ms.
    pub momentary_lufs: f32,
    /// Loudness of the trailing 3 s.
    pub short_term_lufs: f32,
    /// Loudness of the whole buffer.
    pub integrated_lufs: f32,
    /// `20·log10(p99 / p1)` of absolute sample levels.
    pub dynamic_range_db: f32,
    /// `p95 - p10` of gated 3 s block loudness, LU.
    pub loudness_range_lu: f32,
}

/// Maximum absolute sample.
pub fn peak(samples: &[f32]) -> f32 {
    samples.iter().fold(0.0f32, |m, x| m.max(x.abs()))
}

/// Maximum absolute value after linear interpolation by `factor`.
///
/// Linear interpolation never overshoots its endpoints, so this equals the
/// sample peak; the oversampling is kept so the figure has a defined method.
pub fn true_peak(samples: &[f32], factor: usize) -> f32 {
    let factor = factor.max(1);
    let mut max = samples.last().map_or(0.0, |x| x.abs());
    for pair in samples.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        for j in 0..factor {
            let t = j as f32 / factor as f32;
            max = max.max((a + (b - a) * t).abs());
        }
    }
    max
}

/// `-0.691 + 10·log10(mean_square)`, floored at [`DB_FLOOR`].
pub fn loudness_from_power(mean_square: f32) -> f32 {
    if mean_square <= 0.0 || !mean_square.is_finite() {
        return DB_FLOOR;
    }
    (-0.691 + 10.0 * mean_square.log10()).max(DB_FLOOR)
}

/// Loudness of `range` in every channel, channel powers summed.
fn window_loudness(channels: &[Vec<f32>], start: usize, end: usize) -> f32 {
    let power: f32 = channels.iter().map(|c| mean_square(&c[start..end])).sum();
    loudness_from_power(power)
}

/// Loudness of the last `window` samples (or everything, if shorter).
fn trailing_loudness(channels: &[Vec<f32>], window: usize) -> f32 {
    let len = channels.first().map_or(0, Vec::len);
    window_loudness(channels, len.saturating_sub(window), len)
}

/// Dynamic range of absolute sample levels in dB.
///
/// 0 when the 99th percentile is at the silence floor.
pub fn dynamic_range_db(samples: &[f32]) -> f32 {
    let levels: Vec<f32> = samples.iter().map(|x| x.abs()).collect();
    let p1 = percentile(&levels, 0.01);
    let p99 = percentile(&levels, 0.99);
    if p99 <= LEVEL_FLOOR {
        return 0.0;
    }
    20.0 * (p99 / p1.max(LEVEL_FLOOR)).log10()
}

/// Loudness range over 3-second blocks hopped by 1 second.
///
/// 0 with fewer than two blocks above the gate.
pub fn loudness_range(channels: &[Vec<f32>], sample_rate: f32) -> f32 {
    let len = channels.first().map_or(0, Vec::len);
    let block = (LRA_BLOCK_SECS * sample_rate) as usize;
    let hop = ((LRA_HOP_SECS * sample_rate) as usize).max(1);
    if block == 0 || len < block {
        return 0.0;
    }
    let blocks: Vec<f32> = (0..=(len - block) / hop)
        .map(|i| window_loudness(channels, i * hop, i * hop + block))
        .filter(|&l| l > LRA_GATE_LUFS)
        .collect();
    if blocks.len() < 2 {
        return 0.0;
    }
    percentile(&blocks, 0.95) - percentile(&blocks, 0.10)
}

/// Analyze levels and loudness of every channel of `buffer`.
pub fn analyze_dynamics(buffer: &PcmBuffer) -> Result<DynamicsAnalysis> {
    if buffer.is_empty() {
        return Err(DspError::EmptyBuffer);
    }
    let channels = buffer.channels();
    let sr = buffer.sample_rate();

    let peak_lin = channels.iter().map(|c| peak(c)).fold(0.0f32, f32::max);
    let true_peak_lin = channels
        .iter()
        .map(|c| true_peak(c, TRUE_PEAK_OVERSAMPLING))
        .fold(0.0f32, f32::max);
    let all_ms = channels.iter().map(|c| mean_square(c)).sum::<f32>() / channels.len() as f32;
    let rms_db = linear_to_db(all_ms.sqrt());
    let peak_db = linear_to_db(peak_lin);

    let all_samples: Vec<f32> = channels.iter().flatten().copied().collect();

    Ok(DynamicsAnalysis {
        peak_db,
        rms_db,
        crest_factor_db: peak_db - rms_db,
        true_peak_db: linear_to_db(true_peak_lin),
        momentary_lufs: trailing_loudness(channels, (MOMENTARY_WINDOW_SECS * sr) as usize),
        short_term_lufs: trailing_loudness(channels, (SHORT_TERM_WINDOW_SECS * sr) as usize),
        integrated_lufs: window_loudness(channels, 0, buffer.len()),
        dynamic_range_db: dynamic_range_db(&all_samples),
        loudness_range_lu: loudness_range(channels, sr),
    })
}
