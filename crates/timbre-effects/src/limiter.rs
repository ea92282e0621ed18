//! Brickwall lookahead limiter with exponential release.
//!
//! # Algorithm
//!
//! 1. **Linked peak**: per sample, the maximum absolute value across
//!    channels, so every channel receives identical gain reduction.
//! 2. **Lookahead**: the detector sees the peak of the next
//!    `lookahead + 1` samples (a sliding-window maximum), so gain is already
//!    down when a transient arrives.
//! 3. **Gain computation**: `target = ceiling / peak` when the peak exceeds
//!    the ceiling, else 1.
//! 4. **Smoothing**: instant attack (follow the target down immediately),
//!    one-pole release back up:
//!    `g[n] = target` if `target < g[n-1]`, else
//!    `g[n] = c·g[n-1] + (1 - c)·target`.
//!
//! Because `g[n]` never exceeds the target computed from a window that
//! contains sample `n`, `|x[n]·g[n]| ≤ ceiling` for every sample: there is
//! no overshoot.
//!
//! Whole buffers are processed at once, so the lookahead window simply reads
//! ahead and the output is time-aligned with the input.

use std::collections::VecDeque;

use timbre_config::LimiterSettings;
use timbre_core::{
    Effect, PcmBuffer, Result, Stage, db_to_linear, ms_to_samples, time_constant_coeff,
};

/// Longest accepted lookahead, ms.
pub const MAX_LOOKAHEAD_MS: f32 = 20.0;

/// Lookahead brickwall limiter.
///
/// # Example
///
/// ```rust
/// use timbre_core::{Effect, PcmBuffer};
/// use timbre_effects::Limiter;
///
/// let mut lim = Limiter::new(-1.0, 50.0, 5.0, 48000.0);
/// let hot = PcmBuffer::mono(vec![2.0; 1000], 48000.0).unwrap();
/// let out = lim.process(&hot).unwrap();
/// let ceiling = timbre_core::db_to_linear(-1.0);
/// assert!(out.channel(0).unwrap().iter().all(|x| x.abs() <= ceiling + 1e-6));
/// ```
#[derive(Debug, Clone)]
pub struct Limiter {
    ceiling: f32,
    release_coeff: f32,
    lookahead: usize,
    /// Gain carried over between buffers.
    gain: f32,
}

impl Limiter {
    /// Limiter with ceiling in dBFS (clamped to `[-24, 0]`), release and
    /// lookahead in ms.
    pub fn new(ceiling_db: f32, release_ms: f32, lookahead_ms: f32, sample_rate: f32) -> Self {
        let lookahead_ms = lookahead_ms.clamp(0.0, MAX_LOOKAHEAD_MS);
        Self {
            ceiling: db_to_linear(ceiling_db.clamp(-24.0, 0.0)),
            release_coeff: time_constant_coeff(release_ms, sample_rate),
            lookahead: ms_to_samples(lookahead_ms, sample_rate) as usize,
            gain: 1.0,
        }
    }

    /// Build from settings.
    pub fn from_settings(settings: &LimiterSettings, sample_rate: f32) -> Self {
        Self::new(
            settings.ceiling_db,
            settings.release_ms,
            settings.lookahead_ms,
            sample_rate,
        )
    }

    /// Linear ceiling.
    pub fn ceiling(&self) -> f32 {
        self.ceiling
    }

    /// Lookahead in samples.
    pub fn lookahead_samples(&self) -> usize {
        self.lookahead
    }

    /// Per-sample gain for a linked peak signal.
    fn gains(&mut self, peaks: &[f32]) -> Vec<f32> {
        forward_max(peaks, self.lookahead)
            .into_iter()
            .map(|peak| {
                let target = if peak > self.ceiling {
                    self.ceiling / peak
                } else {
                    1.0
                };
                self.gain = if target < self.gain {
                    target
                } else {
                    self.release_coeff * self.gain + (1.0 - self.release_coeff) * target
                };
                self.gain
            })
            .collect()
    }
}

/// `out[i] = max(values[i..=i + window])`, truncated at the end.
///
/// Monotonic deque; O(n) regardless of `window`.
fn forward_max(values: &[f32], window: usize) -> Vec<f32> {
    let n = values.len();
    let mut out = Vec::with_capacity(n);
    let mut deque: VecDeque<usize> = VecDeque::new();
    let mut next = 0;
    for i in 0..n {
        let end = (i + window).min(n - 1);
        while next <= end {
            while deque.back().is_some_and(|&b| values[b] <= values[next]) {
                deque.pop_back();
            }
            deque.push_back(next);
            next += 1;
        }
        while deque.front().is_some_and(|&f| f < i) {
            deque.pop_front();
        }
        out.push(deque.front().map_or(0.0, |&f| values[f]));
    }
    out
}

impl Effect for Limiter {
    fn stage(&self) -> Stage {
        Stage::Limiter
    }

    fn process(&mut self, input: &PcmBuffer) -> Result<PcmBuffer> {
        let channels = input.channels();
        let peaks: Vec<f32> = (0..input.len())
            .map(|i| channels.iter().fold(0.0f32, |m, c| m.max(c[i].abs())))
            .collect();
        let gains = self.gains(&peaks);
        input.map_channels(|_, samples| {
            Ok(samples.iter().zip(&gains).map(|(x, g)| x * g).collect())
        })
    }

    fn reset(&mut self) {
        self.gain = 1.0;
    }

    fn latency_samples(&self) -> usize {
        self.lookahead
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forward_max_looks_ahead() {
        let v = [0.0, 1.0, 0.0, 0.0, 3.0, 0.0];
        assert_eq!(forward_max(&v, 0), v.to_vec());
        assert_eq!(forward_max(&v, 2), vec![1.0, 1.0, 3.0, 3.0, 3.0, 0.0]);
        assert!(forward_max(&[], 4).is_empty());
    }

    #[test]
    fn gain_drops_before_the_transient() {
        let sr = 1000.0;
        let mut lim = Limiter::new(-6.0206, 100.0, 5.0, sr); // ceiling 0.5, 5-sample lookahead
        let mut x = vec![0.1; 20];
        x[10] = 1.0;
        let out = lim.process(&PcmBuffer::mono(x, sr).unwrap()).unwrap();
        let y = out.channel(0).unwrap();
        assert!((y[10] - 0.5).abs() < 1e-4, "{}", y[10]);
        // samples inside the lookahead window are already attenuated
        assert!(y[5] < 0.1 && y[9] < 0.1);
        assert_eq!(y[4], 0.1);
    }

    #[test]
    fn release_recovers_gradually() {
        let sr = 1000.0;
        let mut lim = Limiter::new(-6.0206, 10.0, 0.0, sr);
        let mut x = vec![0.1; 100];
        x[0] = 1.0;
        let out = lim.process(&PcmBuffer::mono(x, sr).unwrap()).unwrap();
        let y = out.channel(0).unwrap();
        assert!(y[1] < y[5] && y[5] < y[40]);
        assert!((y[99] - 0.1).abs() < 1e-3);
    }

    #[test]
    fn stereo_is_linked() {
        let mut lim = Limiter::new(-1.0, 50.0, 2.0, 48000.0);
        let out = lim
            .process(&PcmBuffer::stereo(vec![1.5; 500], vec![0.3; 500], 48000.0).unwrap())
            .unwrap();
        let (l, r) = out.stereo_pair().unwrap();
        for (a, b) in l.iter().zip(r) {
            assert!((a / 1.5 - b / 0.3).abs() < 1e-5);
        }
        assert_eq!(lim.latency_samples(), 96);
    }
}
