//! Mid/side stereo width with optional mono bass.
//!
//! ```text
//! mid  = (L + R) * 0.5
//! side = (L - R) * 0.5
//! side → [HP4 @ mono_bass_hz] → × width
//! out_l = mid + side
//! out_r = mid - side
//! ```
//!
//! At width 1 without mono bass the stage is the identity. Width 0 folds the
//! pair to mono. High-passing the side signal removes stereo content below
//! the crossover, so low end stays centered however wide the rest gets.
//! Buffers with fewer than two channels pass through; channels after the
//! first pair are copied unchanged.

use timbre_config::StereoSettings;
use timbre_core::{Biquad, BiquadCoefficients, Effect, PcmBuffer, Result, Stage};
use tracing::debug;

const BUTTERWORTH_Q: f32 = 0.707_106_8;

/// Stereo width stage.
#[derive(Debug, Clone)]
pub struct StereoEnhancer {
    width: f32,
    /// Two cascaded high-pass sections on the side channel.
    side_hp: Option<[Biquad; 2]>,
}

impl StereoEnhancer {
    /// Width in `[0, 2]`; `mono_bass_hz` enables the side high-pass.
    pub fn new(width: f32, mono_bass_hz: Option<f32>, sample_rate: f32) -> Self {
        let side_hp = mono_bass_hz.map(|hz| {
            let c = BiquadCoefficients::highpass(hz, BUTTERWORTH_Q, sample_rate);
            [Biquad::new(c), Biquad::new(c)]
        });
        Self {
            width: width.clamp(0.0, 2.0),
            side_hp,
        }
    }

    /// Build from settings.
    pub fn from_settings(settings: &StereoSettings, sample_rate: f32) -> Self {
        Self::new(settings.width, settings.mono_bass_hz, sample_rate)
    }

    /// Current width.
    pub fn width(&self) -> f32 {
        self.width
    }

    /// True when bass below the crossover is summed to mono.
    pub fn has_mono_bass(&self) -> bool {
        self.side_hp.is_some()
    }
}

impl Effect for StereoEnhancer {
    fn stage(&self) -> Stage {
        Stage::StereoEnhancement
    }

    fn process(&mut self, input: &PcmBuffer) -> Result<PcmBuffer> {
        if input.num_channels() < 2 {
            debug!(
                channels = input.num_channels(),
                "stereo enhancement: not stereo, passing through"
            );
            return Ok(input.clone());
        }
        let (left, right) = input.stereo_pair()?;
        let mut out_l = Vec::with_capacity(left.len());
        let mut out_r = Vec::with_capacity(right.len());
        for (&l, &r) in left.iter().zip(right) {
            let mid = (l + r) * 0.5;
            let mut side = (l - r) * 0.5;
            if let Some([a, b]) = self.side_hp.as_mut() {
                side = b.process(a.process(side));
            }
            side *= self.width;
            out_l.push(mid + side);
            out_r.push(mid - side);
        }
        let mut channels = vec![out_l, out_r];
        channels.extend(input.channels()[2..].iter().cloned());
        input.with_channels(channels)
    }

    fn reset(&mut self) {
        if let Some(filters) = self.side_hp.as_mut() {
            filters.iter_mut().for_each(Biquad::reset);
        }
    }
}
