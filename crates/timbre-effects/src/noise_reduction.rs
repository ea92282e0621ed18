//! Spectral-subtraction noise reduction.
//!
//! # Algorithm
//!
//! 1. **Profile**: average the Hann-windowed magnitude spectrum of every
//!    frame that fits in the leading `profile_secs` of each channel. That
//!    segment is assumed to hold noise only.
//! 2. **Subtract**: in every STFT frame, `m' = max(m - strength·noise, 0.1·m)`.
//!    The floor keeps a tenth of each bin and avoids musical-noise
//!    artifacts from bins driven to zero.
//! 3. **Resynthesize** with the original phases through overlap-add.

use timbre_config::NoiseReductionSettings;
use timbre_core::{
    CancelToken, DspError, Effect, Fft, OverlapAdd, PcmBuffer, Result, Stage, WindowKind,
    apply_window, generate_window,
};
use tracing::debug;

/// Share of each bin's magnitude that subtraction never removes.
pub const SPECTRAL_FLOOR: f32 = 0.1;

/// Spectral-subtraction denoiser.
///
/// # Example
///
/// ```rust
/// use timbre_core::{Effect, PcmBuffer};
/// use timbre_effects::NoiseReducer;
///
/// let mut nr = NoiseReducer::new(0.8, 0.5).unwrap();
/// let hiss: Vec<f32> = (0..48000).map(|i| ((i * 7919) % 13) as f32 / 130.0 - 0.05).collect();
/// let out = nr.process(&PcmBuffer::mono(hiss, 48000.0).unwrap()).unwrap();
/// assert_eq!(out.len(), 48000);
/// ```
#[derive(Debug, Clone)]
pub struct NoiseReducer {
    stft: OverlapAdd,
    fft: Fft,
    window: Vec<f32>,
    strength: f32,
    profile_secs: f32,
    cancel: CancelToken,
}

impl NoiseReducer {
    /// Denoiser on 2048-sample Hann frames with a 512-sample hop.
    ///
    /// `strength` is clamped to `[0, 1]`, `profile_secs` to at least 10 ms.
    pub fn new(strength: f32, profile_secs: f32) -> Result<Self> {
        let frame = OverlapAdd::DEFAULT_FRAME;
        Ok(Self {
            stft: OverlapAdd::hann_default()?,
            fft: Fft::new(frame)?,
            window: generate_window(WindowKind::Hann, frame),
            strength: strength.clamp(0.0, 1.0),
            profile_secs: profile_secs.max(0.01),
            cancel: CancelToken::new(),
        })
    }

    /// Build from settings.
    pub fn from_settings(settings: &NoiseReductionSettings) -> Result<Self> {
        Self::new(settings.strength, settings.profile_secs)
    }

    /// Check `cancel` between frames.
    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Frame size; shorter buffers pass through.
    pub fn frame_size(&self) -> usize {
        self.stft.frame_size()
    }

    /// Mean magnitude per bin over the frames inside the profile segment.
    ///
    /// At least the first frame is used, even when the segment is shorter.
    pub fn noise_profile(&self, samples: &[f32], sample_rate: f32) -> Result<Vec<f32>> {
        let frame = self.frame_size();
        if samples.len() < frame {
            return Err(DspError::BufferTooShort {
                len: samples.len(),
                required: frame,
            });
        }
        let segment = ((self.profile_secs * sample_rate) as usize).clamp(frame, samples.len());
        let hop = self.stft.hop_size();
        let mut profile = vec![0.0f32; frame / 2];
        let mut frames = 0usize;
        let mut start = 0;
        while start + frame <= segment {
            let spectrum = self
                .fft
                .forward(&apply_window(&samples[start..start + frame], &self.window), sample_rate)?;
            for (p, &m) in profile.iter_mut().zip(spectrum.magnitude()) {
                *p += m;
            }
            frames += 1;
            start += hop;
        }
        let scale = 1.0 / frames.max(1) as f32;
        profile.iter_mut().for_each(|p| *p *= scale);
        Ok(profile)
    }

    fn denoise_channel(&self, samples: &[f32], sample_rate: f32) -> Result<Vec<f32>> {
        let noise = self.noise_profile(samples, sample_rate)?;
        let strength = self.strength;
        self.stft.process(samples, sample_rate, &self.cancel, |_, spectrum| {
            Ok(spectrum.map_magnitudes(|k, m| {
                let n = noise.get(k).copied().unwrap_or(0.0);
                (m - strength * n).max(SPECTRAL_FLOOR * m)
            }))
        })
    }
}

impl Effect for NoiseReducer {
    fn stage(&self) -> Stage {
        Stage::NoiseReduction
    }

    fn process(&mut self, input: &PcmBuffer) -> Result<PcmBuffer> {
        if input.len() < self.frame_size() {
            debug!(
                len = input.len(),
                frame = self.frame_size(),
                "noise reduction: buffer shorter than one frame, passing through"
            );
            return Ok(input.clone());
        }
        let sr = input.sample_rate();
        input.map_channels(|_, channel| self.denoise_channel(channel, sr))
    }

    fn reset(&mut self) {}
}
