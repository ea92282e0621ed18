//! Feed-forward downward compressor.
//!
//! # Signal Flow
//!
//! ```text
//! max(|ch|) → Envelope Follower → Gain Computer → × every channel → Makeup
//! ```
//!
//! The envelope is linked across channels, so every channel receives the
//! same gain and the stereo image does not shift under compression.
//!
//! Above the threshold `T` (linear) the gain is
//! `(T + (env - T) / ratio) / env`: the excess over the threshold is divided
//! by the ratio.

use timbre_config::CompressorSettings;
use timbre_core::{Effect, EnvelopeFollower, PcmBuffer, Result, Stage, db_to_linear};

/// Linked-envelope compressor.
#[derive(Debug, Clone)]
pub struct Compressor {
    sample_rate: f32,
    threshold: f32,
    ratio: f32,
    attack_ms: f32,
    release_ms: f32,
    makeup: f32,
    envelope: EnvelopeFollower,
}

impl Compressor {
    /// Compressor with default settings (-18 dB, 4:1, 10/100 ms, no makeup).
    pub fn new(sample_rate: f32) -> Self {
        Self::from_settings(&CompressorSettings::default(), sample_rate)
    }

    /// Build from settings.
    pub fn from_settings(settings: &CompressorSettings, sample_rate: f32) -> Self {
        let mut comp = Self {
            sample_rate,
            threshold: 1.0,
            ratio: 1.0,
            attack_ms: settings.attack_ms.max(0.0),
            release_ms: settings.release_ms.max(0.0),
            makeup: 1.0,
            envelope: EnvelopeFollower::new(sample_rate, settings.attack_ms, settings.release_ms),
        };
        comp.set_threshold_db(settings.threshold_db);
        comp.set_ratio(settings.ratio);
        comp.set_makeup_db(settings.makeup_db);
        comp
    }

    /// Threshold in dBFS, clamped to `[-60, 0]`.
    pub fn set_threshold_db(&mut self, db: f32) {
        self.threshold = db_to_linear(db.clamp(-60.0, 0.0));
    }

    /// Ratio, clamped to `[1, 20]`.
    pub fn set_ratio(&mut self, ratio: f32) {
        self.ratio = ratio.clamp(1.0, 20.0);
    }

    /// Makeup gain in dB, clamped to `[0, 24]`.
    pub fn set_makeup_db(&mut self, db: f32) {
        self.makeup = db_to_linear(db.clamp(0.0, 24.0));
    }

    /// Attack and release in ms.
    pub fn set_times_ms(&mut self, attack_ms: f32, release_ms: f32) {
        self.attack_ms = attack_ms.max(0.0);
        self.release_ms = release_ms.max(0.0);
        self.envelope = EnvelopeFollower::new(self.sample_rate, self.attack_ms, self.release_ms);
    }

    /// Static gain for an envelope level.
    #[inline]
    pub fn gain_for(&self, envelope: f32) -> f32 {
        if envelope > self.threshold {
            (self.threshold + (envelope - self.threshold) / self.ratio) / envelope
        } else {
            1.0
        }
    }
}

impl Effect for Compressor {
    fn stage(&self) -> Stage {
        Stage::Compressor
    }

    fn process(&mut self, input: &PcmBuffer) -> Result<PcmBuffer> {
        let channels = input.channels();
        let gains: Vec<f32> = (0..input.len())
            .map(|i| {
                let peak = channels.iter().fold(0.0f32, |m, c| m.max(c[i].abs()));
                let env = self.envelope.process(peak);
                self.gain_for(env) * self.makeup
            })
            .collect();
        input.map_channels(|_, samples| {
            Ok(samples.iter().zip(&gains).map(|(x, g)| x * g).collect())
        })
    }

    fn reset(&mut self) {
        self.envelope.reset();
    }
}
