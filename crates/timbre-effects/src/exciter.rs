//! Harmonic enhancement: tube-style warmth plus presence and air shelving.
//!
//! # Signal Flow
//!
//! ```text
//! x → warmth (biased tanh, wet/dry) → presence bell @ 3.5 kHz → air shelf @ 11 kHz
//! ```
//!
//! The bias makes the transfer curve asymmetric, which adds even harmonics
//! the way a single-ended tube stage does. Subtracting `tanh(bias)` removes
//! the DC offset the bias would otherwise leave.

use libm::tanhf;
use timbre_config::HarmonicSettings;
use timbre_core::{Biquad, BiquadCoefficients, Effect, PcmBuffer, Result, Stage};

/// Presence bell center, Hz.
pub const PRESENCE_HZ: f32 = 3500.0;
/// Air shelf corner, Hz.
pub const AIR_HZ: f32 = 11000.0;
/// Boost at full presence or air, dB.
pub const MAX_BOOST_DB: f32 = 6.0;

/// Warmth, presence and air exciter.
///
/// # Example
///
/// ```rust
/// use timbre_core::{Effect, PcmBuffer};
/// use timbre_effects::HarmonicExciter;
///
/// let mut exciter = HarmonicExciter::new(0.5, 0.3, 0.2, 44100.0);
/// let out = exciter.process(&PcmBuffer::mono(vec![0.2; 512], 44100.0).unwrap()).unwrap();
/// assert!(out.is_finite());
/// ```
#[derive(Debug, Clone)]
pub struct HarmonicExciter {
    warmth: f32,
    presence: BiquadCoefficients,
    air: BiquadCoefficients,
    /// `(presence, air)` per channel.
    filters: Vec<(Biquad, Biquad)>,
}

impl HarmonicExciter {
    /// Each amount is clamped to `[0, 1]`.
    pub fn new(warmth: f32, presence: f32, air: f32, sample_rate: f32) -> Self {
        let presence_db = MAX_BOOST_DB * presence.clamp(0.0, 1.0);
        let air_db = MAX_BOOST_DB * air.clamp(0.0, 1.0);
        Self {
            warmth: warmth.clamp(0.0, 1.0),
            presence: BiquadCoefficients::peaking(PRESENCE_HZ, 0.8, presence_db, sample_rate),
            air: BiquadCoefficients::high_shelf(AIR_HZ, 0.707, air_db, sample_rate),
            filters: Vec::new(),
        }
    }

    /// Build from settings.
    pub fn from_settings(settings: &HarmonicSettings, sample_rate: f32) -> Self {
        Self::new(settings.warmth, settings.presence, settings.air, sample_rate)
    }

    /// Warmth stage on one sample.
    #[inline]
    pub fn saturate(&self, x: f32) -> f32 {
        warm(x, self.warmth)
    }
}

/// Biased tanh blended with the dry sample by `amount`.
#[inline]
fn warm(x: f32, amount: f32) -> f32 {
    if amount == 0.0 {
        return x;
    }
    let drive = 1.0 + 3.0 * amount;
    let bias = 0.2 * amount;
    let wet = (tanhf(drive * x + bias) - tanhf(bias)) / drive;
    x * (1.0 - amount) + wet * amount
}

impl Effect for HarmonicExciter {
    fn stage(&self) -> Stage {
        Stage::HarmonicEnhancement
    }

    fn process(&mut self, input: &PcmBuffer) -> Result<PcmBuffer> {
        while self.filters.len() < input.num_channels() {
            self.filters
                .push((Biquad::new(self.presence), Biquad::new(self.air)));
        }
        let warmth = self.warmth;
        let filters = &mut self.filters;
        input.map_channels(|ch, samples| {
            let (presence, air) = &mut filters[ch];
            Ok(samples
                .iter()
                .map(|&x| air.process(presence.process(warm(x, warmth))))
                .collect())
        })
    }

    fn reset(&mut self) {
        for (p, a) in &mut self.filters {
            p.reset();
            a.reset();
        }
    }
}
