//! Per-bin gain masks for every stem kind.
//!
//! Coarse masks are static band gates. Fine masks start from fixed band
//! shapes and are shaped by the [`MixProfile`] of the input, then
//! partition-normalized so the four fine gains of any bin sum to at most 1.

use timbre_core::{FrequencyBand, Mask, StemKind};

use crate::profile::MixProfile;

/// Kick drum range.
pub const KICK_BAND: FrequencyBand = FrequencyBand::new(40.0, 120.0);
/// Snare body range.
pub const SNARE_BAND: FrequencyBand = FrequencyBand::new(150.0, 400.0);
/// Hi-hat and cymbal range.
pub const HIHAT_BAND: FrequencyBand = FrequencyBand::new(6000.0, 16000.0);
/// Full-gain bass range; gain falls linearly to zero at [`BASS_ROLLOFF_HZ`].
pub const BASS_BAND: FrequencyBand = FrequencyBand::new(20.0, 250.0);
/// Where the bass mask reaches zero.
pub const BASS_ROLLOFF_HZ: f32 = 400.0;
/// Vocal emphasis range.
pub const VOCAL_CORE_BAND: FrequencyBand = FrequencyBand::new(1000.0, 3000.0);

/// Out-of-band gain of a coarse mask at zero sensitivity.
pub const COARSE_LEAK: f32 = 0.1;
/// Gain added to vocal bins next to a spectral peak of the mix.
pub const HARMONIC_BOOST: f32 = 0.25;

const VOCAL_SHOULDERS: [FrequencyBand; 2] = [
    FrequencyBand::new(200.0, 1000.0),
    FrequencyBand::new(3000.0, 8000.0),
];
const VOCAL_SHOULDER_GAIN: f32 = 0.6;
const VOCAL_FLOOR: f32 = 0.1;
const DRUM_FLOOR: f32 = 0.05;

/// Band gated by a coarse stream, or `None` for fine stem kinds.
pub fn coarse_band(kind: StemKind) -> Option<FrequencyBand> {
    match kind {
        StemKind::Voice => Some(FrequencyBand::new(85.0, 1100.0)),
        StemKind::Music => Some(FrequencyBand::new(20.0, 8000.0)),
        StemKind::Ambient => Some(FrequencyBand::new(20.0, 200.0)),
        StemKind::Noise => Some(FrequencyBand::new(8000.0, 20000.0)),
        _ => None,
    }
}

/// Static band gate: 1 inside `band`, `0.1 × (1 - sensitivity)` outside.
///
/// Out-of-band content is never fully removed.
pub fn coarse_mask(band: FrequencyBand, bins: usize, bin_width: f32, sensitivity: f32) -> Mask {
    let leak = COARSE_LEAK * (1.0 - sensitivity.clamp(0.0, 1.0));
    Mask::from_fn(bins, |k| {
        if band.contains(k as f32 * bin_width) {
            1.0
        } else {
            leak
        }
    })
}

/// The four fine masks, in [`StemKind::FINE`] order.
#[derive(Debug, Clone, PartialEq)]
pub struct FineMasks {
    /// Vocals mask.
    pub vocals: Mask,
    /// Drums mask.
    pub drums: Mask,
    /// Bass mask.
    pub bass: Mask,
    /// Residual mask.
    pub other: Mask,
}

impl FineMasks {
    /// Build masks for one mix.
    ///
    /// Floors scale with `2 × (1 - sensitivity)`, which leaves them at their
    /// nominal values for the default sensitivity of 0.5.
    pub fn build(profile: &MixProfile, sensitivity: f32) -> Self {
        let floor_scale = (2.0 * (1.0 - sensitivity.clamp(0.0, 1.0))).min(1.0);
        let bins = profile.bins();
        let tonality = profile.tonality();
        let drum_gain = 1.0 - 0.5 * tonality;

        let mut vocals = Vec::with_capacity(bins);
        let mut drums = Vec::with_capacity(bins);
        let mut bass = Vec::with_capacity(bins);
        let mut other = Vec::with_capacity(bins);
        for k in 0..bins {
            let f = profile.bin_to_freq(k);

            let mut v = if VOCAL_CORE_BAND.contains(f) {
                1.0
            } else if VOCAL_SHOULDERS.iter().any(|b| b.contains(f)) {
                VOCAL_SHOULDER_GAIN
            } else {
                VOCAL_FLOOR * floor_scale
            };
            if f >= 200.0 && f < 8000.0 && profile.is_near_peak(k) {
                v = (v + HARMONIC_BOOST).min(1.0);
            }

            let d = if [KICK_BAND, SNARE_BAND, HIHAT_BAND].iter().any(|b| b.contains(f)) {
                drum_gain
            } else {
                DRUM_FLOOR * floor_scale
            };

            let b = if BASS_BAND.contains(f) {
                1.0
            } else if f >= BASS_BAND.high_hz && f < BASS_ROLLOFF_HZ {
                (BASS_ROLLOFF_HZ - f) / (BASS_ROLLOFF_HZ - BASS_BAND.high_hz)
            } else {
                0.0
            };

            let o = 1.0 - v.max(d).max(b);

            let sum = v + d + b + o;
            let norm = if sum > 1.0 { 1.0 / sum } else { 1.0 };
            vocals.push(v * norm);
            drums.push(d * norm);
            bass.push(b * norm);
            other.push(o * norm);
        }
        Self {
            vocals: Mask::new(vocals),
            drums: Mask::new(drums),
            bass: Mask::new(bass),
            other: Mask::new(other),
        }
    }

    /// Mask for `kind`, `None` for coarse kinds.
    pub fn get(&self, kind: StemKind) -> Option<&Mask> {
        match kind {
            StemKind::Vocals => Some(&self.vocals),
            StemKind::Drums => Some(&self.drums),
            StemKind::Bass => Some(&self.bass),
            StemKind::Other => Some(&self.other),
            _ => None,
        }
    }
}

/// Mask for any stem kind.
pub fn mask_for(kind: StemKind, profile: &MixProfile, sensitivity: f32) -> Mask {
    match coarse_band(kind) {
        Some(band) => coarse_mask(band, profile.bins(), profile.bin_width(), sensitivity),
        None => {
            let masks = FineMasks::build(profile, sensitivity);
            match kind {
                StemKind::Vocals => masks.vocals,
                StemKind::Drums => masks.drums,
                StemKind::Bass => masks.bass,
                _ => masks.other,
            }
        }
    }
}
