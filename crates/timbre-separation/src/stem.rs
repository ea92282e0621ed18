//! Separated stems and their descriptors.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use timbre_analysis::Framer;
use timbre_analysis::spectral::{find_peaks, harmonicity};
use timbre_core::{FrequencyBand, Mask, PcmBuffer, Spectrum, StemKind, safe_ratio};

use crate::masks::{HIHAT_BAND, KICK_BAND, SNARE_BAND};

/// Share of a drum stem's drum-band energy in each drum range.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RhythmicContent {
    /// Kick range, 40–120 Hz.
    pub kick: f32,
    /// Snare range, 150–400 Hz.
    pub snare: f32,
    /// Hi-hat range, 6–16 kHz.
    pub hihat: f32,
}

/// Descriptive metadata of a stem, without the audio.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StemInfo {
    /// Process-unique stem id.
    pub id: u64,
    /// What the stem holds.
    pub kind: StemKind,
    /// Heuristic confidence, possibly biased by voice hints.
    pub confidence: f32,
    /// Heuristic share of the original mix.
    pub original_mix_fraction: f32,
    /// Harmonicity of the stem's spectral peaks, `[0, 1]`.
    pub harmonic_content: f32,
    /// Drum band energy split; only drum stems carry it.
    pub rhythmic_content: Option<RhythmicContent>,
}

/// One isolated component of a mix.
#[derive(Debug, Clone, PartialEq)]
pub struct Stem {
    /// Audio, same shape and rate as the mix.
    pub audio: PcmBuffer,
    /// Metadata.
    pub info: StemInfo,
    /// Mask the stem was extracted with; all ones for a pass-through.
    pub spectral_profile: Mask,
}

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

impl Stem {
    /// Stem of `kind` around `audio`, describing its content.
    ///
    /// `frame_size` is the analysis frame; buffers shorter than it get zero
    /// harmonic and rhythmic content.
    pub fn new(kind: StemKind, audio: PcmBuffer, frame_size: usize) -> Self {
        let spectrum = Framer::new(frame_size)
            .and_then(|f| f.average_spectrum(&audio.mixdown(), audio.sample_rate()))
            .ok();
        let harmonic_content = spectrum
            .as_ref()
            .map_or(0.0, |s| harmonicity(&find_peaks(s, 0.1, 20)));
        let rhythm = (kind == StemKind::Drums)
            .then(|| spectrum.as_ref().map(rhythmic_content).unwrap_or_default());
        Self {
            audio,
            info: StemInfo {
                id: NEXT_ID.fetch_add(1, Ordering::Relaxed),
                kind,
                confidence: kind.confidence(),
                original_mix_fraction: kind.original_mix_fraction(),
                harmonic_content,
                rhythmic_content: rhythm,
            },
            spectral_profile: Mask::uniform(frame_size / 2, 1.0),
        }
    }

    /// Record the mask the audio was extracted with.
    pub fn with_profile(mut self, mask: Mask) -> Self {
        self.spectral_profile = mask;
        self
    }

    /// Replace the confidence, clamped to `[0, 1]`.
    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.info.confidence = confidence.clamp(0.0, 1.0);
        self
    }

    /// Stem kind.
    pub fn kind(&self) -> StemKind {
        self.info.kind
    }
}

fn band_energy(spectrum: &Spectrum, band: FrequencyBand) -> f32 {
    spectrum
        .bins()
        .filter(|&(f, _)| band.contains(f))
        .map(|(_, m)| m * m)
        .sum()
}

/// Energy split of `spectrum` across the kick, snare and hi-hat ranges.
pub fn rhythmic_content(spectrum: &Spectrum) -> RhythmicContent {
    let kick = band_energy(spectrum, KICK_BAND);
    let snare = band_energy(spectrum, SNARE_BAND);
    let hihat = band_energy(spectrum, HIHAT_BAND);
    let total = kick + snare + hihat;
    RhythmicContent {
        kick: safe_ratio(kick, total),
        snare: safe_ratio(snare, total),
        hihat: safe_ratio(hihat, total),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::f32::consts::PI;

    #[test]
    fn drum_stems_carry_rhythmic_content() {
        let sr = 44100.0;
        let kick: Vec<f32> = (0..8192).map(|i| (2.0 * PI * 60.0 * i as f32 / sr).sin()).collect();
        let stem = Stem::new(StemKind::Drums, PcmBuffer::mono(kick, sr).unwrap(), 2048);
        let rc = stem.info.rhythmic_content.unwrap();
        assert!(rc.kick > 0.9, "{rc:?}");
        assert!((rc.kick + rc.snare + rc.hihat - 1.0).abs() < 1e-4);
    }

    #[test]
    fn other_stems_do_not() {
        let audio = PcmBuffer::mono(vec![0.0; 4096], 44100.0).unwrap();
        let stem = Stem::new(StemKind::Bass, audio, 2048);
        assert!(stem.info.rhythmic_content.is_none());
        assert_eq!(stem.info.harmonic_content, 0.0);
        assert_eq!(stem.info.confidence, StemKind::Bass.confidence());
        assert_eq!(stem.spectral_profile, Mask::uniform(1024, 1.0));
    }

    #[test]
    fn ids_are_unique() {
        let audio = PcmBuffer::mono(vec![0.0; 64], 44100.0).unwrap();
        let a = Stem::new(StemKind::Other, audio.clone(), 2048);
        let b = Stem::new(StemKind::Other, audio, 2048);
        assert_ne!(a.info.id, b.info.id);
    }

    #[test]
    fn short_stem_has_zero_content() {
        let audio = PcmBuffer::mono(vec![0.5; 64], 44100.0).unwrap();
        let stem = Stem::new(StemKind::Drums, audio, 2048);
        assert_eq!(stem.info.rhythmic_content, Some(RhythmicContent::default()));
    }
}
