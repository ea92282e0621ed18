//! Mix analysis that parameterizes the fine masks.

use timbre_analysis::Framer;
use timbre_analysis::spectral::{find_peaks, harmonicity, spectral_flatness};
use timbre_core::{PcmBuffer, Result};

/// Spectral peaks of the mix that can boost the vocal mask.
pub const MAX_PROFILE_PEAKS: usize = 32;
/// Peak threshold relative to the loudest bin.
pub const PROFILE_PEAK_THRESHOLD: f32 = 0.1;

/// What the separator knows about a mix before it builds its masks.
#[derive(Debug, Clone, PartialEq)]
pub struct MixProfile {
    bins: usize,
    bin_width: f32,
    tonality: f32,
    harmonicity: f32,
    /// Sorted ascending.
    peaks: Vec<usize>,
}

impl MixProfile {
    /// Analyze the mono mixdown of `buffer` over `frame_size` frames.
    ///
    /// Fails with `BufferTooShort` when the buffer is shorter than a frame.
    pub fn analyze(buffer: &PcmBuffer, frame_size: usize) -> Result<Self> {
        let framer = Framer::new(frame_size)?;
        let spectrum = framer.average_spectrum(&buffer.mixdown(), buffer.sample_rate())?;
        let found = find_peaks(&spectrum, PROFILE_PEAK_THRESHOLD, MAX_PROFILE_PEAKS);
        Ok(Self {
            bins: spectrum.len(),
            bin_width: spectrum.bin_width(),
            tonality: 1.0 - spectral_flatness(spectrum.magnitude()),
            harmonicity: harmonicity(&found),
            peaks: {
                let mut bins: Vec<usize> = found.iter().map(|p| p.bin).collect();
                bins.sort_unstable();
                bins
            },
        })
    }

    /// Profile from precomputed values. `tonality` is clamped to `[0, 1]`.
    pub fn from_parts(bins: usize, bin_width: f32, tonality: f32, mut peaks: Vec<usize>) -> Self {
        peaks.sort_unstable();
        Self {
            bins,
            bin_width,
            tonality: tonality.clamp(0.0, 1.0),
            harmonicity: 0.0,
            peaks,
        }
    }

    /// Bins per frame.
    pub fn bins(&self) -> usize {
        self.bins
    }

    /// Hz per bin.
    pub fn bin_width(&self) -> f32 {
        self.bin_width
    }

    /// Center frequency of `bin`.
    pub fn bin_to_freq(&self, bin: usize) -> f32 {
        bin as f32 * self.bin_width
    }

    /// `1 - spectral flatness` of the mix: near 1 for tonal, near 0 for noisy.
    pub fn tonality(&self) -> f32 {
        self.tonality
    }

    /// Harmonicity of the mix's peaks.
    pub fn harmonicity(&self) -> f32 {
        self.harmonicity
    }

    /// Whether `bin` is a mix peak or directly next to one.
    pub fn is_near_peak(&self, bin: usize) -> bool {
        let idx = self.peaks.partition_point(|&p| p + 1 < bin);
        self.peaks.get(idx).is_some_and(|&p| p <= bin + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::f32::consts::PI;

    #[test]
    fn near_peak_covers_neighbors() {
        let p = MixProfile::from_parts(100, 10.0, 0.5, vec![40, 10]);
        assert!(p.is_near_peak(9) && p.is_near_peak(10) && p.is_near_peak(11));
        assert!(!p.is_near_peak(12) && !p.is_near_peak(38));
        assert!(p.is_near_peak(41));
        assert!(!MixProfile::from_parts(100, 10.0, 0.5, Vec::new()).is_near_peak(0));
    }

    #[test]
    fn tone_is_tonal_noise_is_not() {
        let sr = 44100.0;
        let tone: Vec<f32> = (0..16384).map(|i| (2.0 * PI * 440.0 * i as f32 / sr).sin()).collect();
        let mut state = 7u32;
        let noise: Vec<f32> = (0..16384)
            .map(|_| {
                state ^= state << 13;
                state ^= state >> 17;
                state ^= state << 5;
                (state as i32 as f32) / (i32::MAX as f32)
            })
            .collect();
        let t = MixProfile::analyze(&PcmBuffer::mono(tone, sr).unwrap(), 2048).unwrap();
        let n = MixProfile::analyze(&PcmBuffer::mono(noise, sr).unwrap(), 2048).unwrap();
        assert!(t.tonality() > 0.8, "{}", t.tonality());
        assert!(n.tonality() < t.tonality());
        assert!(t.is_near_peak((440.0 / t.bin_width()).round() as usize));
    }

    #[test]
    fn short_buffer_is_rejected() {
        let buf = PcmBuffer::mono(vec![0.0; 100], 44100.0).unwrap();
        assert!(MixProfile::analyze(&buf, 2048).is_err());
    }
}
