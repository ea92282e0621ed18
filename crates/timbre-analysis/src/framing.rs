//! Turning raw samples into analysis spectra.
//!
//! Every analyzer that starts from samples goes through [`Framer`], so there
//! is exactly one windowed FFT path in the crate.

use timbre_core::{DspError, Fft, Result, Spectrum, WindowKind, apply_window, generate_window};

/// Windowed, hopped framing over a fixed FFT size.
///
/// # Example
///
/// ```rust
/// use timbre_analysis::Framer;
///
/// let framer = Framer::new(1024).unwrap();
/// let tone: Vec<f32> = (0..8192)
///     .map(|i| (2.0 * std::f32::consts::PI * 750.0 * i as f32 / 48000.0).sin())
///     .collect();
/// let spectrum = framer.average_spectrum(&tone, 48000.0).unwrap();
/// assert_eq!(spectrum.len(), 512);
/// ```
#[derive(Debug, Clone)]
pub struct Framer {
    fft: Fft,
    window: Vec<f32>,
    hop: usize,
}

impl Framer {
    /// Hann-windowed frames of `fft_size` with 50% overlap.
    pub fn new(fft_size: usize) -> Result<Self> {
        Self::with_window(fft_size, fft_size / 2, WindowKind::Hann)
    }

    /// Custom window and hop.
    pub fn with_window(fft_size: usize, hop: usize, window: WindowKind) -> Result<Self> {
        let fft = Fft::new(fft_size)?;
        if hop == 0 {
            return Err(DspError::InvalidParameter {
                name: "hop",
                value: 0.0,
                reason: "must be at least one sample",
            });
        }
        Ok(Self {
            window: generate_window(window, fft_size),
            fft,
            hop,
        })
    }

    /// Transform size.
    pub fn fft_size(&self) -> usize {
        self.fft.size()
    }

    /// Hop between frames.
    pub fn hop(&self) -> usize {
        self.hop
    }

    fn require(&self, len: usize) -> Result<()> {
        if len == 0 {
            return Err(DspError::EmptyBuffer);
        }
        if len < self.fft.size() {
            return Err(DspError::BufferTooShort {
                len,
                required: self.fft.size(),
            });
        }
        Ok(())
    }

    /// Spectrum of the first `fft_size` samples.
    pub fn spectrum(&self, samples: &[f32], sample_rate: f32) -> Result<Spectrum> {
        self.require(samples.len())?;
        let frame = apply_window(&samples[..self.fft.size()], &self.window);
        self.fft.forward(&frame, sample_rate)
    }

    /// Number of whole frames in `len` samples.
    pub fn frame_count(&self, len: usize) -> usize {
        if len < self.fft.size() {
            0
        } else {
            (len - self.fft.size()) / self.hop + 1
        }
    }

    /// Spectrum of every whole frame.
    pub fn spectra(&self, samples: &[f32], sample_rate: f32) -> Result<Vec<Spectrum>> {
        self.require(samples.len())?;
        let n = self.fft.size();
        (0..self.frame_count(samples.len()))
            .map(|i| {
                let start = i * self.hop;
                let frame = apply_window(&samples[start..start + n], &self.window);
                self.fft.forward(&frame, sample_rate)
            })
            .collect()
    }

    /// Mean magnitude spectrum over every frame of `samples`.
    ///
    /// Phases are those of the first frame; averaged phase has no meaning.
    pub fn average_spectrum(&self, samples: &[f32], sample_rate: f32) -> Result<Spectrum> {
        self.require(samples.len())?;
        let n = self.fft.size();
        let frames = self.frame_count(samples.len());
        let mut magnitude = vec![0.0f64; n / 2];
        let mut nyquist = 0.0f64;
        let mut phase = Vec::new();
        for i in 0..frames {
            let start = i * self.hop;
            let frame = apply_window(&samples[start..start + n], &self.window);
            let spectrum = self.fft.forward(&frame, sample_rate)?;
            for (acc, &m) in magnitude.iter_mut().zip(spectrum.magnitude()) {
                *acc += f64::from(m);
            }
            nyquist += f64::from(spectrum.nyquist().abs());
            if i == 0 {
                phase = spectrum.phase().to_vec();
            }
        }
        let scale = 1.0 / frames as f64;
        Spectrum::from_parts(
            magnitude.iter().map(|m| (m * scale) as f32).collect(),
            phase,
            (nyquist * scale) as f32,
            sample_rate,
            n,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_count_matches_hops() {
        let f = Framer::new(1024).unwrap();
        assert_eq!(f.frame_count(1000), 0);
        assert_eq!(f.frame_count(1024), 1);
        assert_eq!(f.frame_count(1024 + 512), 2);
        assert_eq!(f.frame_count(4096), 7);
    }

    #[test]
    fn short_input_is_rejected() {
        let f = Framer::new(1024).unwrap();
        assert_eq!(
            f.spectrum(&[0.0; 100], 48000.0).unwrap_err(),
            DspError::BufferTooShort {
                len: 100,
                required: 1024
            }
        );
        assert_eq!(f.spectra(&[], 48000.0).unwrap_err(), DspError::EmptyBuffer);
    }

    #[test]
    fn average_of_silence_is_zero() {
        let f = Framer::new(256).unwrap();
        let s = f.average_spectrum(&[0.0; 2048], 8000.0).unwrap();
        assert!(s.magnitude().iter().all(|&m| m == 0.0));
    }
}
