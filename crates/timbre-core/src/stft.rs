//! Windowed overlap-add STFT processing.
//!
//! Frames of `frame_size` samples, `hop_size` apart, go through
//! window → FFT → caller's spectral edit → IFFT → window → accumulate.
//! The output is normalized by the accumulated product of analysis and
//! synthesis windows, so an untouched spectrum reconstructs the input.
//!
//! The signal is zero-padded by one frame on each side so the first and
//! last samples get full overlap coverage, then cropped back to its
//! original length.

use crate::fft::Fft;
use crate::progress::CancelToken;
use crate::spectrum::Spectrum;
use crate::window::{WindowKind, generate_window};
use crate::{DspError, Result};

/// Overlap-add engine with fixed frame, hop and window.
#[derive(Debug, Clone)]
pub struct OverlapAdd {
    fft: Fft,
    hop_size: usize,
    analysis: Vec<f32>,
    synthesis: Vec<f32>,
}

impl OverlapAdd {
    /// Default frame size (2048 samples).
    pub const DEFAULT_FRAME: usize = 2048;
    /// Default hop (512 samples, 75% overlap).
    pub const DEFAULT_HOP: usize = 512;

    /// Engine with `window` used for both analysis and synthesis.
    pub fn new(frame_size: usize, hop_size: usize, window: WindowKind) -> Result<Self> {
        let fft = Fft::new(frame_size)?;
        if hop_size == 0 || hop_size > frame_size {
            return Err(DspError::InvalidParameter {
                name: "hop_size",
                value: hop_size as f32,
                reason: "must be between 1 and the frame size",
            });
        }
        let analysis = generate_window(window, frame_size);
        Ok(Self {
            fft,
            hop_size,
            synthesis: analysis.clone(),
            analysis,
        })
    }

    /// 2048-sample Hann frames with a 512-sample hop.
    pub fn hann_default() -> Result<Self> {
        Self::new(Self::DEFAULT_FRAME, Self::DEFAULT_HOP, WindowKind::Hann)
    }

    /// Frame size in samples.
    pub fn frame_size(&self) -> usize {
        self.fft.size()
    }

    /// Hop in samples.
    pub fn hop_size(&self) -> usize {
        self.hop_size
    }

    /// Frames processed for a signal of `len` samples.
    pub fn frame_count(&self, len: usize) -> usize {
        let frame = self.frame_size();
        let padded = len + 2 * frame;
        (padded - frame) / self.hop_size + 1
    }

    /// Run every frame of `samples` through `edit` and resynthesize.
    ///
    /// `edit` receives the frame index and the frame's spectrum and returns
    /// the spectrum to resynthesize. Cancellation is checked before each
    /// frame. Signals shorter than one frame are rejected with
    /// [`DspError::BufferTooShort`]; callers decide whether to pass them
    /// through.
    pub fn process<F>(
        &self,
        samples: &[f32],
        sample_rate: f32,
        cancel: &CancelToken,
        mut edit: F,
    ) -> Result<Vec<f32>>
    where
        F: FnMut(usize, Spectrum) -> Result<Spectrum>,
    {
        let frame = self.frame_size();
        if samples.len() < frame {
            return Err(DspError::BufferTooShort {
                len: samples.len(),
                required: frame,
            });
        }

        let frames = self.frame_count(samples.len());
        let total = (frames - 1) * self.hop_size + frame;
        let mut padded = vec![0.0; total.max(samples.len() + 2 * frame)];
        padded[frame..frame + samples.len()].copy_from_slice(samples);

        let mut output = vec![0.0f32; padded.len()];
        let mut weight = vec![0.0f32; padded.len()];
        let mut windowed = vec![0.0f32; frame];

        for index in 0..frames {
            cancel.check()?;
            let start = index * self.hop_size;
            for ((w, &x), &a) in windowed
                .iter_mut()
                .zip(&padded[start..start + frame])
                .zip(&self.analysis)
            {
                *w = x * a;
            }
            let spectrum = self.fft.forward(&windowed, sample_rate)?;
            let edited = edit(index, spectrum)?;
            let resynth = self.fft.inverse(&edited)?;
            for (i, (&y, (&s, &a))) in resynth
                .iter()
                .zip(self.synthesis.iter().zip(&self.analysis))
                .enumerate()
            {
                output[start + i] += y * s;
                weight[start + i] += a * s;
            }
        }

        #[cfg(feature = "tracing")]
        tracing::trace!(frames, frame, hop = self.hop_size, "overlap-add complete");

        Ok(output[frame..frame + samples.len()]
            .iter()
            .zip(&weight[frame..frame + samples.len()])
            .map(|(&y, &w)| if w > 1e-8 { y / w } else { 0.0 })
            .collect())
    }
}
