//! Multi-channel PCM audio.

use crate::{DspError, Result};

/// One or more equal-length channels of `f32` samples at a fixed rate.
///
/// A buffer is immutable once built. Processing stages produce new buffers
/// instead of editing one in place, so a stem's source stays intact while
/// its enhanced copy is built.
///
/// ```rust
/// use timbre_core::PcmBuffer;
///
/// let buffer = PcmBuffer::stereo(vec![0.0; 44100], vec![0.0; 44100], 44100.0).unwrap();
/// assert_eq!(buffer.num_channels(), 2);
/// assert!((buffer.duration_secs() - 1.0).abs() < 1e-9);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct PcmBuffer {
    channels: Vec<Vec<f32>>,
    sample_rate: f32,
}

impl PcmBuffer {
    /// Build a buffer from per-channel sample vectors.
    ///
    /// Fails with [`DspError::EmptyBuffer`] if there are no channels,
    /// [`DspError::ChannelMismatch`] if lengths differ, and
    /// [`DspError::InvalidParameter`] for a non-positive sample rate.
    pub fn new(channels: Vec<Vec<f32>>, sample_rate: f32) -> Result<Self> {
        if channels.is_empty() {
            return Err(DspError::EmptyBuffer);
        }
        if !(sample_rate.is_finite() && sample_rate > 0.0) {
            return Err(DspError::InvalidParameter {
                name: "sample_rate",
                value: sample_rate,
                reason: "must be positive and finite",
            });
        }
        let len = channels[0].len();
        if let Some(other) = channels.iter().find(|c| c.len() != len) {
            return Err(DspError::ChannelMismatch {
                left: len,
                right: other.len(),
            });
        }
        Ok(Self {
            channels,
            sample_rate,
        })
    }

    /// Single-channel buffer.
    pub fn mono(samples: Vec<f32>, sample_rate: f32) -> Result<Self> {
        Self::new(vec![samples], sample_rate)
    }

    /// Two-channel buffer.
    pub fn stereo(left: Vec<f32>, right: Vec<f32>, sample_rate: f32) -> Result<Self> {
        Self::new(vec![left, right], sample_rate)
    }

    /// De-interleave frames of `channels` samples each.
    ///
    /// A trailing partial frame is an error, not silently dropped.
    pub fn from_interleaved(samples: &[f32], channels: usize, sample_rate: f32) -> Result<Self> {
        if channels == 0 {
            return Err(DspError::EmptyBuffer);
        }
        if samples.len() % channels != 0 {
            return Err(DspError::InvalidParameter {
                name: "interleaved length",
                value: samples.len() as f32,
                reason: "must be a multiple of the channel count",
            });
        }
        let frames = samples.len() / channels;
        let mut out = vec![Vec::with_capacity(frames); channels];
        for frame in samples.chunks_exact(channels) {
            for (ch, &s) in out.iter_mut().zip(frame) {
                ch.push(s);
            }
        }
        Self::new(out, sample_rate)
    }

    /// A buffer with the same rate and channel layout, holding new samples.
    pub fn with_channels(&self, channels: Vec<Vec<f32>>) -> Result<Self> {
        if channels.len() != self.channels.len() {
            return Err(DspError::ChannelCount {
                expected: self.channels.len(),
                found: channels.len(),
            });
        }
        Self::new(channels, self.sample_rate)
    }

    /// Apply `f` to every channel and collect the results into a new buffer.
    pub fn map_channels<F>(&self, mut f: F) -> Result<Self>
    where
        F: FnMut(usize, &[f32]) -> Result<Vec<f32>>,
    {
        let channels = self
            .channels
            .iter()
            .enumerate()
            .map(|(i, ch)| f(i, ch))
            .collect::<Result<Vec<_>>>()?;
        self.with_channels(channels)
    }

    /// Samples per channel.
    pub fn len(&self) -> usize {
        self.channels[0].len()
    }

    /// True when the channels hold no samples.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Channel count.
    pub fn num_channels(&self) -> usize {
        self.channels.len()
    }

    /// Sample rate in Hz.
    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Duration in seconds.
    pub fn duration_secs(&self) -> f64 {
        self.len() as f64 / f64::from(self.sample_rate)
    }

    /// One channel, if it exists.
    pub fn channel(&self, index: usize) -> Option<&[f32]> {
        self.channels.get(index).map(Vec::as_slice)
    }

    /// All channels.
    pub fn channels(&self) -> &[Vec<f32>] {
        &self.channels
    }

    /// Left and right channels of a two-channel buffer.
    pub fn stereo_pair(&self) -> Result<(&[f32], &[f32])> {
        match self.channels.as_slice() {
            [left, right] => Ok((left, right)),
            _ => Err(DspError::ChannelCount {
                expected: 2,
                found: self.channels.len(),
            }),
        }
    }

    /// Average of all channels.
    pub fn mixdown(&self) -> Vec<f32> {
        if self.channels.len() == 1 {
            return self.channels[0].clone();
        }
        let scale = 1.0 / self.channels.len() as f32;
        (0..self.len())
            .map(|i| self.channels.iter().map(|c| c[i]).sum::<f32>() * scale)
            .collect()
    }

    /// Interleave channels frame by frame.
    pub fn to_interleaved(&self) -> Vec<f32> {
        let mut out = Vec::with_capacity(self.len() * self.num_channels());
        for i in 0..self.len() {
            out.extend(self.channels.iter().map(|c| c[i]));
        }
        out
    }

    /// Sum of squared samples over every channel.
    pub fn energy(&self) -> f64 {
        self.channels
            .iter()
            .flatten()
            .map(|&s| f64::from(s) * f64::from(s))
            .sum()
    }

    /// True when no sample is NaN or infinite.
    pub fn is_finite(&self) -> bool {
        self.channels.iter().flatten().all(|s| s.is_finite())
    }

    /// Take ownership of the channel vectors.
    pub fn into_channels(self) -> Vec<Vec<f32>> {
        self.channels
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_mismatched_channels() {
        let err = PcmBuffer::stereo(vec![0.0; 10], vec![0.0; 12], 48000.0).unwrap_err();
        assert_eq!(err, DspError::ChannelMismatch { left: 10, right: 12 });
    }

    #[test]
    fn rejects_empty_and_bad_rate() {
        assert_eq!(
            PcmBuffer::new(Vec::new(), 48000.0).unwrap_err(),
            DspError::EmptyBuffer
        );
        assert!(PcmBuffer::mono(vec![0.0], 0.0).is_err());
        assert!(PcmBuffer::mono(vec![0.0], f32::NAN).is_err());
    }

    #[test]
    fn interleave_round_trip() {
        let data = [1.0, -1.0, 2.0, -2.0, 3.0, -3.0];
        let buf = PcmBuffer::from_interleaved(&data, 2, 44100.0).unwrap();
        assert_eq!(buf.channel(0), Some(&[1.0, 2.0, 3.0][..]));
        assert_eq!(buf.channel(1), Some(&[-1.0, -2.0, -3.0][..]));
        assert_eq!(buf.to_interleaved(), data.to_vec());
        assert!(PcmBuffer::from_interleaved(&data[..5], 2, 44100.0).is_err());
    }

    #[test]
    fn mixdown_averages() {
        let buf = PcmBuffer::stereo(vec![1.0, 0.0], vec![0.0, 1.0], 8000.0).unwrap();
        assert_eq!(buf.mixdown(), vec![0.5, 0.5]);
    }

    #[test]
    fn stereo_pair_requires_two_channels() {
        let mono = PcmBuffer::mono(vec![0.0; 4], 8000.0).unwrap();
        assert_eq!(
            mono.stereo_pair().unwrap_err(),
            DspError::ChannelCount {
                expected: 2,
                found: 1
            }
        );
    }

    #[test]
    fn map_channels_keeps_layout() {
        let buf = PcmBuffer::stereo(vec![1.0; 4], vec![2.0; 4], 8000.0).unwrap();
        let doubled = buf
            .map_channels(|_, ch| Ok(ch.iter().map(|s| s * 2.0).collect()))
            .unwrap();
        assert_eq!(doubled.channel(1), Some(&[4.0; 4][..]));
        assert_eq!(doubled.sample_rate(), 8000.0);
    }
}
