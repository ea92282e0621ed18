//! The buffer-level processing trait shared by enhancement stages.
//!
//! Stages consume a [`PcmBuffer`] and return a new one. They never edit
//! their input, which keeps a stem's pre-enhancement buffer available for
//! fallback when a later stage fails.

use crate::buffer::PcmBuffer;
use crate::progress::Stage;
use crate::Result;

/// One stage of an enhancement chain.
///
/// ```rust
/// use timbre_core::{Effect, PcmBuffer, Result, Stage};
///
/// struct Gain(f32);
///
/// impl Effect for Gain {
///     fn stage(&self) -> Stage {
///         Stage::Equalizer
///     }
///
///     fn process(&mut self, input: &PcmBuffer) -> Result<PcmBuffer> {
///         input.map_channels(|_, ch| Ok(ch.iter().map(|s| s * self.0).collect()))
///     }
///
///     fn reset(&mut self) {}
/// }
///
/// let buf = PcmBuffer::mono(vec![0.5; 4], 48000.0).unwrap();
/// let out = Gain(2.0).process(&buf).unwrap();
/// assert_eq!(out.channel(0), Some(&[1.0; 4][..]));
/// ```
pub trait Effect: Send {
    /// Stage name used in progress events and failure reports.
    fn stage(&self) -> Stage;

    /// Process a whole buffer.
    ///
    /// Output has the input's length, channel count and rate.
    fn process(&mut self, input: &PcmBuffer) -> Result<PcmBuffer>;

    /// Clear internal state (filter history, envelopes).
    fn reset(&mut self);

    /// Delay the stage introduces before compensation, in samples.
    ///
    /// Stages that add latency compensate for it inside `process`, so the
    /// output stays time-aligned with the input.
    fn latency_samples(&self) -> usize {
        0
    }
}
