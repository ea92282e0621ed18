//! The per-stem enhancement chain.
//!
//! Stages run in a fixed order, each present only when its settings
//! section is:
//!
//! ```text
//! noise reduction → EQ → compressor → limiter → stereo → harmonics
//! ```
//!
//! Every stage gets a fresh buffer from the one before it; the chain input
//! is never modified, so a caller can fall back to it when a stage fails.

use std::time::Instant;

use timbre_config::EnhancementSettings;
use timbre_core::{
    CancelToken, DspError, Effect, NoProgress, OverlapAdd, PcmBuffer, ProgressEvent, ProgressSink,
    Result, Stage,
};
use tracing::debug;

use crate::compressor::Compressor;
use crate::eq::ParametricEq;
use crate::exciter::HarmonicExciter;
use crate::limiter::Limiter;
use crate::noise_reduction::NoiseReducer;
use crate::stereo::StereoEnhancer;

/// A sequence of enhancement stages run as a unit.
///
/// # Example
///
/// ```rust
/// use timbre_config::{EnhancementSettings, LimiterSettings};
/// use timbre_core::PcmBuffer;
/// use timbre_effects::EnhancementChain;
///
/// let mut settings = EnhancementSettings::disabled();
/// settings.limiter = Some(LimiterSettings::default());
///
/// let mut chain = EnhancementChain::from_settings(&settings, 48000.0).unwrap();
/// assert_eq!(chain.len(), 1);
///
/// let out = chain.process(&PcmBuffer::mono(vec![0.5; 4096], 48000.0).unwrap()).unwrap();
/// assert_eq!(out.len(), 4096);
/// ```
pub struct EnhancementChain {
    stages: Vec<Box<dyn Effect>>,
    min_len: usize,
    cancel: CancelToken,
}

impl EnhancementChain {
    /// Chain with no stages.
    pub fn new() -> Self {
        Self {
            stages: Vec::new(),
            min_len: OverlapAdd::DEFAULT_FRAME,
            cancel: CancelToken::new(),
        }
    }

    /// Build the stages enabled in `settings` for audio at `sample_rate`.
    pub fn from_settings(settings: &EnhancementSettings, sample_rate: f32) -> Result<Self> {
        Self::build(settings, sample_rate, CancelToken::new())
    }

    /// Like [`from_settings`](Self::from_settings), checking `cancel`
    /// between stages and inside the frame loop of noise reduction.
    pub fn build(
        settings: &EnhancementSettings,
        sample_rate: f32,
        cancel: CancelToken,
    ) -> Result<Self> {
        let mut chain = Self::new().with_cancel(cancel.clone());
        if let Some(nr) = &settings.noise_reduction {
            chain.push(Box::new(NoiseReducer::from_settings(nr)?.with_cancel(cancel)));
        }
        if let Some(eq) = &settings.eq {
            chain.push(Box::new(ParametricEq::from_settings(eq, sample_rate)));
        }
        if let Some(comp) = &settings.compressor {
            chain.push(Box::new(Compressor::from_settings(comp, sample_rate)));
        }
        if let Some(lim) = &settings.limiter {
            chain.push(Box::new(Limiter::from_settings(lim, sample_rate)));
        }
        if let Some(stereo) = &settings.stereo {
            chain.push(Box::new(StereoEnhancer::from_settings(stereo, sample_rate)));
        }
        if let Some(harmonics) = &settings.harmonics {
            chain.push(Box::new(HarmonicExciter::from_settings(harmonics, sample_rate)));
        }
        Ok(chain)
    }

    /// Check `cancel` before each stage.
    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Buffers shorter than `min_len` samples pass through untouched.
    pub fn with_min_len(mut self, min_len: usize) -> Self {
        self.min_len = min_len;
        self
    }

    /// Append a stage.
    pub fn push(&mut self, stage: Box<dyn Effect>) {
        self.stages.push(stage);
    }

    /// Number of stages.
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// True when no stage is enabled.
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Stage names in processing order.
    pub fn stages(&self) -> impl Iterator<Item = Stage> + '_ {
        self.stages.iter().map(|s| s.stage())
    }

    /// Run every stage.
    pub fn process(&mut self, input: &PcmBuffer) -> Result<PcmBuffer> {
        self.process_with_progress(input, &mut NoProgress)
    }

    /// Run every stage, reporting each one's completion to `progress`.
    ///
    /// A stage that changes the buffer length or produces NaN or infinity
    /// fails the whole chain with [`DspError::Processing`] naming it.
    pub fn process_with_progress(
        &mut self,
        input: &PcmBuffer,
        progress: &mut dyn ProgressSink,
    ) -> Result<PcmBuffer> {
        if input.len() < self.min_len {
            debug!(
                len = input.len(),
                min_len = self.min_len,
                "enhancement: buffer shorter than one frame, passing through"
            );
            return Ok(input.clone());
        }
        let mut current = input.clone();
        for stage in &mut self.stages {
            self.cancel.check()?;
            let name = stage.stage();
            let started = Instant::now();
            let next = stage.process(&current)?;
            if next.len() != current.len() || next.num_channels() != current.num_channels() {
                return Err(DspError::processing(
                    name,
                    format!(
                        "shape changed from {}x{} to {}x{}",
                        current.num_channels(),
                        current.len(),
                        next.num_channels(),
                        next.len()
                    ),
                ));
            }
            if !next.is_finite() {
                return Err(DspError::processing(name, "non-finite output"));
            }
            debug!(stage = %name, elapsed_ms = started.elapsed().as_secs_f64() * 1e3, "stage done");
            progress.report(ProgressEvent::new(name, 1.0));
            current = next;
        }
        Ok(current)
    }

    /// Reset every stage.
    pub fn reset(&mut self) {
        self.stages.iter_mut().for_each(|s| s.reset());
    }
}

impl Default for EnhancementChain {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EnhancementChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnhancementChain")
            .field("stages", &self.stages().collect::<Vec<_>>())
            .field("min_len", &self.min_len)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use timbre_config::{CompressorSettings, HarmonicSettings, LimiterSettings, StereoSettings};

    #[test]
    fn stages_follow_the_fixed_order() {
        let settings = EnhancementSettings {
            harmonics: Some(HarmonicSettings::default()),
            limiter: Some(LimiterSettings::default()),
            stereo: Some(StereoSettings::default()),
            compressor: Some(CompressorSettings::default()),
            ..EnhancementSettings::disabled()
        };
        let chain = EnhancementChain::from_settings(&settings, 48000.0).unwrap();
        assert_eq!(
            chain.stages().collect::<Vec<_>>(),
            vec![
                Stage::Compressor,
                Stage::Limiter,
                Stage::StereoEnhancement,
                Stage::HarmonicEnhancement
            ]
        );
    }

    #[test]
    fn empty_chain_is_identity() {
        let mut chain = EnhancementChain::from_settings(&EnhancementSettings::disabled(), 44100.0)
            .unwrap();
        assert!(chain.is_empty());
        let input =
            PcmBuffer::mono((0..4096).map(|i| (i as f32).sin()).collect(), 44100.0).unwrap();
        assert_eq!(chain.process(&input).unwrap(), input);
    }

    #[test]
    fn progress_reports_every_stage() {
        let settings = EnhancementSettings {
            compressor: Some(CompressorSettings::default()),
            limiter: Some(LimiterSettings::default()),
            ..EnhancementSettings::disabled()
        };
        let mut chain = EnhancementChain::from_settings(&settings, 48000.0).unwrap();
        let mut seen = Vec::new();
        chain
            .process_with_progress(
                &PcmBuffer::mono(vec![0.1; 4096], 48000.0).unwrap(),
                &mut |e: ProgressEvent| seen.push(e.stage),
            )
            .unwrap();
        assert_eq!(seen, vec![Stage::Compressor, Stage::Limiter]);
    }

    #[test]
    fn cancelled_chain_stops() {
        let token = CancelToken::new();
        let settings = EnhancementSettings {
            limiter: Some(LimiterSettings::default()),
            ..EnhancementSettings::disabled()
        };
        let mut chain = EnhancementChain::build(&settings, 48000.0, token.clone()).unwrap();
        token.cancel();
        let err = chain
            .process(&PcmBuffer::mono(vec![0.1; 4096], 48000.0).unwrap())
            .unwrap_err();
        assert_eq!(err, DspError::Cancelled);
    }
}
