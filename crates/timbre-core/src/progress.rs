//! Explicit progress reporting and cooperative cancellation.
//!
//! Long-running calls take a `&mut dyn ProgressSink` and a [`CancelToken`]
//! as ordinary parameters. There is no global emitter: whoever starts a job
//! decides where its events go (a closure, a channel sender, nowhere).

use core::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::{Deserialize, Serialize};

use crate::stem_kind::StemKind;

/// Named processing stages, used in progress events and failure reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Spectral descriptors.
    SpectralAnalysis,
    /// Bark/Mel/critical-band analysis.
    PsychoacousticAnalysis,
    /// Stereo image analysis.
    SpatialAnalysis,
    /// Level and loudness analysis.
    DynamicsAnalysis,
    /// Fundamental and harmonic tracking.
    HarmonicAnalysis,
    /// Mask construction and overlap-add separation.
    Separation,
    /// Spectral subtraction.
    NoiseReduction,
    /// Parametric equalizer.
    Equalizer,
    /// Dynamics compressor.
    Compressor,
    /// Brickwall limiter.
    Limiter,
    /// Mid/side width processing.
    StereoEnhancement,
    /// Warmth, presence and air shaping.
    HarmonicEnhancement,
}

impl Stage {
    /// Stable lowercase name.
    pub fn name(self) -> &'static str {
        match self {
            Stage::SpectralAnalysis => "spectral analysis",
            Stage::PsychoacousticAnalysis => "psychoacoustic analysis",
            Stage::SpatialAnalysis => "spatial analysis",
            Stage::DynamicsAnalysis => "dynamics analysis",
            Stage::HarmonicAnalysis => "harmonic analysis",
            Stage::Separation => "separation",
            Stage::NoiseReduction => "noise reduction",
            Stage::Equalizer => "equalizer",
            Stage::Compressor => "compressor",
            Stage::Limiter => "limiter",
            Stage::StereoEnhancement => "stereo enhancement",
            Stage::HarmonicEnhancement => "harmonic enhancement",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Where a single stem's separation pass currently is.
///
/// ```text
/// Idle → Analyzing → Masking → Synthesizing → Done
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeparationPhase {
    /// Nothing started yet.
    Idle,
    /// Computing the mix analysis that parameterizes masks.
    Analyzing,
    /// Building the per-bin mask.
    Masking,
    /// Running the windowed overlap-add resynthesis.
    Synthesizing,
    /// Stem finished.
    Done,
}

/// One progress update.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProgressEvent {
    /// Stage emitting the event.
    pub stage: Stage,
    /// Stem the work belongs to, when the work is per-stem.
    pub stem: Option<StemKind>,
    /// Separation phase, for separation events.
    pub phase: Option<SeparationPhase>,
    /// Completed fraction of this stage, in `[0, 1]`.
    pub fraction: f32,
}

impl ProgressEvent {
    /// Event for a stage that is not tied to a stem.
    pub fn new(stage: Stage, fraction: f32) -> Self {
        Self {
            stage,
            stem: None,
            phase: None,
            fraction: fraction.clamp(0.0, 1.0),
        }
    }

    /// Attach the stem this event belongs to.
    pub fn for_stem(mut self, stem: StemKind) -> Self {
        self.stem = Some(stem);
        self
    }

    /// Attach a separation phase.
    pub fn in_phase(mut self, phase: SeparationPhase) -> Self {
        self.phase = Some(phase);
        self
    }
}

/// Receiver of progress events.
pub trait ProgressSink {
    /// Called synchronously by the worker; keep it cheap.
    fn report(&mut self, event: ProgressEvent);
}

impl<F: FnMut(ProgressEvent)> ProgressSink for F {
    fn report(&mut self, event: ProgressEvent) {
        self(event);
    }
}

/// Sink that drops every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn report(&mut self, _event: ProgressEvent) {}
}

/// Shared cancellation flag, checked between STFT frames.
///
/// Cloning yields a handle to the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    /// A fresh, un-cancelled token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    /// Whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }

    /// `Err(Cancelled)` once cancellation has been requested.
    pub fn check(&self) -> crate::Result<()> {
        if self.is_cancelled() {
            Err(crate::DspError::Cancelled)
        } else {
            Ok(())
        }
    }
}
