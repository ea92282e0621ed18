//! The combined analysis of one buffer.

use serde::{Deserialize, Serialize};
use timbre_analysis::{
    DynamicsAnalysis, HarmonicAnalysis, PsychoacousticAnalysis, SpatialAudioMetrics,
    SpectralAnalysisResult,
};

/// Every analysis of one buffer, ready for visualizers or serialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    /// Sample rate of the analyzed buffer, Hz.
    pub sample_rate: f32,
    /// Channel count.
    pub channels: usize,
    /// Length, seconds.
    pub duration_secs: f64,
    /// Spectral descriptors of the average spectrum.
    pub spectral: SpectralAnalysisResult,
    /// Perceptual bands, masking and loudness.
    pub psychoacoustic: PsychoacousticAnalysis,
    /// Stereo metrics; `None` for mono input.
    pub spatial: Option<SpatialAudioMetrics>,
    /// Levels and loudness.
    pub dynamics: DynamicsAnalysis,
    /// Fundamental and harmonic series.
    pub harmonic: HarmonicAnalysis,
}
