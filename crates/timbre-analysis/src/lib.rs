//! Timbre Analysis - descriptors of a PCM buffer
//!
//! Five independent analyses, each read-only over its input:
//!
//! - [`spectral`] - centroid, bandwidth, rolloff, flux, flatness, peaks, harmonicity
//! - [`psychoacoustic`] - Bark/Mel banks, critical bands, masking, loudness
//! - [`spatial`] - correlation, phase coherence, width, image center, delay
//! - [`dynamics`] - peak/RMS/crest, true peak, loudness, loudness range
//! - [`harmonic`] - HPS fundamental, harmonic series, THD, HNR
//!
//! plus [`framing`] (the single windowed-FFT path from samples to spectra)
//! and [`filterbank`] (perceptual filter design).
//!
//! ## Degenerate input
//!
//! Silence and constant signals are valid input. Every normalized metric
//! comes back as 0 and every level as the -120 dB floor; nothing returns
//! NaN or infinity, with the one documented exception of
//! [`HarmonicAnalysis::odd_even_ratio`].
//!
//! ## Example
//!
//! ```rust
//! use timbre_analysis::{Framer, SpectralAnalyzer};
//!
//! let tone: Vec<f32> = (0..4096)
//!     .map(|i| (2.0 * std::f32::consts::PI * 1000.0 * i as f32 / 44100.0).sin())
//!     .collect();
//! let spectrum = Framer::new(4096).unwrap().spectrum(&tone, 44100.0).unwrap();
//! let result = SpectralAnalyzer::new().analyze(&spectrum);
//! assert!((result.centroid - 1000.0).abs() < 44100.0 / 4096.0 * 4.0);
//! ```

pub mod dynamics;
pub mod filterbank;
pub mod framing;
pub mod harmonic;
pub mod psychoacoustic;
pub mod spatial;
pub mod spectral;

pub use dynamics::{DynamicsAnalysis, analyze_dynamics};
pub use filterbank::{CRITICAL_BAND_EDGES, FilterBank, Scale, hz_to_bark, hz_to_mel};
pub use framing::Framer;
pub use harmonic::{Harmonic, HarmonicAnalysis, HarmonicAnalyzer, estimate_fundamental};
pub use psychoacoustic::{PsychoacousticAnalysis, PsychoacousticAnalyzer, phons_to_sones};
pub use spatial::{ImageCenter, SpatialAnalyzer, SpatialAudioMetrics, cross_correlation};
pub use spectral::{SpectralAnalysisResult, SpectralAnalyzer, SpectralPeak};
