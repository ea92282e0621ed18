//! Timbre Effects - enhancement stages for separated stems
//!
//! Every stage implements [`timbre_core::Effect`] over whole buffers:
//!
//! - [`NoiseReducer`] - spectral subtraction against a leading noise profile
//! - [`ParametricEq`] - RBJ shelving, peaking and pass bands in series
//! - [`Compressor`] - linked-envelope downward compressor
//! - [`Limiter`] - lookahead brickwall limiter
//! - [`StereoEnhancer`] - mid/side width with optional mono bass
//! - [`HarmonicExciter`] - warmth, presence and air
//!
//! [`EnhancementChain`] builds the enabled stages from
//! [`timbre_config::EnhancementSettings`] and runs them in order.
//!
//! ## Example
//!
//! ```rust
//! use timbre_config::factory_preset;
//! use timbre_core::{PcmBuffer, StemKind};
//! use timbre_effects::EnhancementChain;
//!
//! let settings = factory_preset(StemKind::Vocals).unwrap();
//! let mut chain = EnhancementChain::from_settings(&settings, 44100.0).unwrap();
//!
//! let tone: Vec<f32> = (0..8192)
//!     .map(|i| 0.3 * (2.0 * std::f32::consts::PI * 440.0 * i as f32 / 44100.0).sin())
//!     .collect();
//! let out = chain.process(&PcmBuffer::stereo(tone.clone(), tone, 44100.0).unwrap()).unwrap();
//! assert!(out.is_finite());
//! ```

pub mod chain;
pub mod compressor;
pub mod eq;
pub mod exciter;
pub mod limiter;
pub mod noise_reduction;
pub mod stereo;

pub use chain::EnhancementChain;
pub use compressor::Compressor;
pub use eq::{ParametricEq, band_coefficients};
pub use exciter::HarmonicExciter;
pub use limiter::Limiter;
pub use noise_reduction::NoiseReducer;
pub use stereo::StereoEnhancer;
