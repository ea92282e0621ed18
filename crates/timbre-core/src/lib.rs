//! Timbre Core - DSP primitives for spectral analysis and separation
//!
//! The building blocks every other timbre crate is written against.
//!
//! # Data model
//!
//! - [`PcmBuffer`] - immutable multi-channel `f32` audio
//! - [`Spectrum`] - magnitude/phase pair of one frame, `fft_size / 2` bins
//! - [`Mask`] - per-bin gains clamped to `[0, 1]`
//! - [`FrequencyBand`] - a Hz range with an energy value
//! - [`StemKind`] - what a separated stem contains
//!
//! # Transforms
//!
//! - [`generate_window`] / [`apply_window`] - Hann, Hamming, Blackman, Kaiser
//! - [`Fft`] - radix-2 Cooley–Tukey, sizes validated at construction
//! - [`OverlapAdd`] - windowed STFT edit-and-resynthesize loop
//!
//! # Filters & dynamics
//!
//! - [`Biquad`] / [`BiquadCoefficients`] - RBJ cookbook sections
//! - [`EnvelopeFollower`] - attack/release peak follower
//! - [`Effect`] - buffer-in, buffer-out enhancement stage
//!
//! # Plumbing
//!
//! - [`DspError`] / [`Result`]
//! - [`ProgressEvent`], [`ProgressSink`], [`CancelToken`]
//!
//! # Example
//!
//! ```rust
//! use timbre_core::{Fft, generate_window, apply_window, WindowKind};
//!
//! let fft = Fft::new(1024).unwrap();
//! let window = generate_window(WindowKind::Hann, 1024);
//! let tone: Vec<f32> = (0..1024)
//!     .map(|i| (2.0 * std::f32::consts::PI * 1000.0 * i as f32 / 48000.0).sin())
//!     .collect();
//! let spectrum = fft.forward(&apply_window(&tone, &window), 48000.0).unwrap();
//! assert_eq!(spectrum.len(), 512);
//! ```

pub mod band;
pub mod biquad;
pub mod buffer;
pub mod effect;
pub mod envelope;
pub mod error;
pub mod fft;
pub mod mask;
pub mod math;
pub mod progress;
pub mod spectrum;
pub mod stem_kind;
pub mod stft;
pub mod window;

pub use band::FrequencyBand;
pub use biquad::{Biquad, BiquadCoefficients};
pub use buffer::PcmBuffer;
pub use effect::Effect;
pub use envelope::{EnvelopeFollower, time_constant_coeff};
pub use error::{DspError, Result};
pub use fft::Fft;
pub use mask::Mask;
pub use math::{
    DB_FLOOR, db_to_linear, linear_to_db, mean_square, ms_to_samples, percentile, power_to_db,
    rms, safe_ratio,
};
pub use progress::{CancelToken, NoProgress, ProgressEvent, ProgressSink, SeparationPhase, Stage};
pub use spectrum::Spectrum;
pub use stem_kind::StemKind;
pub use stft::OverlapAdd;
pub use window::{WindowKind, apply_window, bessel_i0, generate_window};
