//! Timbre Separation - mask-based stem separation
//!
//! Two modes, both run through one windowed overlap-add pass per stem and
//! channel (2048-sample Hann frames, 512-sample hop by default):
//!
//! | Mode | Stems | Masks |
//! |------|-------|-------|
//! | coarse | voice, music, ambient, noise | static band gates with a sensitivity-scaled leak |
//! | fine | vocals, drums, bass, other | band shapes tuned by a [`MixProfile`], partition-normalized |
//!
//! Coarse bands overlap on purpose (music spans 20–8000 Hz), so coarse
//! stems do not sum to the mix. Fine stems never add energy: the four gains
//! of any bin sum to at most 1.
//!
//! Confidence and original-mix fraction are fixed per stem kind
//! ([`timbre_core::StemKind::confidence`]); only [`VoiceHints`] move them.
//!
//! ## Example
//!
//! ```rust
//! use timbre_config::{SeparationMode, SeparationSettings};
//! use timbre_core::{PcmBuffer, StemKind};
//! use timbre_separation::StemSeparator;
//!
//! let separator =
//!     StemSeparator::new(&SeparationSettings::for_mode(SeparationMode::Fine)).unwrap();
//! let bass: Vec<f32> = (0..16384)
//!     .map(|i| (2.0 * std::f32::consts::PI * 80.0 * i as f32 / 44100.0).sin())
//!     .collect();
//! let stems = separator.separate(&PcmBuffer::mono(bass, 44100.0).unwrap()).unwrap();
//! let kinds: Vec<StemKind> = stems.iter().map(|s| s.kind()).collect();
//! assert_eq!(kinds, StemKind::FINE);
//! ```

pub mod fallback;
pub mod hints;
pub mod masks;
pub mod profile;
pub mod separator;
pub mod stem;

pub use fallback::{FallbackSeparator, ModelSeparator, SeparationOutput, SeparationSource};
pub use hints::{VoiceHints, VoiceSegment};
pub use masks::{FineMasks, coarse_band, coarse_mask, mask_for};
pub use profile::MixProfile;
pub use separator::StemSeparator;
pub use stem::{RhythmicContent, Stem, StemInfo};
