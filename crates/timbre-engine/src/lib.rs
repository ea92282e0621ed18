//! Timbre Engine - parallel analysis, separation and enhancement
//!
//! [`Engine`] owns a rayon pool sized from [`EngineConfig::threads`]. One
//! request fans out across it:
//!
//! - [`Engine::analyze`] runs the spectral, psychoacoustic, spatial,
//!   dynamics and harmonic analyses side by side and returns one
//!   [`AnalysisReport`].
//! - [`Engine::separate_with`] analyzes the mix once, then gives every stem
//!   its own worker for masking, synthesis and that stem's enhancement
//!   chain.
//!
//! Progress goes out over an optional crossbeam channel as
//! [`timbre_core::ProgressEvent`]s, so a UI thread can follow along without
//! sharing state. Every request checks the engine's [`timbre_core::CancelToken`].
//!
//! ```rust,no_run
//! use timbre_config::{EngineConfig, SeparationMode};
//! use timbre_core::PcmBuffer;
//! use timbre_engine::{Engine, SeparateRequest};
//!
//! let engine = Engine::new(EngineConfig::default()).unwrap();
//! let (tx, rx) = crossbeam_channel::unbounded();
//! let mix = PcmBuffer::stereo(vec![0.0; 44100], vec![0.0; 44100], 44100.0).unwrap();
//! let stems = engine
//!     .separate_with(&mix, &SeparateRequest::mode(SeparationMode::Fine), Some(tx))
//!     .unwrap();
//! for event in rx.try_iter() {
//!     println!("{:?} {:.0}%", event.stage, event.fraction * 100.0);
//! }
//! assert_eq!(stems.len(), 4);
//! ```
//!
//! [`EngineConfig::threads`]: timbre_config::EngineConfig::threads

pub mod engine;
pub mod error;
pub mod report;
pub mod sink;

pub use engine::{Engine, SeparateRequest};
pub use error::{EngineError, Result};
pub use report::AnalysisReport;
pub use sink::ChannelSink;
