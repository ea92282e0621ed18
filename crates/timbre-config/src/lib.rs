//! Configuration for the timbre engine.
//!
//! - **Enhancement settings**: one optional section per enhancement stage,
//!   built from TOML or from a list of typed [`EnhancementOption`]s
//! - **Separation settings**: stem split, STFT frame layout, sensitivity
//! - **Engine config**: analysis + separation + per-stem overrides, loaded
//!   from and saved to TOML
//! - **Factory presets**: an enhancement preset for every stem kind
//!
//! Every setting is validated before it reaches a processor; out-of-range
//! values are reported as [`ConfigError::OutOfRange`] with the dotted path of
//! the parameter.
//!
//! # Example
//!
//! ```rust
//! use timbre_config::{EngineConfig, SeparationMode};
//! use timbre_core::StemKind;
//!
//! let config = EngineConfig::from_toml(
//!     r#"
//! [separation]
//! mode = "fine"
//!
//! [enhancement.bass.limiter]
//! ceiling_db = -3.0
//! "#,
//! )
//! .unwrap();
//! assert_eq!(config.separation.mode, SeparationMode::Fine);
//! let bass = config.enhancement_for(StemKind::Bass).unwrap();
//! assert_eq!(bass.limiter.unwrap().ceiling_db, -3.0);
//! ```

mod engine_config;
mod error;
mod separation;
mod settings;

/// Factory presets bundled with the library.
pub mod factory_presets;

/// Platform-specific configuration paths.
pub mod paths;

pub use engine_config::{AnalysisSettings, EngineConfig};
pub use error::{ConfigError, FileOp};
pub use factory_presets::{
    FACTORY_PRESET_NAMES, factory_preset, get_factory_preset, is_factory_preset,
};
pub use paths::{default_config_path, user_config_dir};
pub use separation::{MAX_SENSITIVITY, SeparationMode, SeparationSettings};
pub use settings::{
    CompressorSettings, EnhancementOption, EnhancementSettings, EqBand, EqBandKind, EqSettings,
    HarmonicSettings, LimiterSettings, NoiseReductionSettings, StereoSettings,
};
