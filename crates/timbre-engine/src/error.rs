//! Engine error type.

use thiserror::Error;
use timbre_config::ConfigError;
use timbre_core::{DspError, StemKind};

/// Everything an engine call can fail with.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The engine configuration is invalid.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Analysis or separation failed.
    #[error(transparent)]
    Dsp(#[from] DspError),

    /// Enhancing one stem failed; the separated stem is unaffected.
    #[error("enhancing {stem} failed: {source}")]
    Enhancement {
        /// Stem whose chain failed.
        stem: StemKind,
        /// Underlying failure, naming the stage.
        source: DspError,
    },

    /// The worker pool could not be built.
    #[error("thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

impl EngineError {
    /// True when the request was cancelled.
    pub fn is_cancelled(&self) -> bool {
        matches!(
            self,
            EngineError::Dsp(DspError::Cancelled)
                | EngineError::Enhancement {
                    source: DspError::Cancelled,
                    ..
                }
        )
    }
}

/// Result alias for this crate.
pub type Result<T> = std::result::Result<T, EngineError>;
