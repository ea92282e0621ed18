//! Error type shared by every timbre crate.
//!
//! Numerically degenerate input (silence, constant signals) is *not* an error:
//! ratios fall back to `0.0` and levels to [`DB_FLOOR`](crate::math::DB_FLOOR).
//! The variants below cover contract violations the caller can act on.

use thiserror::Error;

use crate::progress::Stage;

/// Errors produced by analysis, separation, and enhancement.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DspError {
    /// Transform sizes must be powers of two (and at least 2).
    #[error("transform size {0} is not a power of two")]
    NonPowerOfTwo(usize),

    /// The buffer cannot hold a single analysis frame.
    #[error("buffer of {len} samples is shorter than the {required}-sample frame")]
    BufferTooShort {
        /// Samples available.
        len: usize,
        /// Samples needed for one frame.
        required: usize,
    },

    /// Left and right channels differ in length.
    #[error("channel length mismatch: left has {left} samples, right has {right}")]
    ChannelMismatch {
        /// Length of the left channel.
        left: usize,
        /// Length of the right channel.
        right: usize,
    },

    /// The buffer has the wrong number of channels for the operation.
    #[error("expected {expected} channel(s), found {found}")]
    ChannelCount {
        /// Channels required.
        expected: usize,
        /// Channels supplied.
        found: usize,
    },

    /// A buffer with no channels or no samples.
    #[error("buffer contains no audio")]
    EmptyBuffer,

    /// A spectrum or buffer was produced at a different rate than the consumer expects.
    #[error("sample rate mismatch: expected {expected} Hz, found {found} Hz")]
    SampleRateMismatch {
        /// Rate the consumer was configured for.
        expected: f32,
        /// Rate of the supplied data.
        found: f32,
    },

    /// A parameter outside its documented domain.
    #[error("invalid parameter '{name}' = {value}: {reason}")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Rejected value.
        value: f32,
        /// Why the value was rejected.
        reason: &'static str,
    },

    /// A separation or enhancement stage failed; callers fall back to the unmodified signal.
    #[error("{stage} failed: {reason}")]
    Processing {
        /// The stage that failed.
        stage: Stage,
        /// Human-readable cause.
        reason: String,
    },

    /// The external separation model could not be reached.
    #[error("separation model unavailable: {0}")]
    ModelUnavailable(String),

    /// The caller cancelled a long-running job.
    #[error("processing cancelled")]
    Cancelled,
}

impl DspError {
    /// Build a [`DspError::Processing`] for `stage`.
    pub fn processing(stage: Stage, reason: impl Into<String>) -> Self {
        DspError::Processing {
            stage,
            reason: reason.into(),
        }
    }

    /// True for the contract violations grouped as "invalid input".
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            DspError::NonPowerOfTwo(_)
                | DspError::BufferTooShort { .. }
                | DspError::ChannelMismatch { .. }
                | DspError::ChannelCount { .. }
                | DspError::EmptyBuffer
                | DspError::SampleRateMismatch { .. }
                | DspError::InvalidParameter { .. }
        )
    }

    /// The failed stage, when this is a processing failure.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            DspError::Processing { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}

/// Convenience result type for timbre operations.
pub type Result<T> = core::result::Result<T, DspError>;
