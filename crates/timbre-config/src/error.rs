//! Error types for configuration operations.

use std::path::PathBuf;
use thiserror::Error;

/// File operation that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileOp {
    /// Reading a config file.
    Read,
    /// Writing a config file.
    Write,
    /// Creating its parent directory.
    CreateDir,
}

impl std::fmt::Display for FileOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            FileOp::Read => "read",
            FileOp::Write => "write",
            FileOp::CreateDir => "create directory",
        })
    }
}

/// Everything loading, building or validating settings can fail with.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File I/O failed; the path is kept for the message.
    #[error("failed to {op} '{path}': {source}")]
    Io {
        /// What was being done.
        op: FileOp,
        /// File or directory involved.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Config text is not valid TOML for the expected shape
    #[error("failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// Settings could not be rendered as TOML
    #[error("failed to serialize TOML: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    /// A per-stem override names no known stem kind
    #[error("unknown stem kind: {0}")]
    UnknownStem(String),

    /// Numeric parameter outside its allowed range
    #[error("parameter '{param}' value {value} out of range [{min}, {max}]")]
    OutOfRange {
        /// Dotted path of the parameter, e.g. `compressor.ratio`.
        param: String,
        /// The rejected value.
        value: f32,
        /// Minimum allowed value.
        min: f32,
        /// Maximum allowed value.
        max: f32,
    },

    /// Parameter whose value is malformed rather than out of range
    #[error("invalid value for '{param}': {reason}")]
    InvalidValue {
        /// Dotted path of the parameter.
        param: String,
        /// Description of the problem.
        reason: String,
    },
}

impl ConfigError {
    fn io(op: FileOp, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConfigError::Io {
            op,
            path: path.into(),
            source,
        }
    }

    /// `path` could not be read.
    pub fn read_file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::io(FileOp::Read, path, source)
    }

    /// `path` could not be written.
    pub fn write_file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::io(FileOp::Write, path, source)
    }

    /// Directory `path` could not be created.
    pub fn create_dir(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::io(FileOp::CreateDir, path, source)
    }

    /// Malformed value for `param`.
    pub fn invalid_value(param: impl Into<String>, reason: impl Into<String>) -> Self {
        ConfigError::InvalidValue {
            param: param.into(),
            reason: reason.into(),
        }
    }
}

/// Check `value` against `[min, max]`; NaN is always out of range.
pub(crate) fn check_range(param: &str, value: f32, min: f32, max: f32) -> Result<(), ConfigError> {
    if value >= min && value <= max {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            param: param.to_string(),
            value,
            min,
            max,
        })
    }
}
