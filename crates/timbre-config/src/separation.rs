//! Separation settings.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};
use timbre_core::{StemKind, WindowKind};

use crate::error::{ConfigError, check_range};

/// Largest accepted sensitivity; at 1.0 out-of-band content would vanish.
pub const MAX_SENSITIVITY: f32 = 0.99;

/// Which stem split to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeparationMode {
    /// Voice, music, ambient, noise.
    #[default]
    Coarse,
    /// Vocals, drums, bass, other.
    Fine,
}

impl SeparationMode {
    /// Stem kinds produced in this mode, in output order.
    pub fn stems(self) -> [StemKind; 4] {
        match self {
            SeparationMode::Coarse => StemKind::COARSE,
            SeparationMode::Fine => StemKind::FINE,
        }
    }
}

impl fmt::Display for SeparationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SeparationMode::Coarse => "coarse",
            SeparationMode::Fine => "fine",
        })
    }
}

impl FromStr for SeparationMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "coarse" => Ok(SeparationMode::Coarse),
            "fine" => Ok(SeparationMode::Fine),
            other => Err(format!("unknown separation mode: {other}")),
        }
    }
}

fn default_frame_size() -> usize {
    2048
}

fn default_hop_size() -> usize {
    512
}

fn default_sensitivity() -> f32 {
    0.5
}

/// Frame layout and mask strength of the frequency-range separator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeparationSettings {
    /// Stem split to produce.
    #[serde(default)]
    pub mode: SeparationMode,
    /// STFT frame, samples. Power of two.
    #[serde(default = "default_frame_size")]
    pub frame_size: usize,
    /// STFT hop, samples. At most `frame_size`.
    #[serde(default = "default_hop_size")]
    pub hop_size: usize,
    /// Analysis and synthesis window.
    #[serde(default)]
    pub window: WindowKind,
    /// How hard out-of-band content is suppressed, `[0, 0.99]`.
    #[serde(default = "default_sensitivity")]
    pub sensitivity: f32,
}

impl Default for SeparationSettings {
    fn default() -> Self {
        Self {
            mode: SeparationMode::default(),
            frame_size: default_frame_size(),
            hop_size: default_hop_size(),
            window: WindowKind::default(),
            sensitivity: default_sensitivity(),
        }
    }
}

impl SeparationSettings {
    /// Default settings for `mode`.
    pub fn for_mode(mode: SeparationMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    /// Override sensitivity.
    pub fn with_sensitivity(mut self, sensitivity: f32) -> Self {
        self.sensitivity = sensitivity;
        self
    }

    /// Check frame layout and sensitivity.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.frame_size < 2 || !self.frame_size.is_power_of_two() {
            return Err(ConfigError::invalid_value(
                "separation.frame_size",
                format!("{} is not a power of two", self.frame_size),
            ));
        }
        if self.hop_size == 0 || self.hop_size > self.frame_size {
            return Err(ConfigError::invalid_value(
                "separation.hop_size",
                format!("{} must be in 1..={}", self.hop_size, self.frame_size),
            ));
        }
        if let WindowKind::Kaiser { beta } = self.window {
            check_range("separation.window.beta", beta, 0.0, 50.0)?;
        }
        check_range("separation.sensitivity", self.sensitivity, 0.0, MAX_SENSITIVITY)
    }
}
