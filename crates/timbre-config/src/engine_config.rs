//! Engine configuration file format and operations.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use timbre_core::StemKind;

use crate::error::{ConfigError, check_range};
use crate::factory_presets::factory_preset;
use crate::separation::SeparationSettings;
use crate::settings::EnhancementSettings;

fn default_fft_size() -> usize {
    4096
}

fn default_rolloff() -> f32 {
    0.85
}

fn default_peak_threshold() -> f32 {
    0.1
}

fn default_true() -> bool {
    true
}

/// Parameters of the analysis report.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnalysisSettings {
    /// Frame size of every spectrum-based analysis. Power of two.
    #[serde(default = "default_fft_size")]
    pub fft_size: usize,
    /// Energy fraction defining spectral rolloff, `(0, 1)`.
    #[serde(default = "default_rolloff")]
    pub rolloff: f32,
    /// Peak-picking threshold relative to the loudest bin, `(0, 1]`.
    #[serde(default = "default_peak_threshold")]
    pub peak_threshold: f32,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            fft_size: default_fft_size(),
            rolloff: default_rolloff(),
            peak_threshold: default_peak_threshold(),
        }
    }
}

impl AnalysisSettings {
    /// Check frame size and thresholds.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.fft_size < 64 || !self.fft_size.is_power_of_two() {
            return Err(ConfigError::invalid_value(
                "analysis.fft_size",
                format!("{} is not a power of two of at least 64", self.fft_size),
            ));
        }
        check_range("analysis.rolloff", self.rolloff, 0.01, 0.99)?;
        check_range("analysis.peak_threshold", self.peak_threshold, 0.001, 1.0)
    }
}

/// Everything the engine needs besides the audio.
///
/// # TOML Format
///
/// ```toml
/// threads = 4
///
/// [analysis]
/// fft_size = 4096
///
/// [separation]
/// mode = "fine"
/// sensitivity = 0.7
///
/// [enhancement.vocals.compressor]
/// ratio = 2.5
/// ```
///
/// A stem kind listed under `enhancement` replaces its factory preset
/// entirely; other kinds keep the factory preset unless
/// `use_factory_presets = false`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Worker threads; `None` uses one per core.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threads: Option<usize>,
    /// Fall back to factory presets for stems without an override.
    #[serde(default = "default_true")]
    pub use_factory_presets: bool,
    /// Analysis report parameters.
    #[serde(default)]
    pub analysis: AnalysisSettings,
    /// Separator parameters.
    #[serde(default)]
    pub separation: SeparationSettings,
    /// Per-stem enhancement overrides, keyed by stem kind name.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub enhancement: BTreeMap<String, EnhancementSettings>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            threads: None,
            use_factory_presets: true,
            analysis: AnalysisSettings::default(),
            separation: SeparationSettings::default(),
            enhancement: BTreeMap::new(),
        }
    }
}

impl EngineConfig {
    /// Set the enhancement override for one stem kind.
    pub fn with_enhancement(mut self, kind: StemKind, settings: EnhancementSettings) -> Self {
        self.enhancement.insert(kind.name().to_string(), settings);
        self
    }

    /// Replace the separation settings.
    pub fn with_separation(mut self, separation: SeparationSettings) -> Self {
        self.separation = separation;
        self
    }

    /// Enhancement settings in effect for `kind`: the override, else the
    /// factory preset, else everything disabled.
    pub fn enhancement_for(&self, kind: StemKind) -> Result<EnhancementSettings, ConfigError> {
        if let Some(settings) = self.enhancement.get(kind.name()) {
            return Ok(settings.clone());
        }
        if self.use_factory_presets {
            factory_preset(kind)
        } else {
            Ok(EnhancementSettings::disabled())
        }
    }

    /// Check every section, including each override's stem name.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.threads == Some(0) {
            return Err(ConfigError::invalid_value("threads", "must be at least 1"));
        }
        self.analysis.validate()?;
        self.separation.validate()?;
        for (name, settings) in &self.enhancement {
            name.parse::<StemKind>()
                .map_err(|_| ConfigError::UnknownStem(name.clone()))?;
            settings.validate()?;
        }
        Ok(())
    }

    /// Load and validate a config from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
        Self::from_toml(&content)
    }

    /// Parse and validate a config from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    /// Save the config to a TOML file, creating parent directories.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::create_dir(parent, e))?;
        }

        let content = self.to_toml()?;
        std::fs::write(path, content).map_err(|e| ConfigError::write_file(path, e))?;
        Ok(())
    }

    /// Convert the config to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}
