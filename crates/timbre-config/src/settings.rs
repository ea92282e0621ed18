//! Enhancement settings.
//!
//! Each stage of the enhancement chain has its own section; a section that
//! is `None` disables the stage. Settings are pure data: building the
//! processors from them is the effects crate's job.
//!
//! # TOML Format
//!
//! ```toml
//! [noise_reduction]
//! strength = 0.6
//!
//! [[eq.bands]]
//! kind = "high_pass"
//! frequency_hz = 80.0
//!
//! [[eq.bands]]
//! kind = "peaking"
//! frequency_hz = 3000.0
//! gain_db = 3.0
//! q = 1.0
//!
//! [compressor]
//! threshold_db = -18.0
//! ratio = 3.0
//!
//! [limiter]
//! ceiling_db = -1.0
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, check_range};

fn default_strength() -> f32 {
    0.5
}

fn default_profile_secs() -> f32 {
    0.5
}

fn default_q() -> f32 {
    0.707
}

fn default_threshold_db() -> f32 {
    -18.0
}

fn default_ratio() -> f32 {
    4.0
}

fn default_attack_ms() -> f32 {
    10.0
}

fn default_release_ms() -> f32 {
    100.0
}

fn default_ceiling_db() -> f32 {
    -1.0
}

fn default_limiter_release_ms() -> f32 {
    50.0
}

fn default_lookahead_ms() -> f32 {
    5.0
}

fn default_width() -> f32 {
    1.0
}

/// Spectral-subtraction noise reduction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NoiseReductionSettings {
    /// Multiple of the noise profile subtracted from each bin, `[0, 1]`.
    #[serde(default = "default_strength")]
    pub strength: f32,
    /// Length of the leading segment used as the noise profile, seconds.
    #[serde(default = "default_profile_secs")]
    pub profile_secs: f32,
}

impl Default for NoiseReductionSettings {
    fn default() -> Self {
        Self {
            strength: default_strength(),
            profile_secs: default_profile_secs(),
        }
    }
}

impl NoiseReductionSettings {
    fn validate(&self) -> Result<(), ConfigError> {
        check_range("noise_reduction.strength", self.strength, 0.0, 1.0)?;
        check_range("noise_reduction.profile_secs", self.profile_secs, 0.01, 10.0)
    }
}

/// Filter shape of one EQ band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EqBandKind {
    /// Low shelf; `gain_db` applies below `frequency_hz`.
    LowShelf,
    /// High shelf; `gain_db` applies above `frequency_hz`.
    HighShelf,
    /// Bell around `frequency_hz`.
    Peaking,
    /// 12 dB/oct low-pass; `gain_db` is ignored.
    LowPass,
    /// 12 dB/oct high-pass; `gain_db` is ignored.
    HighPass,
}

/// One parametric EQ band.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EqBand {
    /// Filter shape.
    pub kind: EqBandKind,
    /// Corner or center frequency, Hz.
    pub frequency_hz: f32,
    /// Boost or cut, dB.
    #[serde(default)]
    pub gain_db: f32,
    /// Quality factor.
    #[serde(default = "default_q")]
    pub q: f32,
}

impl EqBand {
    /// A band with the default Q.
    pub fn new(kind: EqBandKind, frequency_hz: f32, gain_db: f32) -> Self {
        Self {
            kind,
            frequency_hz,
            gain_db,
            q: default_q(),
        }
    }

    /// Override Q.
    pub fn with_q(mut self, q: f32) -> Self {
        self.q = q;
        self
    }

    fn validate(&self, index: usize) -> Result<(), ConfigError> {
        check_range(&format!("eq.bands[{index}].frequency_hz"), self.frequency_hz, 10.0, 22000.0)?;
        check_range(&format!("eq.bands[{index}].gain_db"), self.gain_db, -24.0, 24.0)?;
        check_range(&format!("eq.bands[{index}].q"), self.q, 0.1, 18.0)
    }
}

/// Parametric EQ, bands applied in order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EqSettings {
    /// Bands, applied in series.
    #[serde(default)]
    pub bands: Vec<EqBand>,
}

/// Downward compressor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CompressorSettings {
    /// Level above which gain is reduced, dBFS.
    #[serde(default = "default_threshold_db")]
    pub threshold_db: f32,
    /// Input dB over threshold per output dB over threshold.
    #[serde(default = "default_ratio")]
    pub ratio: f32,
    /// Envelope attack, ms.
    #[serde(default = "default_attack_ms")]
    pub attack_ms: f32,
    /// Envelope release, ms.
    #[serde(default = "default_release_ms")]
    pub release_ms: f32,
    /// Gain applied after compression, dB.
    #[serde(default)]
    pub makeup_db: f32,
}

impl Default for CompressorSettings {
    fn default() -> Self {
        Self {
            threshold_db: default_threshold_db(),
            ratio: default_ratio(),
            attack_ms: default_attack_ms(),
            release_ms: default_release_ms(),
            makeup_db: 0.0,
        }
    }
}

impl CompressorSettings {
    fn validate(&self) -> Result<(), ConfigError> {
        check_range("compressor.threshold_db", self.threshold_db, -60.0, 0.0)?;
        check_range("compressor.ratio", self.ratio, 1.0, 20.0)?;
        check_range("compressor.attack_ms", self.attack_ms, 0.1, 200.0)?;
        check_range("compressor.release_ms", self.release_ms, 1.0, 2000.0)?;
        check_range("compressor.makeup_db", self.makeup_db, 0.0, 24.0)
    }
}

/// Lookahead brickwall limiter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LimiterSettings {
    /// Output ceiling, dBFS.
    #[serde(default = "default_ceiling_db")]
    pub ceiling_db: f32,
    /// Gain recovery time, ms.
    #[serde(default = "default_limiter_release_ms")]
    pub release_ms: f32,
    /// Lookahead, ms. Compensated so output stays aligned with input.
    #[serde(default = "default_lookahead_ms")]
    pub lookahead_ms: f32,
}

impl Default for LimiterSettings {
    fn default() -> Self {
        Self {
            ceiling_db: default_ceiling_db(),
            release_ms: default_limiter_release_ms(),
            lookahead_ms: default_lookahead_ms(),
        }
    }
}

impl LimiterSettings {
    fn validate(&self) -> Result<(), ConfigError> {
        check_range("limiter.ceiling_db", self.ceiling_db, -24.0, 0.0)?;
        check_range("limiter.release_ms", self.release_ms, 1.0, 1000.0)?;
        check_range("limiter.lookahead_ms", self.lookahead_ms, 0.0, 20.0)
    }
}

/// Mid/side width processing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StereoSettings {
    /// Side gain: 0 collapses to mono, 1 leaves the image unchanged.
    #[serde(default = "default_width")]
    pub width: f32,
    /// Content below this frequency is summed to mono.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mono_bass_hz: Option<f32>,
}

impl Default for StereoSettings {
    fn default() -> Self {
        Self {
            width: default_width(),
            mono_bass_hz: None,
        }
    }
}

impl StereoSettings {
    fn validate(&self) -> Result<(), ConfigError> {
        check_range("stereo.width", self.width, 0.0, 2.0)?;
        if let Some(hz) = self.mono_bass_hz {
            check_range("stereo.mono_bass_hz", hz, 20.0, 500.0)?;
        }
        Ok(())
    }
}

/// Warmth, presence and air shaping. Each amount is in `[0, 1]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct HarmonicSettings {
    /// Asymmetric saturation adding low-order harmonics.
    #[serde(default)]
    pub warmth: f32,
    /// Boost around 3.5 kHz.
    #[serde(default)]
    pub presence: f32,
    /// High shelf around 11 kHz.
    #[serde(default)]
    pub air: f32,
}

impl HarmonicSettings {
    fn validate(&self) -> Result<(), ConfigError> {
        check_range("harmonics.warmth", self.warmth, 0.0, 1.0)?;
        check_range("harmonics.presence", self.presence, 0.0, 1.0)?;
        check_range("harmonics.air", self.air, 0.0, 1.0)
    }
}

/// Settings of the whole enhancement chain.
///
/// The default value disables every stage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnhancementSettings {
    /// Spectral-subtraction noise reduction.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub noise_reduction: Option<NoiseReductionSettings>,
    /// Parametric EQ.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eq: Option<EqSettings>,
    /// Compressor.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compressor: Option<CompressorSettings>,
    /// Limiter.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limiter: Option<LimiterSettings>,
    /// Stereo width.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stereo: Option<StereoSettings>,
    /// Harmonic enhancement.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub harmonics: Option<HarmonicSettings>,
}

/// Every recognized enhancement option.
///
/// Setting an option enables its stage, starting from that stage's defaults.
///
/// ```rust
/// use timbre_config::{EnhancementOption, EnhancementSettings};
///
/// let settings = EnhancementSettings::from_options([
///     EnhancementOption::CompressorRatio(3.0),
///     EnhancementOption::LimiterCeilingDb(-0.5),
/// ])
/// .unwrap();
/// assert_eq!(settings.compressor.unwrap().ratio, 3.0);
/// assert!(settings.eq.is_none());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "option", content = "value", rename_all = "snake_case")]
pub enum EnhancementOption {
    /// `noise_reduction.strength`
    NoiseReductionStrength(f32),
    /// `noise_reduction.profile_secs`
    NoiseProfileSecs(f32),
    /// Appends a band to `eq.bands`.
    EqBand(EqBand),
    /// `compressor.threshold_db`
    CompressorThresholdDb(f32),
    /// `compressor.ratio`
    CompressorRatio(f32),
    /// `compressor.attack_ms`
    CompressorAttackMs(f32),
    /// `compressor.release_ms`
    CompressorReleaseMs(f32),
    /// `compressor.makeup_db`
    CompressorMakeupDb(f32),
    /// `limiter.ceiling_db`
    LimiterCeilingDb(f32),
    /// `limiter.release_ms`
    LimiterReleaseMs(f32),
    /// `limiter.lookahead_ms`
    LimiterLookaheadMs(f32),
    /// `stereo.width`
    StereoWidth(f32),
    /// `stereo.mono_bass_hz`
    MonoBassHz(f32),
    /// `harmonics.warmth`
    Warmth(f32),
    /// `harmonics.presence`
    Presence(f32),
    /// `harmonics.air`
    Air(f32),
}

impl EnhancementSettings {
    /// Every stage disabled.
    pub fn disabled() -> Self {
        Self::default()
    }

    /// True when no stage is enabled.
    pub fn is_disabled(&self) -> bool {
        *self == Self::default()
    }

    /// Build validated settings from a list of options, applied in order.
    pub fn from_options(
        options: impl IntoIterator<Item = EnhancementOption>,
    ) -> Result<Self, ConfigError> {
        let mut settings = Self::disabled();
        for option in options {
            settings.apply(option);
        }
        settings.validate()?;
        Ok(settings)
    }

    /// Apply one option without validating.
    pub fn apply(&mut self, option: EnhancementOption) {
        use EnhancementOption as O;
        match option {
            O::NoiseReductionStrength(v) => {
                self.noise_reduction.get_or_insert_default().strength = v
            }
            O::NoiseProfileSecs(v) => self.noise_reduction.get_or_insert_default().profile_secs = v,
            O::EqBand(band) => self.eq.get_or_insert_default().bands.push(band),
            O::CompressorThresholdDb(v) => self.compressor.get_or_insert_default().threshold_db = v,
            O::CompressorRatio(v) => self.compressor.get_or_insert_default().ratio = v,
            O::CompressorAttackMs(v) => self.compressor.get_or_insert_default().attack_ms = v,
            O::CompressorReleaseMs(v) => self.compressor.get_or_insert_default().release_ms = v,
            O::CompressorMakeupDb(v) => self.compressor.get_or_insert_default().makeup_db = v,
            O::LimiterCeilingDb(v) => self.limiter.get_or_insert_default().ceiling_db = v,
            O::LimiterReleaseMs(v) => self.limiter.get_or_insert_default().release_ms = v,
            O::LimiterLookaheadMs(v) => self.limiter.get_or_insert_default().lookahead_ms = v,
            O::StereoWidth(v) => self.stereo.get_or_insert_default().width = v,
            O::MonoBassHz(v) => self.stereo.get_or_insert_default().mono_bass_hz = Some(v),
            O::Warmth(v) => self.harmonics.get_or_insert_default().warmth = v,
            O::Presence(v) => self.harmonics.get_or_insert_default().presence = v,
            O::Air(v) => self.harmonics.get_or_insert_default().air = v,
        }
    }

    /// Check every enabled section's parameters against their ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(nr) = &self.noise_reduction {
            nr.validate()?;
        }
        if let Some(eq) = &self.eq {
            for (i, band) in eq.bands.iter().enumerate() {
                band.validate(i)?;
            }
        }
        if let Some(c) = &self.compressor {
            c.validate()?;
        }
        if let Some(l) = &self.limiter {
            l.validate()?;
        }
        if let Some(s) = &self.stereo {
            s.validate()?;
        }
        if let Some(h) = &self.harmonics {
            h.validate()?;
        }
        Ok(())
    }

    /// Parse settings from TOML without validating.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Serialize to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_disables_everything() {
        let s = EnhancementSettings::default();
        assert!(s.is_disabled());
        assert!(s.validate().is_ok());
        assert_eq!(s.to_toml().unwrap().trim(), "");
    }

    #[test]
    fn options_enable_stages_from_defaults() {
        let s = EnhancementSettings::from_options([
            EnhancementOption::CompressorRatio(2.0),
            EnhancementOption::MonoBassHz(150.0),
            EnhancementOption::EqBand(EqBand::new(EqBandKind::Peaking, 3000.0, 3.0)),
        ])
        .unwrap();
        let c = s.compressor.unwrap();
        assert_eq!(c.ratio, 2.0);
        assert_eq!(c.threshold_db, -18.0);
        let stereo = s.stereo.unwrap();
        assert_eq!(stereo.width, 1.0);
        assert_eq!(stereo.mono_bass_hz, Some(150.0));
        assert_eq!(s.eq.unwrap().bands.len(), 1);
        assert!(s.limiter.is_none());
    }

    #[test]
    fn out_of_range_option_is_rejected() {
        let err = EnhancementSettings::from_options([EnhancementOption::CompressorRatio(0.5)])
            .unwrap_err();
        assert!(
            matches!(err, ConfigError::OutOfRange { ref param, .. } if param == "compressor.ratio")
        );

        let err = EnhancementSettings::from_options([EnhancementOption::EqBand(
            EqBand::new(EqBandKind::Peaking, 1000.0, 40.0),
        )])
        .unwrap_err();
        assert!(
            matches!(
                err,
                ConfigError::OutOfRange { ref param, .. } if param == "eq.bands[0].gain_db"
            )
        );
    }

    #[test]
    fn nan_is_rejected() {
        let err = EnhancementSettings::from_options([EnhancementOption::Warmth(f32::NAN)]);
        assert!(err.is_err());
    }

    #[test]
    fn toml_sections_round_trip() {
        let toml_str = r#"
[noise_reduction]
strength = 0.4

[[eq.bands]]
kind = "high_pass"
frequency_hz = 80.0

[limiter]
ceiling_db = -0.5
"#;
        let s = EnhancementSettings::from_toml(toml_str).unwrap();
        assert_eq!(s.noise_reduction.unwrap().strength, 0.4);
        assert_eq!(s.noise_reduction.unwrap().profile_secs, 0.5);
        let band = s.eq.as_ref().unwrap().bands[0];
        assert_eq!(band.kind, EqBandKind::HighPass);
        assert_eq!(band.q, 0.707);
        assert_eq!(s.limiter.unwrap().lookahead_ms, 5.0);
        assert!(s.compressor.is_none());

        let back = EnhancementSettings::from_toml(&s.to_toml().unwrap()).unwrap();
        assert_eq!(back, s);
    }

    #[test]
    fn option_serializes_tagged() {
        let text = toml::to_string(&Wrapper {
            opt: EnhancementOption::Air(0.3),
        })
        .unwrap();
        assert!(text.contains("option = \"air\""), "{text}");
    }

    #[derive(Serialize)]
    struct Wrapper {
        opt: EnhancementOption,
    }
}
