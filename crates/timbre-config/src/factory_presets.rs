//! Factory enhancement presets, one per stem kind.
//!
//! Presets are embedded TOML parsed on demand, so they read exactly like a
//! user-written override in an engine config file.

use timbre_core::StemKind;

use crate::error::ConfigError;
use crate::settings::EnhancementSettings;

/// Names of every factory preset; identical to the stem kind names.
pub static FACTORY_PRESET_NAMES: &[&str] = &[
    "voice", "music", "ambient", "noise", "vocals", "drums", "bass", "other",
];

/// Speech: de-hiss, cut rumble, lift intelligibility, level it out.
const VOICE_PRESET: &str = r#"
[noise_reduction]
strength = 0.6

[[eq.bands]]
kind = "high_pass"
frequency_hz = 80.0

[[eq.bands]]
kind = "peaking"
frequency_hz = 3000.0
gain_db = 3.0
q = 1.0

[compressor]
threshold_db = -18.0
ratio = 3.0
attack_ms = 5.0
release_ms = 80.0
makeup_db = 3.0

[limiter]
ceiling_db = -1.0

[harmonics]
presence = 0.3
"#;

/// Full mix: gentle glue, slight widening, a touch of warmth and air.
const MUSIC_PRESET: &str = r#"
[[eq.bands]]
kind = "low_shelf"
frequency_hz = 100.0
gain_db = 1.0

[[eq.bands]]
kind = "high_shelf"
frequency_hz = 10000.0
gain_db = 1.5

[compressor]
threshold_db = -14.0
ratio = 2.0
attack_ms = 20.0
release_ms = 200.0
makeup_db = 1.0

[limiter]
ceiling_db = -1.0

[stereo]
width = 1.2
mono_bass_hz = 150.0

[harmonics]
warmth = 0.2
air = 0.2
"#;

/// Room tone: keep it low and wide.
const AMBIENT_PRESET: &str = r#"
[noise_reduction]
strength = 0.3

[[eq.bands]]
kind = "low_pass"
frequency_hz = 250.0

[limiter]
ceiling_db = -3.0

[stereo]
width = 1.4
"#;

/// Hiss is kept for inspection only; band-limit and hold it down.
const NOISE_PRESET: &str = r#"
[[eq.bands]]
kind = "high_pass"
frequency_hz = 6000.0

[limiter]
ceiling_db = -6.0
"#;

/// Sung vocals: as speech, with air instead of de-hiss.
const VOCALS_PRESET: &str = r#"
[noise_reduction]
strength = 0.3

[[eq.bands]]
kind = "high_pass"
frequency_hz = 100.0

[[eq.bands]]
kind = "peaking"
frequency_hz = 2500.0
gain_db = 2.0
q = 0.9

[compressor]
threshold_db = -20.0
ratio = 3.0
attack_ms = 8.0
release_ms = 120.0
makeup_db = 2.0

[limiter]
ceiling_db = -1.0

[harmonics]
presence = 0.2
air = 0.4
"#;

/// Drums: fast compression, kick weight, hard ceiling.
const DRUMS_PRESET: &str = r#"
[[eq.bands]]
kind = "peaking"
frequency_hz = 60.0
gain_db = 2.0
q = 1.2

[compressor]
threshold_db = -12.0
ratio = 4.0
attack_ms = 1.0
release_ms = 50.0
makeup_db = 2.0

[limiter]
ceiling_db = -0.5
lookahead_ms = 2.0

[harmonics]
warmth = 0.1
"#;

/// Bass: mono, tight, saturated.
const BASS_PRESET: &str = r#"
[[eq.bands]]
kind = "low_pass"
frequency_hz = 400.0

[compressor]
threshold_db = -16.0
ratio = 4.0
attack_ms = 10.0
release_ms = 150.0
makeup_db = 2.0

[limiter]
ceiling_db = -1.0

[stereo]
width = 0.0

[harmonics]
warmth = 0.4
"#;

/// Residual: safety limiting only.
const OTHER_PRESET: &str = r#"
[limiter]
ceiling_db = -1.0
"#;

fn preset_toml(kind: StemKind) -> &'static str {
    match kind {
        StemKind::Voice => VOICE_PRESET,
        StemKind::Music => MUSIC_PRESET,
        StemKind::Ambient => AMBIENT_PRESET,
        StemKind::Noise => NOISE_PRESET,
        StemKind::Vocals => VOCALS_PRESET,
        StemKind::Drums => DRUMS_PRESET,
        StemKind::Bass => BASS_PRESET,
        StemKind::Other => OTHER_PRESET,
    }
}

/// The factory enhancement preset for `kind`.
///
/// ```rust
/// use timbre_config::factory_preset;
/// use timbre_core::StemKind;
///
/// let voice = factory_preset(StemKind::Voice).unwrap();
/// assert!(voice.noise_reduction.is_some());
/// ```
pub fn factory_preset(kind: StemKind) -> Result<EnhancementSettings, ConfigError> {
    EnhancementSettings::from_toml(preset_toml(kind))
}

/// Get a factory preset by name, case-insensitively.
pub fn get_factory_preset(name: &str) -> Option<EnhancementSettings> {
    let kind: StemKind = name.parse().ok()?;
    factory_preset(kind).ok()
}

/// Check if a name is a factory preset.
pub fn is_factory_preset(name: &str) -> bool {
    let lower = name.to_lowercase();
    FACTORY_PRESET_NAMES.iter().any(|n| *n == lower)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_stem_kind_has_a_valid_preset() {
        for kind in StemKind::ALL {
            let preset = factory_preset(kind)
                .unwrap_or_else(|e| panic!("{kind} preset failed to parse: {e}"));
            preset
                .validate()
                .unwrap_or_else(|e| panic!("{kind} preset failed validation: {e}"));
            assert!(!preset.is_disabled(), "{kind} preset enables nothing");
        }
    }

    #[test]
    fn names_match_stem_kinds() {
        assert_eq!(FACTORY_PRESET_NAMES.len(), StemKind::ALL.len());
        for kind in StemKind::ALL {
            assert!(is_factory_preset(kind.name()));
        }
        assert!(is_factory_preset("Drums"));
        assert!(!is_factory_preset("kazoo"));
    }

    #[test]
    fn lookup_by_name() {
        let bass = get_factory_preset("BASS").unwrap();
        assert_eq!(bass.stereo.unwrap().width, 0.0);
        assert!(get_factory_preset("kazoo").is_none());
    }

    #[test]
    fn voice_preset_structure() {
        let voice = factory_preset(StemKind::Voice).unwrap();
        let eq = voice.eq.unwrap();
        assert_eq!(eq.bands.len(), 2);
        assert_eq!(voice.compressor.unwrap().ratio, 3.0);
        assert!(voice.stereo.is_none());
    }
}
