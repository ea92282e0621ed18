//! Integration tests for timbre-config.
//!
//! These tests verify end-to-end functionality across modules.

use tempfile::TempDir;
use timbre_config::{
    ConfigError, EngineConfig, EnhancementOption, EnhancementSettings, FileOp, SeparationMode,
    SeparationSettings, factory_preset,
};
use timbre_core::StemKind;

/// Save a config to disk and load it back unchanged.
#[test]
fn test_config_save_load_roundtrip() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("nested").join("config.toml");

    let custom = EnhancementSettings::from_options([
        EnhancementOption::NoiseReductionStrength(0.8),
        EnhancementOption::StereoWidth(1.5),
    ])
    .unwrap();
    let config = EngineConfig::default()
        .with_separation(SeparationSettings::for_mode(SeparationMode::Fine).with_sensitivity(0.7))
        .with_enhancement(StemKind::Other, custom.clone());

    config.save(&path).expect("save should create parent directories");
    assert!(path.exists());

    let loaded = EngineConfig::load(&path).unwrap();
    assert_eq!(loaded, config);
    assert_eq!(loaded.enhancement_for(StemKind::Other).unwrap(), custom);
    assert_eq!(
        loaded.enhancement_for(StemKind::Vocals).unwrap(),
        factory_preset(StemKind::Vocals).unwrap()
    );
}

/// A missing file reports its path.
#[test]
fn test_load_missing_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("absent.toml");
    let err = EngineConfig::load(&path).unwrap_err();
    assert!(matches!(err, ConfigError::Io { op: FileOp::Read, .. }));
    assert!(err.to_string().contains("absent.toml"));
}

/// A hand-edited file with a bad value is rejected on load.
#[test]
fn test_load_rejects_invalid_values() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.toml");
    std::fs::write(&path, "[enhancement.drums.limiter]\nceiling_db = 3.0\n").unwrap();
    let err = EngineConfig::load(&path).unwrap_err();
    assert!(
        matches!(err, ConfigError::OutOfRange { ref param, .. } if param == "limiter.ceiling_db"),
        "{err}"
    );
}

/// Malformed TOML surfaces as a parse error.
#[test]
fn test_load_rejects_malformed_toml() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.toml");
    std::fs::write(&path, "[separation\nmode = ").unwrap();
    assert!(matches!(
        EngineConfig::load(&path),
        Err(ConfigError::TomlParse(_))
    ));
}

/// Every factory preset survives a trip through a config file.
#[test]
fn test_factory_presets_as_overrides() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("all.toml");

    let mut config = EngineConfig::default();
    for kind in StemKind::ALL {
        config = config.with_enhancement(kind, factory_preset(kind).unwrap());
    }
    config.save(&path).unwrap();

    let loaded = EngineConfig::load(&path).unwrap();
    for kind in StemKind::ALL {
        assert_eq!(
            loaded.enhancement_for(kind).unwrap(),
            factory_preset(kind).unwrap(),
            "{kind}"
        );
    }
}
