//! Shared CLI helpers used across commands.

use std::path::Path;

use anyhow::Context;
use timbre_config::{EngineConfig, default_config_path};
use timbre_engine::Engine;
use tracing::{debug, warn};

/// Load the engine config.
///
/// An explicit path must exist. Without one, the user config file is used
/// when present and the built-in defaults otherwise.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<EngineConfig> {
    if let Some(path) = path {
        return EngineConfig::load(path).with_context(|| format!("loading {}", path.display()));
    }
    let default = default_config_path();
    if default.exists() {
        debug!(path = %default.display(), "using user config");
        EngineConfig::load(&default).with_context(|| format!("loading {}", default.display()))
    } else {
        Ok(EngineConfig::default())
    }
}

/// Build an engine whose cancel token is tripped by Ctrl+C.
pub fn engine(config: EngineConfig) -> anyhow::Result<Engine> {
    let engine = Engine::new(config)?;
    let cancel = engine.cancel_token();
    ctrlc::set_handler(move || {
        warn!("interrupted, cancelling");
        cancel.cancel();
    })?;
    Ok(engine)
}
