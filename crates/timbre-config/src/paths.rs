//! Platform-specific configuration paths.
//!
//! - Linux: `~/.config/timbre/`
//! - macOS: `~/Library/Application Support/timbre/`
//! - Windows: `%APPDATA%\timbre\`

use std::path::PathBuf;

/// Application name used for directory paths.
const APP_NAME: &str = "timbre";

/// Name of the engine configuration file.
const CONFIG_FILE: &str = "config.toml";

/// Returns the user-specific configuration directory.
///
/// Falls back to the current directory if the platform directory cannot be
/// determined.
pub fn user_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

/// Path of the default engine configuration file.
pub fn default_config_path() -> PathBuf {
    user_config_dir().join(CONFIG_FILE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_path_is_under_app_dir() {
        let path = default_config_path();
        assert!(path.ends_with("timbre/config.toml"));
        assert!(path.starts_with(user_config_dir()));
    }
}
