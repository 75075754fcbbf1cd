//! Configuration file locations

use std::path::PathBuf;

/// Application name used for platform directories
const APP_NAME: &str = "functest";

/// Name of the configuration file, both in the working directory and in
/// the platform config directory
pub const CONFIG_FILE: &str = "functest.toml";

/// Get the configuration directory path
///
/// Uses the directories crate for platform-appropriate locations:
/// - Linux: `~/.config/functest/`
/// - macOS: `~/Library/Application Support/functest/`
/// - Windows: `%APPDATA%\functest\`
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", APP_NAME).map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the user-level configuration file
pub fn user_config_path() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join(CONFIG_FILE))
}

/// Get the path to the configuration file in the working directory
pub fn local_config_path() -> PathBuf {
    PathBuf::from(CONFIG_FILE)
}
