//! Loading of the user configuration file.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use frameclean_ipc::StudioConfig;
use tracing::{debug, warn};

/// Name of the configuration file inside [`config_dir`].
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Per-user directory for frameclean's config and credential.
pub fn config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("frameclean"))
}

/// Default location of the configuration file.
pub fn default_config_path() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join(CONFIG_FILE_NAME))
}

/// Read the config at `path`.
///
/// A missing file yields defaults silently. An unreadable or malformed
/// file yields defaults with a warning.
pub fn load_config(path: &Path) -> StudioConfig {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!(path = %path.display(), "No config file, using defaults");
            return StudioConfig::default();
        }
        Err(e) => {
            warn!("Failed to read config file, using defaults: {e}");
            return StudioConfig::default();
        }
    };

    toml::from_str(&contents).unwrap_or_else(|e| {
        warn!("Malformed config file, using defaults: {e}");
        StudioConfig::default()
    })
}

/// Read the config from [`default_config_path`], or defaults.
pub fn load_default_config() -> StudioConfig {
    match default_config_path() {
        Some(path) => load_config(&path),
        None => StudioConfig::default(),
    }
}
