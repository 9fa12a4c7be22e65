//! XDG Base Directory paths for aegis.
//!
//! The CLI resolves XDG paths on every platform, so a config written on
//! Linux lives at the same relative place on macOS.

use std::path::{Path, PathBuf};

const APP: &str = "aegis";

/// Name of the config file inside the config directory
pub const CONFIG_FILE: &str = "config.toml";

/// Get the aegis config directory.
///
/// Returns `$XDG_CONFIG_HOME/aegis` if set, otherwise `~/.config/aegis`.
///
/// # Examples
///
/// ```
/// use aegis_paths::config_dir;
///
/// let config = config_dir();
/// assert!(config.ends_with("aegis"));
/// ```
pub fn config_dir() -> PathBuf {
    resolve(
        std::env::var_os("XDG_CONFIG_HOME").as_deref().map(Path::new),
        dirs::home_dir().as_deref(),
        ".config",
    )
}

/// Get the aegis data directory.
///
/// Returns `$XDG_DATA_HOME/aegis` if set, otherwise `~/.local/share/aegis`.
pub fn data_dir() -> PathBuf {
    resolve(
        std::env::var_os("XDG_DATA_HOME").as_deref().map(Path::new),
        dirs::home_dir().as_deref(),
        ".local/share",
    )
}

/// Path of the user-level config file
pub fn config_file() -> PathBuf {
    config_dir().join(CONFIG_FILE)
}

/// An empty XDG variable counts as unset
fn resolve(xdg: Option<&Path>, home: Option<&Path>, fallback: &str) -> PathBuf {
    match (xdg.filter(|p| !p.as_os_str().is_empty()), home) {
        (Some(base), _) => base.join(APP),
        (None, Some(home)) => home.join(fallback).join(APP),
        (None, None) => PathBuf::from(fallback).join(APP),
    }
}
