//! TOML persistence for operator preferences.
//!
//! Stored at `--prefs` if given, otherwise in the platform config directory:
//! - Windows:  `%APPDATA%\BleLocate\prefs.toml`
//! - Linux:    `~/.config/blelocate/prefs.toml`
//! - macOS:    `~/Library/Application Support/BleLocate/prefs.toml`
//!
//! ```toml
//! last_map_id = "floor-1"
//! active_view = "locate"
//! ```
//!
//! Both fields are optional in the file; absent fields take their defaults so
//! an older or hand-edited file still loads.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::ActiveView;

/// Error type for preference file operations.
#[derive(Debug, Error)]
pub enum PreferencesError {
    /// The platform config directory could not be determined.
    #[error("could not determine platform config directory")]
    NoPlatformConfigDir,

    /// A file system I/O error occurred.
    #[error("I/O error accessing preferences at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse preferences TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// The preferences could not be serialized to TOML.
    #[error("failed to serialize preferences: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// What the console remembers between runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Preferences {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_map_id: Option<String>,
    #[serde(default)]
    pub active_view: ActiveView,
}

/// The preferences file inside the platform config directory.
///
/// # Errors
///
/// [`PreferencesError::NoPlatformConfigDir`] when the base directory cannot
/// be determined from the environment.
pub fn default_preferences_path() -> Result<PathBuf, PreferencesError> {
    platform_config_dir()
        .map(|dir| dir.join("prefs.toml"))
        .ok_or(PreferencesError::NoPlatformConfigDir)
}

/// Loads preferences from `path`, returning defaults if the file does not
/// exist yet.
///
/// # Errors
///
/// [`PreferencesError::Io`] for file-system errors other than "not found",
/// and [`PreferencesError::Parse`] if the TOML is malformed.
pub fn load_preferences(path: &Path) -> Result<Preferences, PreferencesError> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(toml::from_str(&content)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Preferences::default()),
        Err(source) => Err(PreferencesError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Writes `prefs` to `path`, creating parent directories as needed.
///
/// # Errors
///
/// [`PreferencesError::Io`] for file-system failures or
/// [`PreferencesError::Serialize`] if serialization fails.
pub fn save_preferences(path: &Path, prefs: &Preferences) -> Result<(), PreferencesError> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir).map_err(|source| PreferencesError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
    }

    let content = toml::to_string_pretty(prefs)?;
    std::fs::write(path, content).map_err(|source| PreferencesError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn platform_config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var_os("APPDATA").map(|p| PathBuf::from(p).join("BleLocate"))
    }

    #[cfg(target_os = "linux")]
    {
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
        Some(base.join("blelocate"))
    }

    #[cfg(target_os = "macos")]
    {
        std::env::var_os("HOME").map(|h| {
            PathBuf::from(h)
                .join("Library")
                .join("Application Support")
                .join("BleLocate")
        })
    }

    #[cfg(not(any(target_os = "windows", target_os = "linux", target_os = "macos")))]
    {
        None
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
