//! TOML-based configuration for the topology editor.
//!
//! Reads and writes `EditorConfig` at the platform-appropriate config file:
//! - Windows:  `%APPDATA%\HERD\editor.toml`
//! - Linux:    `~/.config/herd/editor.toml`
//! - macOS:    `~/Library/Application Support/HERD/editor.toml`
//!
//! Example:
//!
//! ```toml
//! [editor]
//! log_level = "info"
//! default_edge_layer = "L2"
//!
//! [persistence]
//! canvas_dir = "/var/lib/herd"
//! debounce_ms = 500
//!
//! [notifications]
//! cooldown_ms = 4000
//! ```
//!
//! # Serde default values
//!
//! Every section and every field has a default, so an empty file, a missing
//! file, and a file written by an older editor all load.

use std::path::{Path, PathBuf};
use std::time::Duration;

use herd_core::EdgeLayer;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The platform config directory could not be determined.
    #[error("could not determine platform config directory")]
    NoPlatformConfigDir,

    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// The config could not be serialized to TOML.
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level editor configuration stored on disk.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct EditorConfig {
    #[serde(default)]
    pub editor: EditorSection,
    #[serde(default)]
    pub persistence: PersistenceSection,
    #[serde(default)]
    pub notifications: NotificationSection,
}

/// General editor behaviour.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EditorSection {
    /// `tracing` log level: `"error"`, `"warn"`, `"info"`, `"debug"`, `"trace"`.
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Layer selected when a session starts without a stored canvas.
    #[serde(default)]
    pub default_edge_layer: EdgeLayer,
}

/// Canvas persistence settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PersistenceSection {
    /// Directory holding `herd-topology.json`.  Defaults to the config dir.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub canvas_dir: Option<PathBuf>,
    /// Quiet period between the last edit and the write.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

/// User notification settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NotificationSection {
    /// How long an identical notification stays suppressed after display.
    #[serde(default = "default_cooldown_ms")]
    pub cooldown_ms: u64,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_log_level() -> String {
    "info".to_string()
}
fn default_debounce_ms() -> u64 {
    500
}
fn default_cooldown_ms() -> u64 {
    4000
}

impl Default for EditorSection {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            default_edge_layer: EdgeLayer::default(),
        }
    }
}

impl Default for PersistenceSection {
    fn default() -> Self {
        Self {
            canvas_dir: None,
            debounce_ms: default_debounce_ms(),
        }
    }
}

impl Default for NotificationSection {
    fn default() -> Self {
        Self {
            cooldown_ms: default_cooldown_ms(),
        }
    }
}

impl PersistenceSection {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// Directory for the canvas file: the configured one, else the platform
    /// config directory.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NoPlatformConfigDir`] when neither is available.
    pub fn resolved_canvas_dir(&self) -> Result<PathBuf, ConfigError> {
        match &self.canvas_dir {
            Some(dir) => Ok(dir.clone()),
            None => config_dir(),
        }
    }
}

impl NotificationSection {
    pub fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_ms)
    }
}

// ── Config repository ─────────────────────────────────────────────────────────

/// Determines the platform-appropriate directory for the config file.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] when the platform config base
/// directory cannot be determined from the environment.
pub fn config_dir() -> Result<PathBuf, ConfigError> {
    platform_config_dir().ok_or(ConfigError::NoPlatformConfigDir)
}

/// Resolves the full path to the config file.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] if the base directory cannot be
/// determined.
pub fn config_file_path() -> Result<PathBuf, ConfigError> {
    Ok(config_dir()?.join("editor.toml"))
}

/// Loads `EditorConfig` from `path`, returning `EditorConfig::default()` if
/// the file does not exist yet.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors other than "not found",
/// and [`ConfigError::Parse`] if the TOML is malformed.
pub fn load_config_from(path: &Path) -> Result<EditorConfig, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(toml::from_str(&content)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(EditorConfig::default()),
        Err(e) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

/// Persists `config` to `path`, creating the parent directory if needed.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system failures or
/// [`ConfigError::Serialize`] if serialization fails.
pub fn save_config_to(path: &Path, config: &EditorConfig) -> Result<(), ConfigError> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|source| ConfigError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
    }

    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(())
}

/// Resolves the platform config directory including the `herd` subdirectory.
fn platform_config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var_os("APPDATA").map(|p| PathBuf::from(p).join("HERD"))
    }

    #[cfg(target_os = "linux")]
    {
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
        Some(base.join("herd"))
    }

    #[cfg(target_os = "macos")]
    {
        std::env::var_os("HOME")
            .map(|h| PathBuf::from(h).join("Library").join("Application Support").join("HERD"))
    }

    #[cfg(not(any(target_os = "windows", target_os = "linux", target_os = "macos")))]
    {
        None
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
