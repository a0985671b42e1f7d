//! Configuration management (config.toml)
//!
//! Settings are stored in TOML format in the platform-specific config
//! directory. The `[display]` section is handed straight to the renderer.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use nether_vector::DisplayConfig;
use serde::{Deserialize, Serialize};

/// Player configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Config {
    /// Renderer and buffer sizing
    #[serde(default)]
    pub display: DisplayConfig,
    /// Audio device settings
    #[serde(default)]
    pub output: OutputConfig,
}

/// What the device plays when the renderer falls behind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UnderrunMode {
    /// Output silence, parking the beam at the center of the screen
    #[default]
    Zero,
    /// Repeat the last sample, parking the beam where it was
    Hold,
}

/// Audio output configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Requested sample rate in Hz (default: device default)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sample_rate: Option<u32>,
    /// Samples buffered between renderer and device (default: 8192)
    #[serde(default = "default_ring_capacity")]
    pub ring_capacity: usize,
    /// Underrun behavior (default: zero)
    #[serde(default)]
    pub underrun: UnderrunMode,
}

fn default_ring_capacity() -> usize {
    8192
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            sample_rate: None,
            ring_capacity: default_ring_capacity(),
            underrun: UnderrunMode::default(),
        }
    }
}

impl Config {
    /// Check every section before anything is started
    pub fn validate(&self) -> Result<()> {
        self.display.validate()?;
        if self.output.ring_capacity < self.display.batch_size {
            bail!(
                "output.ring_capacity ({}) must hold at least one batch ({})",
                self.output.ring_capacity,
                self.display.batch_size
            );
        }
        Ok(())
    }
}

/// Returns the platform-specific configuration directory.
///
/// On Linux: `~/.config/nether-scope`
///
/// Returns `None` if the home directory cannot be determined.
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("io.nethercore", "", "nether-scope")
        .map(|dirs| dirs.config_dir().to_path_buf())
}

/// Path of `config.toml` in the configuration directory
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join("config.toml"))
}

/// Loads the configuration from disk.
///
/// Returns default values if the file doesn't exist or cannot be parsed.
pub fn load() -> Config {
    config_path()
        .and_then(|path| std::fs::read_to_string(path).ok())
        .and_then(|content| toml::from_str(&content).ok())
        .unwrap_or_default()
}

/// Loads an explicitly named configuration file.
///
/// Unlike [`load`], a missing or malformed file is an error.
pub fn load_from(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    toml::from_str(&content).with_context(|| format!("Failed to parse config {}", path.display()))
}

/// Saves the configuration to the configuration directory.
///
/// Creates the directory if it doesn't exist.
pub fn save(config: &Config) -> Result<PathBuf> {
    let path = config_path().context("No home directory to store configuration in")?;
    save_to(config, &path)?;
    Ok(path)
}

/// Saves the configuration to `path`.
pub fn save_to(config: &Config, path: &Path) -> Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write config {}", path.display()))?;
    Ok(())
}
